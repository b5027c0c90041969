use serde::{Deserialize, Serialize};

use tabs_timekeeping::{Contact, ContactDetails, ProjectWithContact, TimeEntryWithProject};

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /contacts`. Absent fields are stored as null.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateContactRequest {
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_notes: Option<String>,
}

/// Body of `PUT /contact/{id}`. Replaces all three fields; absent means null.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateContactRequest {
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_notes: Option<String>,
}

impl From<CreateContactRequest> for ContactDetails {
    fn from(body: CreateContactRequest) -> Self {
        ContactDetails {
            name: body.contact_name,
            email: body.contact_email,
            notes: body.contact_notes,
        }
    }
}

impl From<UpdateContactRequest> for ContactDetails {
    fn from(body: UpdateContactRequest) -> Self {
        ContactDetails {
            name: body.contact_name,
            email: body.contact_email,
            notes: body.contact_notes,
        }
    }
}

// -------------------------
// Field mapping
// -------------------------

/// Collection link rendered on every contact.
pub const CONTACTS_URI: &str = "/api/contacts";
/// Collection link rendered on every project.
pub const PROJECTS_URI: &str = "/api/projects";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactFields {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub uri: &'static str,
}

impl From<Contact> for ContactFields {
    fn from(c: Contact) -> Self {
        Self {
            id: c.id.get(),
            name: c.name,
            email: c.email,
            notes: c.notes,
            uri: CONTACTS_URI,
        }
    }
}

/// `contact` is the owner's name; `contact_id` is rendered as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectFields {
    pub id: i64,
    pub contact: Option<String>,
    pub contact_id: String,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub uri: &'static str,
}

impl From<ProjectWithContact> for ProjectFields {
    fn from(row: ProjectWithContact) -> Self {
        Self {
            id: row.project.id.get(),
            contact: row.contact.name,
            contact_id: row.project.contact_id.to_string(),
            name: row.project.name,
            notes: row.project.notes,
            uri: PROJECTS_URI,
        }
    }
}

/// Per-entry summary: every value is text; an open entry has an empty `stop`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeEntryFields {
    pub project_name: Option<String>,
    pub start: String,
    pub stop: String,
    pub delta: String,
}

impl From<TimeEntryWithProject> for TimeEntryFields {
    fn from(row: TimeEntryWithProject) -> Self {
        Self {
            start: row.entry.formatted_start(),
            stop: row.entry.formatted_stop(),
            delta: row.entry.formatted_delta(),
            project_name: row.project_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeEntriesEnvelope {
    pub entries: Vec<TimeEntryFields>,
    pub entries_total: String,
}

impl TimeEntriesEnvelope {
    pub fn new(entries: Vec<TimeEntryWithProject>, total: i64) -> Self {
        Self {
            entries: entries.into_iter().map(TimeEntryFields::from).collect(),
            entries_total: total.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tabs_core::{ContactId, ProjectId, TimeEntryId};
    use tabs_timekeeping::{NewTimeEntry, Project, TimeEntry};

    fn contact() -> Contact {
        Contact {
            id: ContactId::new(3),
            name: Some("Ada".into()),
            email: None,
            notes: Some("vip".into()),
        }
    }

    #[test]
    fn collection_links_live_under_api_prefix() {
        assert!(CONTACTS_URI.starts_with(crate::app::API_PREFIX));
        assert!(PROJECTS_URI.starts_with(crate::app::API_PREFIX));
    }

    #[test]
    fn contact_mapping_keeps_nulls_and_constant_uri() {
        let json = serde_json::to_value(ContactFields::from(contact())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 3,
                "name": "Ada",
                "email": null,
                "notes": "vip",
                "uri": "/api/contacts",
            })
        );
    }

    #[test]
    fn project_mapping_renders_owner() {
        let fields = ProjectFields::from(ProjectWithContact {
            project: Project {
                id: ProjectId::new(8),
                contact_id: ContactId::new(3),
                name: Some("Engine".into()),
                notes: None,
            },
            contact: contact(),
        });
        assert_eq!(fields.contact.as_deref(), Some("Ada"));
        assert_eq!(fields.contact_id, "3");
        assert_eq!(fields.uri, PROJECTS_URI);
    }

    #[test]
    fn envelope_renders_open_entries_and_total() {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        let open = TimeEntry::new(
            TimeEntryId::new(1),
            NewTimeEntry {
                project_id: ProjectId::new(8),
                start,
                stop: None,
                delta: None,
            },
        )
        .unwrap();

        let envelope = TimeEntriesEnvelope::new(
            vec![TimeEntryWithProject {
                entry: open,
                project_name: Some("Engine".into()),
            }],
            0,
        );

        assert_eq!(envelope.entries_total, "0");
        assert_eq!(
            envelope.entries[0],
            TimeEntryFields {
                project_name: Some("Engine".into()),
                start: "01/02/24 09:00".into(),
                stop: String::new(),
                delta: String::new(),
            }
        );
    }

    #[test]
    fn request_rejects_fields_it_does_not_accept() {
        let err = serde_urlencoded::from_str::<CreateContactRequest>("contact_name=A&contact_id=4");
        assert!(err.is_err());

        let ok: UpdateContactRequest = serde_urlencoded::from_str("contact_name=A").unwrap();
        let details = ContactDetails::from(ok);
        assert_eq!(details.name.as_deref(), Some("A"));
        assert_eq!(details.email, None);
    }
}
