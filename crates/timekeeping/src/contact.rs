use serde::{Deserialize, Serialize};

use tabs_core::{ContactId, Entity};

/// The writable fields of a contact.
///
/// Every field is optional; an absent field is stored as null. Updates replace
/// all three fields at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub name: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

impl Contact {
    pub fn new(id: ContactId, details: ContactDetails) -> Self {
        Self {
            id,
            name: details.name,
            email: details.email,
            notes: details.notes,
        }
    }

    /// Replace name, email and notes. No field survives from the previous state.
    pub fn overwrite(&mut self, details: ContactDetails) {
        self.name = details.name;
        self.email = details.email;
        self.notes = details.notes;
    }
}

impl Entity for Contact {
    type Id = ContactId;
    const KIND: &'static str = "Contact";

    fn id(&self) -> ContactId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_replaces_every_field() {
        let mut contact = Contact::new(
            ContactId::new(1),
            ContactDetails {
                name: Some("Ada".into()),
                email: Some("ada@example.com".into()),
                notes: Some("first".into()),
            },
        );

        contact.overwrite(ContactDetails {
            name: Some("Grace".into()),
            ..ContactDetails::default()
        });

        assert_eq!(contact.id, ContactId::new(1));
        assert_eq!(contact.name.as_deref(), Some("Grace"));
        assert_eq!(contact.email, None);
        assert_eq!(contact.notes, None);
    }
}
