use serde::{Deserialize, Serialize};

use tabs_core::{ContactId, Entity, ProjectId};

use crate::Contact;

/// A unit of work owned by one contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub contact_id: ContactId,
    pub name: Option<String>,
    pub notes: Option<String>,
}

/// Fields needed to add a project; the id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub contact_id: ContactId,
    pub name: Option<String>,
    pub notes: Option<String>,
}

impl Project {
    pub fn new(id: ProjectId, fields: NewProject) -> Self {
        Self {
            id,
            contact_id: fields.contact_id,
            name: fields.name,
            notes: fields.notes,
        }
    }
}

impl Entity for Project {
    type Id = ProjectId;
    const KIND: &'static str = "Project";

    fn id(&self) -> ProjectId {
        self.id
    }
}

/// A project joined with its owning contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectWithContact {
    pub project: Project,
    pub contact: Contact,
}
