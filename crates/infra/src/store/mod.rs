//! Record storage: the persistence context handed to every request.
//!
//! Each mutating operation is its own unit of work. Existence checks and writes
//! happen inside the same transaction (or under the same write guard), so a
//! failed check never leaves a partial write behind.

use async_trait::async_trait;
use thiserror::Error;

use tabs_core::{ContactId, DomainError, Entity, ProjectId, TimeEntryId};
use tabs_timekeeping::{
    Contact, ContactDetails, NewProject, NewTimeEntry, Project, ProjectWithContact, TimeEntry,
    TimeEntryWithProject,
};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryTimesheetStore;
pub use postgres::PostgresTimesheetStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} {id} doesn't exist")]
    NotFound { entity: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage error in {operation}: {message}")]
    Storage { operation: &'static str, message: String },
}

impl StoreError {
    pub fn not_found<E: Entity>(id: E::Id) -> Self {
        Self::NotFound {
            entity: E::KIND,
            id: id.to_string(),
        }
    }

    pub fn storage(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Storage {
            operation,
            message: message.into(),
        }
    }
}

/// Persistence over contacts, projects and time entries.
///
/// Lists are ordered by id. Joined reads (`*_with_*`) carry the owning record's
/// fields alongside the row.
#[async_trait]
pub trait TimesheetStore: Send + Sync {
    async fn get_contact(&self, id: ContactId) -> StoreResult<Option<Contact>>;

    async fn list_contacts(&self) -> StoreResult<Vec<Contact>>;

    async fn add_contact(&self, details: ContactDetails) -> StoreResult<Contact>;

    /// Overwrite name, email and notes. `NotFound` when the contact is absent.
    async fn update_contact(&self, id: ContactId, details: ContactDetails) -> StoreResult<Contact>;

    /// `NotFound` when absent; `Conflict` while projects still reference it.
    async fn delete_contact(&self, id: ContactId) -> StoreResult<()>;

    /// `NotFound` when the owning contact is absent.
    async fn add_project(&self, project: NewProject) -> StoreResult<Project>;

    async fn get_project(&self, id: ProjectId) -> StoreResult<Option<ProjectWithContact>>;

    async fn list_projects(&self) -> StoreResult<Vec<ProjectWithContact>>;

    /// `NotFound` when the project is absent; `Domain` when stop precedes start.
    async fn add_time_entry(&self, entry: NewTimeEntry) -> StoreResult<TimeEntry>;

    async fn get_time_entry(&self, id: TimeEntryId) -> StoreResult<Option<TimeEntryWithProject>>;

    async fn list_time_entries(&self) -> StoreResult<Vec<TimeEntryWithProject>>;

    /// Sum of every persisted delta; 0 when none are recorded.
    async fn total_delta(&self) -> StoreResult<i64>;
}
