//! In-memory store for tests/dev.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use tabs_core::{ContactId, Entity, ProjectId, TimeEntryId};
use tabs_timekeeping::{
    Contact, ContactDetails, NewProject, NewTimeEntry, Project, ProjectWithContact, TimeEntry,
    TimeEntryWithProject, total_delta,
};

use super::{StoreError, StoreResult, TimesheetStore};

/// One table: rows ordered by id, plus the id sequence.
#[derive(Debug)]
struct Table<E: Entity> {
    rows: BTreeMap<E::Id, E>,
    last_id: i64,
}

impl<E: Entity> Default for Table<E> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<E: Entity + Clone> Table<E> {
    /// Ids are never reused, even after deletes.
    fn next_id(&mut self) -> E::Id {
        self.last_id += 1;
        E::Id::from(self.last_id)
    }

    fn insert(&mut self, row: E) {
        self.rows.insert(row.id(), row);
    }

    fn get(&self, id: E::Id) -> Option<&E> {
        self.rows.get(&id)
    }

    fn get_mut(&mut self, id: E::Id) -> StoreResult<&mut E> {
        self.rows.get_mut(&id).ok_or_else(|| StoreError::not_found::<E>(id))
    }

    fn all(&self) -> impl Iterator<Item = &E> {
        self.rows.values()
    }
}

#[derive(Debug, Default)]
struct Tables {
    contacts: Table<Contact>,
    projects: Table<Project>,
    entries: Table<TimeEntry>,
}

impl Tables {
    fn project_with_contact(&self, project: &Project) -> StoreResult<ProjectWithContact> {
        let contact = self
            .contacts
            .get(project.contact_id)
            .ok_or_else(|| StoreError::not_found::<Contact>(project.contact_id))?;
        Ok(ProjectWithContact {
            project: project.clone(),
            contact: contact.clone(),
        })
    }

    fn entry_with_project(&self, entry: &TimeEntry) -> StoreResult<TimeEntryWithProject> {
        let project = self
            .projects
            .get(entry.project_id())
            .ok_or_else(|| StoreError::not_found::<Project>(entry.project_id()))?;
        Ok(TimeEntryWithProject {
            entry: entry.clone(),
            project_name: project.name.clone(),
        })
    }
}

/// Process-local store. All tables sit behind a single lock, so every
/// operation observes and mutates a consistent snapshot.
#[derive(Debug, Default)]
pub struct InMemoryTimesheetStore {
    inner: RwLock<Tables>,
}

impl InMemoryTimesheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|_| StoreError::storage("read", "store lock poisoned"))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|_| StoreError::storage("write", "store lock poisoned"))
    }
}

#[async_trait]
impl TimesheetStore for InMemoryTimesheetStore {
    async fn get_contact(&self, id: ContactId) -> StoreResult<Option<Contact>> {
        Ok(self.read()?.contacts.get(id).cloned())
    }

    async fn list_contacts(&self) -> StoreResult<Vec<Contact>> {
        Ok(self.read()?.contacts.all().cloned().collect())
    }

    async fn add_contact(&self, details: ContactDetails) -> StoreResult<Contact> {
        let mut tables = self.write()?;
        let contact = Contact::new(tables.contacts.next_id(), details);
        tables.contacts.insert(contact.clone());
        Ok(contact)
    }

    async fn update_contact(&self, id: ContactId, details: ContactDetails) -> StoreResult<Contact> {
        let mut tables = self.write()?;
        let contact = tables.contacts.get_mut(id)?;
        contact.overwrite(details);
        Ok(contact.clone())
    }

    async fn delete_contact(&self, id: ContactId) -> StoreResult<()> {
        let mut tables = self.write()?;
        if tables.contacts.get(id).is_none() {
            return Err(StoreError::not_found::<Contact>(id));
        }

        let dependents = tables.projects.all().filter(|p| p.contact_id == id).count();
        if dependents > 0 {
            return Err(StoreError::Conflict(format!(
                "Contact {id} still owns {dependents} project(s)"
            )));
        }

        tables.contacts.rows.remove(&id);
        Ok(())
    }

    async fn add_project(&self, project: NewProject) -> StoreResult<Project> {
        let mut tables = self.write()?;
        if tables.contacts.get(project.contact_id).is_none() {
            return Err(StoreError::not_found::<Contact>(project.contact_id));
        }
        let project = Project::new(tables.projects.next_id(), project);
        tables.projects.insert(project.clone());
        Ok(project)
    }

    async fn get_project(&self, id: ProjectId) -> StoreResult<Option<ProjectWithContact>> {
        let tables = self.read()?;
        tables
            .projects
            .get(id)
            .map(|p| tables.project_with_contact(p))
            .transpose()
    }

    async fn list_projects(&self) -> StoreResult<Vec<ProjectWithContact>> {
        let tables = self.read()?;
        tables
            .projects
            .all()
            .map(|p| tables.project_with_contact(p))
            .collect()
    }

    async fn add_time_entry(&self, entry: NewTimeEntry) -> StoreResult<TimeEntry> {
        entry.validate()?;
        let mut tables = self.write()?;
        if tables.projects.get(entry.project_id).is_none() {
            return Err(StoreError::not_found::<Project>(entry.project_id));
        }
        let entry = TimeEntry::new(tables.entries.next_id(), entry)?;
        tables.entries.insert(entry.clone());
        Ok(entry)
    }

    async fn get_time_entry(&self, id: TimeEntryId) -> StoreResult<Option<TimeEntryWithProject>> {
        let tables = self.read()?;
        tables
            .entries
            .get(id)
            .map(|e| tables.entry_with_project(e))
            .transpose()
    }

    async fn list_time_entries(&self) -> StoreResult<Vec<TimeEntryWithProject>> {
        let tables = self.read()?;
        tables
            .entries
            .all()
            .map(|e| tables.entry_with_project(e))
            .collect()
    }

    async fn total_delta(&self) -> StoreResult<i64> {
        total_delta(self.read()?.entries.all()).map_err(StoreError::from)
    }
}
