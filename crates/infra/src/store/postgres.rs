//! Postgres-backed store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (foreign key violation) | `23503` | `Conflict` |
//! | Database (check constraint violation) | `23514` | `Conflict` |
//! | Anything else | – | `Storage` |
//!
//! Mutations run inside an explicit transaction. Returning early with `?` drops
//! the `Transaction` without committing, which rolls it back.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use tabs_core::{ContactId, ProjectId, TimeEntryId};
use tabs_timekeeping::{
    Contact, ContactDetails, NewProject, NewTimeEntry, Project, ProjectWithContact, TimeEntry,
    TimeEntryWithProject,
};

use super::{StoreError, StoreResult, TimesheetStore};

const SELECT_PROJECTS: &str = r#"
    SELECT
        p.id,
        p.contact_id,
        p.name,
        p.notes,
        c.name  AS contact_name,
        c.email AS contact_email,
        c.notes AS contact_notes
    FROM projects p
    JOIN contacts c ON c.id = p.contact_id
"#;

const SELECT_TIME_ENTRIES: &str = r#"
    SELECT
        t.id,
        t.project_id,
        t.start_at,
        t.stop_at,
        t.delta,
        p.name AS project_name
    FROM time_entries t
    JOIN projects p ON p.id = t.project_id
"#;

/// Store backed by a shared sqlx connection pool. `Send + Sync`, cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgresTimesheetStore {
    pool: Arc<PgPool>,
}

impl PostgresTimesheetStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn begin(&self, operation: &'static str) -> StoreResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error(operation, e))
    }
}

#[async_trait]
impl TimesheetStore for PostgresTimesheetStore {
    #[instrument(skip(self), fields(contact_id = %id), err)]
    async fn get_contact(&self, id: ContactId) -> StoreResult<Option<Contact>> {
        let row = sqlx::query("SELECT id, name, email, notes FROM contacts WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_contact", e))?;

        row.map(|r| ContactRow::from_row(&r).map(Contact::from))
            .transpose()
            .map_err(|e| map_sqlx_error("get_contact", e))
    }

    #[instrument(skip(self), err)]
    async fn list_contacts(&self) -> StoreResult<Vec<Contact>> {
        let rows = sqlx::query("SELECT id, name, email, notes FROM contacts ORDER BY id ASC")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_contacts", e))?;

        rows.iter()
            .map(|r| ContactRow::from_row(r).map(Contact::from))
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_contacts", e))
    }

    #[instrument(skip(self, details), err)]
    async fn add_contact(&self, details: ContactDetails) -> StoreResult<Contact> {
        let mut tx = self.begin("add_contact").await?;

        let row = sqlx::query(
            r#"
            INSERT INTO contacts (name, email, notes)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, notes
            "#,
        )
        .bind(&details.name)
        .bind(&details.email)
        .bind(&details.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("add_contact", e))?;

        let contact = ContactRow::from_row(&row)
            .map(Contact::from)
            .map_err(|e| map_sqlx_error("add_contact", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("add_contact", e))?;
        Ok(contact)
    }

    #[instrument(skip(self, details), fields(contact_id = %id), err)]
    async fn update_contact(&self, id: ContactId, details: ContactDetails) -> StoreResult<Contact> {
        let mut tx = self.begin("update_contact").await?;

        let row = sqlx::query(
            r#"
            UPDATE contacts
            SET name = $2, email = $3, notes = $4
            WHERE id = $1
            RETURNING id, name, email, notes
            "#,
        )
        .bind(id.get())
        .bind(&details.name)
        .bind(&details.email)
        .bind(&details.notes)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_contact", e))?
        .ok_or_else(|| StoreError::not_found::<Contact>(id))?;

        let contact = ContactRow::from_row(&row)
            .map(Contact::from)
            .map_err(|e| map_sqlx_error("update_contact", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("update_contact", e))?;
        Ok(contact)
    }

    #[instrument(skip(self), fields(contact_id = %id), err)]
    async fn delete_contact(&self, id: ContactId) -> StoreResult<()> {
        let mut tx = self.begin("delete_contact").await?;

        // Lock the row so a concurrent project insert cannot slip in between
        // the dependency count and the delete.
        let exists = sqlx::query("SELECT id FROM contacts WHERE id = $1 FOR UPDATE")
            .bind(id.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_contact", e))?;
        if exists.is_none() {
            return Err(StoreError::not_found::<Contact>(id));
        }

        let dependents: i64 = sqlx::query("SELECT COUNT(*) AS n FROM projects WHERE contact_id = $1")
            .bind(id.get())
            .fetch_one(&mut *tx)
            .await
            .and_then(|r| r.try_get("n"))
            .map_err(|e| map_sqlx_error("delete_contact", e))?;
        if dependents > 0 {
            return Err(StoreError::Conflict(format!(
                "Contact {id} still owns {dependents} project(s)"
            )));
        }

        sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_contact", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("delete_contact", e))?;
        Ok(())
    }

    #[instrument(skip(self, project), fields(contact_id = %project.contact_id), err)]
    async fn add_project(&self, project: NewProject) -> StoreResult<Project> {
        let mut tx = self.begin("add_project").await?;

        let owner = sqlx::query("SELECT id FROM contacts WHERE id = $1 FOR SHARE")
            .bind(project.contact_id.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("add_project", e))?;
        if owner.is_none() {
            return Err(StoreError::not_found::<Contact>(project.contact_id));
        }

        let id: i64 = sqlx::query(
            r#"
            INSERT INTO projects (contact_id, name, notes)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(project.contact_id.get())
        .bind(&project.name)
        .bind(&project.notes)
        .fetch_one(&mut *tx)
        .await
        .and_then(|r| r.try_get("id"))
        .map_err(|e| map_sqlx_error("add_project", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("add_project", e))?;
        Ok(Project::new(ProjectId::new(id), project))
    }

    #[instrument(skip(self), fields(project_id = %id), err)]
    async fn get_project(&self, id: ProjectId) -> StoreResult<Option<ProjectWithContact>> {
        let row = sqlx::query(&format!("{SELECT_PROJECTS} WHERE p.id = $1"))
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_project", e))?;

        row.map(|r| ProjectRow::from_row(&r).map(ProjectWithContact::from))
            .transpose()
            .map_err(|e| map_sqlx_error("get_project", e))
    }

    #[instrument(skip(self), err)]
    async fn list_projects(&self) -> StoreResult<Vec<ProjectWithContact>> {
        let rows = sqlx::query(&format!("{SELECT_PROJECTS} ORDER BY p.id ASC"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_projects", e))?;

        rows.iter()
            .map(|r| ProjectRow::from_row(r).map(ProjectWithContact::from))
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_projects", e))
    }

    #[instrument(skip(self, entry), fields(project_id = %entry.project_id), err)]
    async fn add_time_entry(&self, entry: NewTimeEntry) -> StoreResult<TimeEntry> {
        entry.validate()?;
        let mut tx = self.begin("add_time_entry").await?;

        let owner = sqlx::query("SELECT id FROM projects WHERE id = $1 FOR SHARE")
            .bind(entry.project_id.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("add_time_entry", e))?;
        if owner.is_none() {
            return Err(StoreError::not_found::<Project>(entry.project_id));
        }

        let id: i64 = sqlx::query(
            r#"
            INSERT INTO time_entries (project_id, start_at, stop_at, delta)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(entry.project_id.get())
        .bind(entry.start)
        .bind(entry.stop)
        .bind(entry.delta)
        .fetch_one(&mut *tx)
        .await
        .and_then(|r| r.try_get("id"))
        .map_err(|e| map_sqlx_error("add_time_entry", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("add_time_entry", e))?;
        Ok(TimeEntry::new(TimeEntryId::new(id), entry)?)
    }

    #[instrument(skip(self), fields(time_entry_id = %id), err)]
    async fn get_time_entry(&self, id: TimeEntryId) -> StoreResult<Option<TimeEntryWithProject>> {
        let row = sqlx::query(&format!("{SELECT_TIME_ENTRIES} WHERE t.id = $1"))
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_time_entry", e))?;

        match row {
            Some(r) => {
                let row = TimeEntryRow::from_row(&r).map_err(|e| map_sqlx_error("get_time_entry", e))?;
                Ok(Some(TimeEntryWithProject::try_from(row)?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(entry_count = tracing::field::Empty), err)]
    async fn list_time_entries(&self) -> StoreResult<Vec<TimeEntryWithProject>> {
        let rows = sqlx::query(&format!("{SELECT_TIME_ENTRIES} ORDER BY t.id ASC"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_time_entries", e))?;

        let mut entries = Vec::with_capacity(rows.len());
        for r in &rows {
            let row = TimeEntryRow::from_row(r).map_err(|e| map_sqlx_error("list_time_entries", e))?;
            entries.push(TimeEntryWithProject::try_from(row)?);
        }

        tracing::Span::current().record("entry_count", entries.len());
        Ok(entries)
    }

    #[instrument(skip(self), err)]
    async fn total_delta(&self) -> StoreResult<i64> {
        sqlx::query("SELECT COALESCE(SUM(delta), 0)::BIGINT AS total FROM time_entries")
            .fetch_one(&*self.pool)
            .await
            .and_then(|r| r.try_get("total"))
            .map_err(|e| map_sqlx_error("total_delta", e))
    }
}

// -------------------------
// Row mapping
// -------------------------

struct ContactRow {
    id: i64,
    name: Option<String>,
    email: Option<String>,
    notes: Option<String>,
}

impl<'r> FromRow<'r, PgRow> for ContactRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            notes: row.try_get("notes")?,
        })
    }
}

impl From<ContactRow> for Contact {
    fn from(row: ContactRow) -> Self {
        Contact {
            id: ContactId::new(row.id),
            name: row.name,
            email: row.email,
            notes: row.notes,
        }
    }
}

struct ProjectRow {
    id: i64,
    contact_id: i64,
    name: Option<String>,
    notes: Option<String>,
    contact_name: Option<String>,
    contact_email: Option<String>,
    contact_notes: Option<String>,
}

impl<'r> FromRow<'r, PgRow> for ProjectRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            contact_id: row.try_get("contact_id")?,
            name: row.try_get("name")?,
            notes: row.try_get("notes")?,
            contact_name: row.try_get("contact_name")?,
            contact_email: row.try_get("contact_email")?,
            contact_notes: row.try_get("contact_notes")?,
        })
    }
}

impl From<ProjectRow> for ProjectWithContact {
    fn from(row: ProjectRow) -> Self {
        let contact_id = ContactId::new(row.contact_id);
        ProjectWithContact {
            project: Project {
                id: ProjectId::new(row.id),
                contact_id,
                name: row.name,
                notes: row.notes,
            },
            contact: Contact {
                id: contact_id,
                name: row.contact_name,
                email: row.contact_email,
                notes: row.contact_notes,
            },
        }
    }
}

struct TimeEntryRow {
    id: i64,
    project_id: i64,
    start_at: DateTime<Utc>,
    stop_at: Option<DateTime<Utc>>,
    delta: Option<i64>,
    project_name: Option<String>,
}

impl<'r> FromRow<'r, PgRow> for TimeEntryRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            project_id: row.try_get("project_id")?,
            start_at: row.try_get("start_at")?,
            stop_at: row.try_get("stop_at")?,
            delta: row.try_get("delta")?,
            project_name: row.try_get("project_name")?,
        })
    }
}

impl TryFrom<TimeEntryRow> for TimeEntryWithProject {
    type Error = StoreError;

    fn try_from(row: TimeEntryRow) -> Result<Self, Self::Error> {
        let entry = TimeEntry::new(
            TimeEntryId::new(row.id),
            NewTimeEntry {
                project_id: ProjectId::new(row.project_id),
                start: row.start_at,
                stop: row.stop_at,
                delta: row.delta,
            },
        )?;
        Ok(TimeEntryWithProject {
            entry,
            project_name: row.project_name,
        })
    }
}

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23503") | Some("23514") => StoreError::Conflict(msg),
                _ => StoreError::storage(operation, msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::storage(operation, "connection pool closed"),
        other => StoreError::storage(operation, other.to_string()),
    }
}

/// Runs against a live database: `DATABASE_URL=postgres://... cargo test -- --ignored`.
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tabs_core::Entity;

    async fn store() -> Option<PostgresTimesheetStore> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let pool = crate::db::connect(&url, 2).await.expect("connect");
        crate::db::migrate(&pool).await.expect("migrate");
        Some(PostgresTimesheetStore::new(pool))
    }

    async fn contact_with_project(store: &PostgresTimesheetStore) -> (Contact, Project) {
        let contact = store
            .add_contact(ContactDetails {
                name: Some("Ada".into()),
                email: None,
                notes: None,
            })
            .await
            .unwrap();
        let project = store
            .add_project(NewProject {
                contact_id: contact.id,
                name: Some("Engine".into()),
                notes: None,
            })
            .await
            .unwrap();
        (contact, project)
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn delete_is_restricted_while_projects_exist() {
        let Some(store) = store().await else { return };
        let (contact, project) = contact_with_project(&store).await;

        let err = store.delete_contact(contact.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.get_contact(contact.id).await.unwrap(), Some(contact));
        assert!(store.get_project(project.id).await.unwrap().is_some());

        let missing = store.delete_contact(ContactId::new(i64::MAX)).await.unwrap_err();
        assert!(matches!(missing, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn total_counts_recorded_deltas_only() {
        let Some(store) = store().await else { return };
        let (_contact, project) = contact_with_project(&store).await;
        let before = store.total_delta().await.unwrap();

        let start = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        store
            .add_time_entry(NewTimeEntry {
                project_id: project.id,
                start,
                stop: Some(start + chrono::Duration::minutes(90)),
                delta: Some(5400),
            })
            .await
            .unwrap();
        let open = store
            .add_time_entry(NewTimeEntry {
                project_id: project.id,
                start,
                stop: None,
                delta: None,
            })
            .await
            .unwrap();

        assert_eq!(store.total_delta().await.unwrap(), before + 5400);
        let joined = store.get_time_entry(open.id()).await.unwrap().unwrap();
        assert_eq!(joined.project_name.as_deref(), Some("Engine"));
        assert!(joined.entry.is_running());
    }
}
