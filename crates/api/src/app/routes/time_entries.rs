use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
};

use tabs_core::TimeEntryId;
use tabs_timekeeping::TimeEntry;

use crate::app::dto::{TimeEntriesEnvelope, TimeEntryFields};
use crate::app::errors::ApiError;
use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;

pub async fn get_time_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<TimeEntryFields>, ApiError> {
    let id: TimeEntryId = parse_id(&id)?;
    let entry = services
        .store()
        .get_time_entry(id)
        .await?
        .ok_or_else(|| ApiError::not_found::<TimeEntry>(id))?;
    Ok(Json(entry.into()))
}

/// All entries plus the summed delta across every persisted entry.
pub async fn list_time_entries(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<TimeEntriesEnvelope>, ApiError> {
    let store = services.store();
    let entries = store.list_time_entries().await?;
    let total = store.total_delta().await?;
    Ok(Json(TimeEntriesEnvelope::new(entries, total)))
}
