use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
};

use tabs_core::ProjectId;
use tabs_timekeeping::Project;

use crate::app::dto::ProjectFields;
use crate::app::errors::ApiError;
use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;

pub async fn get_project(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<ProjectFields>, ApiError> {
    let id: ProjectId = parse_id(&id)?;
    let project = services
        .store()
        .get_project(id)
        .await?
        .ok_or_else(|| ApiError::not_found::<Project>(id))?;
    Ok(Json(project.into()))
}

pub async fn list_projects(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<ProjectFields>>, ApiError> {
    let projects = services.store().list_projects().await?;
    Ok(Json(projects.into_iter().map(ProjectFields::from).collect()))
}
