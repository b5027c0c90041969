use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
};
use serde_json::{Value, json};

use tabs_core::ContactId;
use tabs_timekeeping::Contact;

use crate::app::dto::{self, ContactFields};
use crate::app::errors::ApiError;
use crate::app::routes::common::{FormOrJson, parse_id};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub async fn get_contact(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<ContactFields>, ApiError> {
    let id: ContactId = parse_id(&id)?;
    let contact = services
        .store()
        .get_contact(id)
        .await?
        .ok_or_else(|| ApiError::not_found::<Contact>(id))?;
    Ok(Json(contact.into()))
}

pub async fn update_contact(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    FormOrJson(body): FormOrJson<dto::UpdateContactRequest>,
) -> Result<Json<ContactFields>, ApiError> {
    let id: ContactId = parse_id(&id)?;
    let contact = services.store().update_contact(id, body.into()).await?;
    tracing::info!(contact_id = %contact.id, "contact updated");
    Ok(Json(contact.into()))
}

pub async fn delete_contact(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id: ContactId = parse_id(&id)?;
    services.store().delete_contact(id).await?;
    tracing::info!(contact_id = %id, "contact deleted");
    Ok(Json(json!([])))
}

pub async fn list_contacts(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<ContactFields>>, ApiError> {
    let contacts = services.store().list_contacts().await?;
    Ok(Json(contacts.into_iter().map(ContactFields::from).collect()))
}

pub async fn create_contact(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    FormOrJson(body): FormOrJson<dto::CreateContactRequest>,
) -> Result<(StatusCode, Json<ContactFields>), ApiError> {
    let contact = services.store().add_contact(body.into()).await?;
    tracing::info!(
        contact_id = %contact.id,
        principal = %principal.principal_id(),
        "contact created"
    );
    Ok((StatusCode::CREATED, Json(contact.into())))
}
