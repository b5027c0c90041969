use axum::{Router, routing::get};

pub mod common;
pub mod contacts;
pub mod projects;
pub mod system;
pub mod time_entries;

/// Endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route(
            "/contact/:id",
            get(contacts::get_contact)
                .put(contacts::update_contact)
                .delete(contacts::delete_contact),
        )
        .route("/time_entries/:id", get(time_entries::get_time_entry))
}

/// Endpoints behind the auth gate.
pub fn protected_router() -> Router {
    Router::new()
        .route(
            "/contacts",
            get(contacts::list_contacts).post(contacts::create_contact),
        )
        .route("/projects", get(projects::list_projects))
        .route("/projects/:id", get(projects::get_project))
        .route("/entries", get(time_entries::list_time_entries))
}
