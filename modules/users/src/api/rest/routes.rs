use std::sync::Arc;

use axum::{
    routing::{get, MethodRouter},
    Extension, Router,
};
use modkit::api::{not_found, OpenApiRegistry};
use utoipa::OpenApi;

use crate::api::rest::{dto, handlers};
use crate::domain::store::UserStore;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_users,
        handlers::create_user,
        handlers::get_user,
        handlers::update_user,
        handlers::delete_user,
    ),
    components(schemas(dto::UserDto, dto::UserPayload)),
    tags((name = "users", description = "In-memory user directory"))
)]
struct UsersApi;

fn collection() -> MethodRouter {
    get(handlers::list_users)
        .post(handlers::create_user)
        .fallback(not_found)
}

fn item() -> MethodRouter {
    get(handlers::get_user)
        .put(handlers::update_user)
        .delete(handlers::delete_user)
        .fallback(not_found)
}

/// Mount `/users` and `/users/{id}` (with or without a trailing slash) and
/// publish their OpenAPI fragment.
pub fn register_routes(
    router: Router,
    openapi: &dyn OpenApiRegistry,
    store: Arc<UserStore>,
) -> anyhow::Result<Router> {
    openapi.register_openapi(UsersApi::openapi());

    let users = Router::new()
        .route("/users", collection())
        .route("/users/", collection())
        .route("/users/{id}", item())
        .route("/users/{id}/", item())
        .layer(Extension(store));

    Ok(router.merge(users))
}
