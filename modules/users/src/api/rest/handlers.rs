use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::Path,
    http::StatusCode,
    response::Json,
    Extension,
};
use modkit::{ApiError, ApiResult};

use crate::api::rest::dto::{UserDto, UserPayload};
use crate::contract::model::NewUser;
use crate::domain::store::UserStore;

fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::bad_request("Invalid user ID"))
}

// Decoded outside the store lock; Content-Type is not checked.
fn decode_payload(body: &[u8]) -> ApiResult<NewUser> {
    serde_json::from_slice::<UserPayload>(body)
        .map(NewUser::from)
        .map_err(|_| ApiError::bad_request("Invalid request body"))
}

fn user_not_found() -> ApiError {
    ApiError::not_found("User not found")
}

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    responses((status = 200, description = "All users, ordered by id", body = [UserDto]))
)]
pub async fn list_users(Extension(store): Extension<Arc<UserStore>>) -> Json<Vec<UserDto>> {
    Json(store.list().into_iter().map(UserDto::from).collect())
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = UserPayload,
    responses(
        (status = 201, description = "Created user", body = UserDto),
        (status = 400, description = "Body is not a valid user object"),
    )
)]
pub async fn create_user(
    Extension(store): Extension<Arc<UserStore>>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<UserDto>)> {
    let new_user = decode_payload(&body)?;
    let user = store.create(new_user);
    Ok((StatusCode::CREATED, Json(UserDto::from(user))))
}

/// Get a user by id
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = UserDto),
        (status = 400, description = "Id is not an integer"),
        (status = 404, description = "No such user"),
    )
)]
pub async fn get_user(
    Extension(store): Extension<Arc<UserStore>>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserDto>> {
    let id = parse_id(&id)?;
    store
        .get(id)
        .map(|u| Json(UserDto::from(u)))
        .ok_or_else(user_not_found)
}

/// Replace a user's name and email
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    request_body = UserPayload,
    responses(
        (status = 200, description = "Updated user", body = UserDto),
        (status = 400, description = "Bad id or body"),
        (status = 404, description = "No such user"),
    )
)]
pub async fn update_user(
    Extension(store): Extension<Arc<UserStore>>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<UserDto>> {
    let id = parse_id(&id)?;
    let data = decode_payload(&body)?;
    store
        .update(id, data)
        .map(|u| Json(UserDto::from(u)))
        .ok_or_else(user_not_found)
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Id is not an integer"),
        (status = 404, description = "No such user"),
    )
)]
pub async fn delete_user(
    Extension(store): Extension<Arc<UserStore>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    if store.delete(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(user_not_found())
    }
}
