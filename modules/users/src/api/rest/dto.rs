use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::contract::model::{NewUser, User};

/// Wire shape of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Body of create and update requests. A client-sent `id` is accepted and ignored.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserPayload {
    #[serde(default, skip_serializing)]
    #[schema(read_only)]
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

impl From<UserPayload> for NewUser {
    fn from(req: UserPayload) -> Self {
        Self {
            name: req.name,
            email: req.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_dto_field_names() {
        let dto = UserDto::from(User {
            id: 7,
            name: "Jane".into(),
            email: "jane@x.com".into(),
        });
        assert_eq!(
            serde_json::to_value(&dto).unwrap(),
            serde_json::json!({ "id": 7, "name": "Jane", "email": "jane@x.com" })
        );
    }

    #[test]
    fn payload_requires_name_and_email() {
        assert!(serde_json::from_str::<UserPayload>(r#"{"name":"Jane"}"#).is_err());
        assert!(serde_json::from_str::<UserPayload>(r#"{"email":"j@x.com"}"#).is_err());
        assert!(serde_json::from_str::<UserPayload>(r#"{"name":1,"email":"j@x.com"}"#).is_err());
    }

    #[test]
    fn payload_ignores_client_id() {
        let req: UserPayload =
            serde_json::from_str(r#"{"id":99,"name":"Jane","email":"j@x.com"}"#).unwrap();
        let new_user = NewUser::from(req);
        assert_eq!(new_user.name, "Jane");
        assert_eq!(new_user.email, "j@x.com");
    }
}
