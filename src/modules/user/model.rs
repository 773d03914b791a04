use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::modules::user::schema::UserEntity;

#[derive(Deserialize, Validate)]
pub struct SignUpModel {
    #[validate(length(min = 3, message = "Username must be at least 3 characters long"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    #[validate(length(min = 1, message = "Display name cannot be empty"))]
    pub display_name: String,
}

#[derive(Deserialize, Validate)]
pub struct SignInModel {
    #[validate(length(min = 3, message = "Username must be at least 3 characters long"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
}

pub struct InsertUser {
    pub username: String,
    pub email: String,
    pub hash_password: String,
    pub display_name: String,
}

#[derive(Serialize)]
pub struct SignUpResponse {
    pub id: i64,
}

#[derive(Serialize)]
pub struct SignInResponse {
    pub access_token: String,
}

#[derive(Deserialize, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl From<UserEntity> for UserResponse {
    fn from(user: UserEntity) -> Self {
        UserResponse {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
        }
    }
}
