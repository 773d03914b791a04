use crate::{
    api::error, modules::user::model::InsertUser, modules::user::schema::UserEntity,
};

#[async_trait::async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<UserEntity>, error::SystemError>;
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserEntity>, error::SystemError>;
    async fn create(&self, user: &InsertUser) -> Result<i64, error::SystemError>;

    /// Participant validation for the relationship manager.
    async fn exists(&self, id: i64) -> Result<bool, error::SystemError>;
}
