use std::collections::HashSet;

use crate::api::error;
use crate::modules::post::model::InsertPost;
use crate::modules::post::schema::PostEntity;

/// Content store. The two author partitions are queried separately and each
/// is ordered `created_at DESC, id DESC`; the feed composer relies on both
/// query and count pairs seeing the same partition.
#[async_trait::async_trait]
pub trait PostRepository {
    async fn create(&self, post: &InsertPost) -> Result<PostEntity, error::SystemError>;

    async fn find_by_id(&self, post_id: i64) -> Result<Option<PostEntity>, error::SystemError>;

    async fn find_by_author(&self, author_id: i64) -> Result<Vec<PostEntity>, error::SystemError>;

    async fn find_by_authors(
        &self,
        author_ids: &[i64],
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PostEntity>, error::SystemError>;

    async fn count_by_authors(&self, author_ids: &[i64]) -> Result<i64, error::SystemError>;

    async fn find_excluding_authors(
        &self,
        author_ids: &[i64],
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PostEntity>, error::SystemError>;

    async fn count_excluding_authors(
        &self,
        author_ids: &[i64],
    ) -> Result<i64, error::SystemError>;
}

#[async_trait::async_trait]
pub trait PostLikeRepository {
    /// Which of the given posts the user has liked, in one round trip.
    async fn liked_post_ids(
        &self,
        post_ids: &[i64],
        user_id: i64,
    ) -> Result<HashSet<i64>, error::SystemError>;

    /// Inserts the like row and bumps the counter in one transaction.
    /// Returns false when the user had already liked the post.
    async fn like_atomic(&self, post_id: i64, user_id: i64) -> Result<bool, error::SystemError>;

    /// Removes the like row and decrements the counter (floored at zero) in
    /// one transaction. Returns false when there was no like to remove.
    async fn unlike_atomic(&self, post_id: i64, user_id: i64) -> Result<bool, error::SystemError>;
}

pub trait PostRepo: PostRepository + PostLikeRepository + Send + Sync {}
