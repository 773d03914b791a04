use std::collections::HashSet;

use crate::{
    api::error,
    modules::post::{
        model::InsertPost,
        repository::{PostLikeRepository, PostRepo, PostRepository},
        schema::PostEntity,
    },
};

#[derive(Clone)]
pub struct PostRepositoryPg {
    pool: sqlx::PgPool,
}

impl PostRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PostRepository for PostRepositoryPg {
    async fn create(&self, post: &InsertPost) -> Result<PostEntity, error::SystemError> {
        let post = sqlx::query_as::<_, PostEntity>(
            "INSERT INTO posts (author_id, content) VALUES ($1, $2) RETURNING *",
        )
        .bind(post.author_id)
        .bind(&post.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    async fn find_by_id(&self, post_id: i64) -> Result<Option<PostEntity>, error::SystemError> {
        let post = sqlx::query_as::<_, PostEntity>("SELECT * FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    async fn find_by_author(
        &self,
        author_id: i64,
    ) -> Result<Vec<PostEntity>, error::SystemError> {
        let posts = sqlx::query_as::<_, PostEntity>(
            "SELECT * FROM posts WHERE author_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn find_by_authors(
        &self,
        author_ids: &[i64],
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PostEntity>, error::SystemError> {
        let posts = sqlx::query_as::<_, PostEntity>(
            "SELECT * FROM posts WHERE author_id = ANY($1) ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(author_ids)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn count_by_authors(&self, author_ids: &[i64]) -> Result<i64, error::SystemError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM posts WHERE author_id = ANY($1)",
        )
        .bind(author_ids)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn find_excluding_authors(
        &self,
        author_ids: &[i64],
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PostEntity>, error::SystemError> {
        let posts = sqlx::query_as::<_, PostEntity>(
            "SELECT * FROM posts WHERE author_id <> ALL($1) ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(author_ids)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn count_excluding_authors(
        &self,
        author_ids: &[i64],
    ) -> Result<i64, error::SystemError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM posts WHERE author_id <> ALL($1)",
        )
        .bind(author_ids)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

#[async_trait::async_trait]
impl PostLikeRepository for PostRepositoryPg {
    async fn liked_post_ids(
        &self,
        post_ids: &[i64],
        user_id: i64,
    ) -> Result<HashSet<i64>, error::SystemError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT post_id FROM post_likes WHERE user_id = $1 AND post_id = ANY($2)",
        )
        .bind(user_id)
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }

    async fn like_atomic(&self, post_id: i64, user_id: i64) -> Result<bool, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            "INSERT INTO post_likes (post_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(post_id)
        .bind(user_id)
        .execute(tx.as_mut())
        .await?
        .rows_affected();

        if rows == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE posts SET like_count = like_count + 1 WHERE id = $1")
            .bind(post_id)
            .execute(tx.as_mut())
            .await?;

        tx.commit().await?;

        Ok(true)
    }

    async fn unlike_atomic(&self, post_id: i64, user_id: i64) -> Result<bool, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(tx.as_mut())
            .await?
            .rows_affected();

        if rows == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE posts SET like_count = GREATEST(like_count - 1, 0) WHERE id = $1")
            .bind(post_id)
            .execute(tx.as_mut())
            .await?;

        tx.commit().await?;

        Ok(true)
    }
}

impl PostRepo for PostRepositoryPg {}
