use serde::Serialize;
use sqlx::prelude::FromRow;

/*
CREATE TABLE posts (
    id         BIGSERIAL PRIMARY KEY,
    author_id  BIGINT NOT NULL REFERENCES users(id),
    content    TEXT NOT NULL,
    like_count INT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX posts_author_created ON posts (author_id, created_at DESC, id DESC);

CREATE TABLE post_likes (
    post_id BIGINT NOT NULL REFERENCES posts(id),
    user_id BIGINT NOT NULL REFERENCES users(id),
    PRIMARY KEY (post_id, user_id)
);

like_count is denormalized bookkeeping over post_likes; it is only ever
moved together with the like row, inside one transaction.
*/
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PostEntity {
    pub id: i64,
    pub author_id: i64,
    pub content: String,
    pub like_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
