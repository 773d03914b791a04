use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::modules::post::schema::PostEntity;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostBody {
    #[validate(length(min = 1, message = "Post content cannot be empty"))]
    pub content: String,
}

pub struct InsertPost {
    pub author_id: i64,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

/// A post decorated with whether the requesting user has liked it. The flag
/// comes from one batched lookup per page, not a per-item query.
#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    #[serde(flatten)]
    pub post: PostEntity,
    pub liked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> PageResponse<T> {
    pub fn new(content: Vec<T>, page: i64, size: i64, total: i64) -> Self {
        let total_pages = (total + size - 1) / size;
        PageResponse { content, page, size, total, total_pages }
    }
}
