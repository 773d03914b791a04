use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

use crate::modules::friend::schema::{FriendEdgeEntity, FriendRequestEntity};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendRequestBody {
    #[validate(range(min = 1, message = "Receiver id must be positive"))]
    pub receiver_id: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RemarkBody {
    #[validate(length(max = 100, message = "Remark must be at most 100 characters long"))]
    pub remark: Option<String>,
}

/// Result of sending a friend request. A pending request in the opposite
/// direction resolves immediately into a friendship, and callers need to
/// tell that apart from a newly created pending request.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", content = "data", rename_all = "snake_case")]
pub enum SendRequestOutcome {
    Created(FriendRequestEntity),
    AutoAccepted(FriendEdgeEntity),
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FriendView {
    pub peer_id: i64,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub remark: Option<String>,
    pub since: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PendingRequestView {
    pub id: i64,
    pub requester_id: i64,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct FriendCountResponse {
    pub count: i64,
}
