use crate::api::error;
use crate::modules::friend::model::{FriendView, PendingRequestView};
use crate::modules::friend::schema::{FriendEdgeEntity, FriendRequestEntity};

#[async_trait::async_trait]
pub trait FriendEdgeRepository {
    async fn find_edge(
        &self,
        owner_id: i64,
        peer_id: i64,
    ) -> Result<Option<FriendEdgeEntity>, error::SystemError>;

    async fn find_friends(&self, user_id: i64) -> Result<Vec<FriendView>, error::SystemError>;

    async fn friend_ids(&self, user_id: i64) -> Result<Vec<i64>, error::SystemError>;

    async fn friend_count(&self, user_id: i64) -> Result<i64, error::SystemError>;

    /// Returns false when no edge exists in that direction.
    async fn update_remark(
        &self,
        owner_id: i64,
        peer_id: i64,
        remark: Option<&str>,
    ) -> Result<bool, error::SystemError>;

    /// Deletes both directions in one statement. Returns false when the
    /// users were not friends.
    async fn delete_pair(&self, user_id: i64, peer_id: i64) -> Result<bool, error::SystemError>;
}

#[async_trait::async_trait]
pub trait FriendRequestRepository {
    async fn find_request_by_id(
        &self,
        request_id: i64,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError>;

    async fn find_pending(
        &self,
        requester_id: i64,
        receiver_id: i64,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError>;

    async fn find_pending_to(
        &self,
        receiver_id: i64,
    ) -> Result<Vec<PendingRequestView>, error::SystemError>;

    /// Inserts a pending request. A concurrent duplicate trips the partial
    /// unique index and comes back as `DuplicateRequest`.
    async fn create_pending(
        &self,
        requester_id: i64,
        receiver_id: i64,
    ) -> Result<FriendRequestEntity, error::SystemError>;
}

#[async_trait::async_trait]
pub trait FriendRepo: FriendEdgeRepository + FriendRequestRepository + Send + Sync {
    /// Resolves a pending request into a friendship: marks it accepted,
    /// inserts both directed edges idempotently, deletes the request. One
    /// transaction; the request row is re-checked inside it. Returns the
    /// edge owned by the accepting side (receiver -> requester).
    async fn accept_request_atomic(
        &self,
        request_id: i64,
    ) -> Result<FriendEdgeEntity, error::SystemError>;

    /// Marks a pending request rejected and deletes it in one transaction.
    async fn reject_request_atomic(&self, request_id: i64) -> Result<(), error::SystemError>;
}
