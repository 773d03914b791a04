use crate::{
    api::error,
    modules::friend::{
        model::{FriendView, PendingRequestView},
        repository::{FriendEdgeRepository, FriendRepo, FriendRequestRepository},
        schema::{FriendEdgeEntity, FriendRequestEntity, RequestStatus},
    },
};

#[derive(Clone)]
pub struct FriendRepositoryPg {
    pool: sqlx::PgPool,
}

impl FriendRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FriendEdgeRepository for FriendRepositoryPg {
    async fn find_edge(
        &self,
        owner_id: i64,
        peer_id: i64,
    ) -> Result<Option<FriendEdgeEntity>, error::SystemError> {
        let edge = sqlx::query_as::<_, FriendEdgeEntity>(
            "SELECT * FROM friend_edges WHERE owner_id = $1 AND peer_id = $2",
        )
        .bind(owner_id)
        .bind(peer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(edge)
    }

    async fn find_friends(&self, user_id: i64) -> Result<Vec<FriendView>, error::SystemError> {
        let friends = sqlx::query_as::<_, FriendView>(
            r#"
            SELECT fe.peer_id, u.username, u.display_name, u.avatar_url, fe.remark,
                   fe.created_at AS since
            FROM friend_edges fe
            JOIN users u ON u.id = fe.peer_id AND u.deleted_at IS NULL
            WHERE fe.owner_id = $1
            ORDER BY fe.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(friends)
    }

    async fn friend_ids(&self, user_id: i64) -> Result<Vec<i64>, error::SystemError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT peer_id FROM friend_edges WHERE owner_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn friend_count(&self, user_id: i64) -> Result<i64, error::SystemError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM friend_edges WHERE owner_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn update_remark(
        &self,
        owner_id: i64,
        peer_id: i64,
        remark: Option<&str>,
    ) -> Result<bool, error::SystemError> {
        let rows = sqlx::query(
            "UPDATE friend_edges SET remark = $3 WHERE owner_id = $1 AND peer_id = $2",
        )
        .bind(owner_id)
        .bind(peer_id)
        .bind(remark)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows > 0)
    }

    async fn delete_pair(&self, user_id: i64, peer_id: i64) -> Result<bool, error::SystemError> {
        // Both directions in one statement so a failure cannot leave an
        // asymmetric edge behind.
        let rows = sqlx::query(
            "DELETE FROM friend_edges WHERE (owner_id = $1 AND peer_id = $2) OR (owner_id = $2 AND peer_id = $1)",
        )
        .bind(user_id)
        .bind(peer_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows > 0)
    }
}

#[async_trait::async_trait]
impl FriendRequestRepository for FriendRepositoryPg {
    async fn find_request_by_id(
        &self,
        request_id: i64,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            "SELECT * FROM friend_requests WHERE id = $1",
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn find_pending(
        &self,
        requester_id: i64,
        receiver_id: i64,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            "SELECT * FROM friend_requests WHERE requester_id = $1 AND receiver_id = $2 AND status = 'pending'",
        )
        .bind(requester_id)
        .bind(receiver_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn find_pending_to(
        &self,
        receiver_id: i64,
    ) -> Result<Vec<PendingRequestView>, error::SystemError> {
        let requests = sqlx::query_as::<_, PendingRequestView>(
            r#"
            SELECT fr.id, fr.requester_id, u.username, u.display_name, u.avatar_url,
                   fr.created_at
            FROM friend_requests fr
            JOIN users u ON u.id = fr.requester_id AND u.deleted_at IS NULL
            WHERE fr.receiver_id = $1 AND fr.status = 'pending'
            ORDER BY fr.created_at DESC
            "#,
        )
        .bind(receiver_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn create_pending(
        &self,
        requester_id: i64,
        receiver_id: i64,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            "INSERT INTO friend_requests (requester_id, receiver_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(requester_id)
        .bind(receiver_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let err = error::SystemError::from(e);
            if err.violated_constraint() == Some("friend_requests_pending") {
                error::SystemError::DuplicateRequest
            } else {
                err
            }
        })?;

        Ok(request)
    }
}

#[async_trait::async_trait]
impl FriendRepo for FriendRepositoryPg {
    async fn accept_request_atomic(
        &self,
        request_id: i64,
    ) -> Result<FriendEdgeEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        // Re-read under lock: a concurrent resolver may have won between the
        // service-level check and this transaction.
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            "SELECT * FROM friend_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_optional(tx.as_mut())
        .await?
        .ok_or_else(|| error::SystemError::not_found("Friend request not found"))?;

        if request.status != RequestStatus::Pending {
            return Err(error::SystemError::AlreadyResolved);
        }

        sqlx::query(
            "UPDATE friend_requests SET status = 'accepted', updated_at = now() WHERE id = $1",
        )
        .bind(request_id)
        .execute(tx.as_mut())
        .await?;

        // Idempotent dual insert; the primary key absorbs the case where the
        // edges already exist.
        sqlx::query(
            "INSERT INTO friend_edges (owner_id, peer_id) VALUES ($1, $2), ($2, $1) ON CONFLICT (owner_id, peer_id) DO NOTHING",
        )
        .bind(request.requester_id)
        .bind(request.receiver_id)
        .execute(tx.as_mut())
        .await?;

        sqlx::query("DELETE FROM friend_requests WHERE id = $1")
            .bind(request_id)
            .execute(tx.as_mut())
            .await?;

        let edge = sqlx::query_as::<_, FriendEdgeEntity>(
            "SELECT * FROM friend_edges WHERE owner_id = $1 AND peer_id = $2",
        )
        .bind(request.receiver_id)
        .bind(request.requester_id)
        .fetch_one(tx.as_mut())
        .await?;

        tx.commit().await?;

        Ok(edge)
    }

    async fn reject_request_atomic(&self, request_id: i64) -> Result<(), error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, FriendRequestEntity>(
            "SELECT * FROM friend_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_optional(tx.as_mut())
        .await?
        .ok_or_else(|| error::SystemError::not_found("Friend request not found"))?;

        if request.status != RequestStatus::Pending {
            return Err(error::SystemError::AlreadyResolved);
        }

        sqlx::query(
            "UPDATE friend_requests SET status = 'rejected', updated_at = now() WHERE id = $1",
        )
        .bind(request_id)
        .execute(tx.as_mut())
        .await?;

        sqlx::query("DELETE FROM friend_requests WHERE id = $1")
            .bind(request_id)
            .execute(tx.as_mut())
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
