use serde::{Deserialize, Serialize};
use sqlx::prelude::{FromRow, Type};

#[derive(Debug, PartialEq, Clone, Type, Serialize, Deserialize)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

/*
CREATE TABLE friend_edges (
    owner_id   BIGINT NOT NULL REFERENCES users(id),
    peer_id    BIGINT NOT NULL REFERENCES users(id),
    remark     TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (owner_id, peer_id),
    CHECK (owner_id <> peer_id)
);

A friendship is always two rows, (a,b) and (b,a), written in one
transaction. The remark annotates a single direction. The primary key is
what actually enforces edge uniqueness under concurrent accepts.
*/
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FriendEdgeEntity {
    pub owner_id: i64,
    pub peer_id: i64,
    pub remark: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/*
CREATE TYPE request_status AS ENUM ('pending', 'accepted', 'rejected');

CREATE TABLE friend_requests (
    id           BIGSERIAL PRIMARY KEY,
    requester_id BIGINT NOT NULL REFERENCES users(id),
    receiver_id  BIGINT NOT NULL REFERENCES users(id),
    status       request_status NOT NULL DEFAULT 'pending',
    created_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
    CHECK (requester_id <> receiver_id)
);
CREATE UNIQUE INDEX friend_requests_pending
    ON friend_requests (requester_id, receiver_id) WHERE status = 'pending';

Requests are transient negotiation records: resolution marks the status and
deletes the row in the same transaction, so nothing resolved survives. The
partial unique index caps each ordered pair at one live request.
*/
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FriendRequestEntity {
    pub id: i64,
    pub requester_id: i64,
    pub receiver_id: i64,
    pub status: RequestStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
