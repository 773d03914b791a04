use std::sync::Arc;

use crate::{
    api::error,
    modules::{
        friend::{
            model::{FriendView, PendingRequestView, SendRequestOutcome},
            repository::FriendRepo,
            schema::{FriendEdgeEntity, RequestStatus},
        },
        user::repository::UserRepository,
    },
};

#[derive(Clone)]
pub struct FriendService<R, U>
where
    R: FriendRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    friend_repo: Arc<R>,
    user_repo: Arc<U>,
}

impl<R, U> FriendService<R, U>
where
    R: FriendRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    pub fn with_dependencies(friend_repo: Arc<R>, user_repo: Arc<U>) -> Self {
        FriendService { friend_repo, user_repo }
    }

    pub async fn send_request(
        &self,
        requester_id: i64,
        receiver_id: i64,
    ) -> Result<SendRequestOutcome, error::SystemError> {
        if requester_id == receiver_id {
            return Err(error::SystemError::invalid_operation(
                "Cannot send a friend request to yourself",
            ));
        }

        let (requester_exists, receiver_exists) = tokio::try_join!(
            self.user_repo.exists(requester_id),
            self.user_repo.exists(receiver_id),
        )?;

        if !requester_exists {
            return Err(error::SystemError::not_found("Requester not found"));
        }
        if !receiver_exists {
            return Err(error::SystemError::not_found("Receiver not found"));
        }

        let (edge, pending) = tokio::try_join!(
            self.friend_repo.find_edge(requester_id, receiver_id),
            self.friend_repo.find_pending(requester_id, receiver_id),
        )?;

        if edge.is_some() {
            return Err(error::SystemError::AlreadyFriends);
        }
        if pending.is_some() {
            return Err(error::SystemError::DuplicateRequest);
        }

        // A pending request in the opposite direction means both sides want
        // the friendship; resolve that request instead of stacking a second
        // one. The returned edge is the requester's direction.
        if let Some(reverse) =
            self.friend_repo.find_pending(receiver_id, requester_id).await?
        {
            let edge = self.friend_repo.accept_request_atomic(reverse.id).await?;
            return Ok(SendRequestOutcome::AutoAccepted(edge));
        }

        let request = self.friend_repo.create_pending(requester_id, receiver_id).await?;
        Ok(SendRequestOutcome::Created(request))
    }

    pub async fn accept_request(
        &self,
        request_id: i64,
        acting_user_id: i64,
    ) -> Result<FriendEdgeEntity, error::SystemError> {
        let request = self
            .friend_repo
            .find_request_by_id(request_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Friend request not found"))?;

        if request.receiver_id != acting_user_id {
            return Err(error::SystemError::forbidden(
                "You are not allowed to handle this friend request",
            ));
        }

        if request.status != RequestStatus::Pending {
            return Err(error::SystemError::AlreadyResolved);
        }

        self.friend_repo.accept_request_atomic(request.id).await
    }

    pub async fn reject_request(
        &self,
        request_id: i64,
        acting_user_id: i64,
    ) -> Result<(), error::SystemError> {
        let request = self
            .friend_repo
            .find_request_by_id(request_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Friend request not found"))?;

        if request.receiver_id != acting_user_id {
            return Err(error::SystemError::forbidden(
                "You are not allowed to handle this friend request",
            ));
        }

        if request.status != RequestStatus::Pending {
            return Err(error::SystemError::AlreadyResolved);
        }

        self.friend_repo.reject_request_atomic(request.id).await
    }

    pub async fn remove_friendship(
        &self,
        user_id: i64,
        peer_id: i64,
    ) -> Result<(), error::SystemError> {
        if user_id == peer_id {
            return Err(error::SystemError::invalid_operation(
                "Cannot unfriend yourself",
            ));
        }

        if !self.friend_repo.delete_pair(user_id, peer_id).await? {
            return Err(error::SystemError::NotFriends);
        }

        Ok(())
    }

    pub async fn set_remark(
        &self,
        user_id: i64,
        peer_id: i64,
        remark: Option<String>,
    ) -> Result<(), error::SystemError> {
        if user_id == peer_id {
            return Err(error::SystemError::invalid_operation(
                "Cannot set a remark for yourself",
            ));
        }

        // Blank remarks clear the annotation instead of storing whitespace.
        let remark = remark.as_deref().map(str::trim).filter(|r| !r.is_empty());

        if !self.friend_repo.update_remark(user_id, peer_id, remark).await? {
            return Err(error::SystemError::NotFriends);
        }

        Ok(())
    }

    pub async fn get_friends(&self, user_id: i64) -> Result<Vec<FriendView>, error::SystemError> {
        self.friend_repo.find_friends(user_id).await
    }

    pub async fn pending_requests(
        &self,
        receiver_id: i64,
    ) -> Result<Vec<PendingRequestView>, error::SystemError> {
        self.friend_repo.find_pending_to(receiver_id).await
    }

    pub async fn is_friend(&self, user_id: i64, peer_id: i64) -> Result<bool, error::SystemError> {
        let edge = self.friend_repo.find_edge(user_id, peer_id).await?;
        Ok(edge.is_some())
    }

    pub async fn friend_count(&self, user_id: i64) -> Result<i64, error::SystemError> {
        self.friend_repo.friend_count(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::modules::friend::repository::{FriendEdgeRepository, FriendRequestRepository};
    use crate::modules::friend::schema::FriendRequestEntity;
    use crate::modules::user::model::InsertUser;
    use crate::modules::user::schema::UserEntity;

    struct InMemoryFriendRepo {
        edges: Mutex<Vec<FriendEdgeEntity>>,
        requests: Mutex<Vec<FriendRequestEntity>>,
        next_request_id: AtomicI64,
    }

    impl InMemoryFriendRepo {
        fn new() -> Self {
            Self {
                edges: Mutex::new(Vec::new()),
                requests: Mutex::new(Vec::new()),
                next_request_id: AtomicI64::new(1),
            }
        }
    }

    #[async_trait::async_trait]
    impl FriendEdgeRepository for InMemoryFriendRepo {
        async fn find_edge(
            &self,
            owner_id: i64,
            peer_id: i64,
        ) -> Result<Option<FriendEdgeEntity>, error::SystemError> {
            Ok(self
                .edges
                .lock()
                .unwrap()
                .iter()
                .find(|e| e.owner_id == owner_id && e.peer_id == peer_id)
                .cloned())
        }

        async fn find_friends(
            &self,
            user_id: i64,
        ) -> Result<Vec<FriendView>, error::SystemError> {
            let mut views: Vec<FriendView> = self
                .edges
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.owner_id == user_id)
                .map(|e| FriendView {
                    peer_id: e.peer_id,
                    username: format!("user{}", e.peer_id),
                    display_name: format!("User {}", e.peer_id),
                    avatar_url: None,
                    remark: e.remark.clone(),
                    since: e.created_at,
                })
                .collect();
            views.sort_by(|a, b| b.since.cmp(&a.since));
            Ok(views)
        }

        async fn friend_ids(&self, user_id: i64) -> Result<Vec<i64>, error::SystemError> {
            Ok(self
                .edges
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.owner_id == user_id)
                .map(|e| e.peer_id)
                .collect())
        }

        async fn friend_count(&self, user_id: i64) -> Result<i64, error::SystemError> {
            Ok(self.friend_ids(user_id).await?.len() as i64)
        }

        async fn update_remark(
            &self,
            owner_id: i64,
            peer_id: i64,
            remark: Option<&str>,
        ) -> Result<bool, error::SystemError> {
            let mut edges = self.edges.lock().unwrap();
            match edges.iter_mut().find(|e| e.owner_id == owner_id && e.peer_id == peer_id) {
                Some(edge) => {
                    edge.remark = remark.map(str::to_owned);
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn delete_pair(
            &self,
            user_id: i64,
            peer_id: i64,
        ) -> Result<bool, error::SystemError> {
            let mut edges = self.edges.lock().unwrap();
            let before = edges.len();
            edges.retain(|e| {
                !((e.owner_id == user_id && e.peer_id == peer_id)
                    || (e.owner_id == peer_id && e.peer_id == user_id))
            });
            Ok(edges.len() < before)
        }
    }

    #[async_trait::async_trait]
    impl FriendRequestRepository for InMemoryFriendRepo {
        async fn find_request_by_id(
            &self,
            request_id: i64,
        ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
            Ok(self.requests.lock().unwrap().iter().find(|r| r.id == request_id).cloned())
        }

        async fn find_pending(
            &self,
            requester_id: i64,
            receiver_id: i64,
        ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
            Ok(self
                .requests
                .lock()
                .unwrap()
                .iter()
                .find(|r| {
                    r.requester_id == requester_id
                        && r.receiver_id == receiver_id
                        && r.status == RequestStatus::Pending
                })
                .cloned())
        }

        async fn find_pending_to(
            &self,
            receiver_id: i64,
        ) -> Result<Vec<PendingRequestView>, error::SystemError> {
            Ok(self
                .requests
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.receiver_id == receiver_id && r.status == RequestStatus::Pending)
                .map(|r| PendingRequestView {
                    id: r.id,
                    requester_id: r.requester_id,
                    username: format!("user{}", r.requester_id),
                    display_name: format!("User {}", r.requester_id),
                    avatar_url: None,
                    created_at: r.created_at,
                })
                .collect())
        }

        async fn create_pending(
            &self,
            requester_id: i64,
            receiver_id: i64,
        ) -> Result<FriendRequestEntity, error::SystemError> {
            let mut requests = self.requests.lock().unwrap();
            // Mirrors the partial unique index on (requester, receiver,
            // status = pending).
            if requests.iter().any(|r| {
                r.requester_id == requester_id
                    && r.receiver_id == receiver_id
                    && r.status == RequestStatus::Pending
            }) {
                return Err(error::SystemError::DuplicateRequest);
            }

            let now = chrono::Utc::now();
            let request = FriendRequestEntity {
                id: self.next_request_id.fetch_add(1, Ordering::SeqCst),
                requester_id,
                receiver_id,
                status: RequestStatus::Pending,
                created_at: now,
                updated_at: now,
            };
            requests.push(request.clone());
            Ok(request)
        }
    }

    #[async_trait::async_trait]
    impl FriendRepo for InMemoryFriendRepo {
        async fn accept_request_atomic(
            &self,
            request_id: i64,
        ) -> Result<FriendEdgeEntity, error::SystemError> {
            let request = self
                .find_request_by_id(request_id)
                .await?
                .ok_or_else(|| error::SystemError::not_found("Friend request not found"))?;

            if request.status != RequestStatus::Pending {
                return Err(error::SystemError::AlreadyResolved);
            }

            let now = chrono::Utc::now();
            {
                let mut edges = self.edges.lock().unwrap();
                for (owner_id, peer_id) in [
                    (request.requester_id, request.receiver_id),
                    (request.receiver_id, request.requester_id),
                ] {
                    if !edges.iter().any(|e| e.owner_id == owner_id && e.peer_id == peer_id) {
                        edges.push(FriendEdgeEntity {
                            owner_id,
                            peer_id,
                            remark: None,
                            created_at: now,
                        });
                    }
                }
            }

            self.requests.lock().unwrap().retain(|r| r.id != request_id);

            Ok(self
                .find_edge(request.receiver_id, request.requester_id)
                .await?
                .expect("edge just inserted"))
        }

        async fn reject_request_atomic(
            &self,
            request_id: i64,
        ) -> Result<(), error::SystemError> {
            let request = self
                .find_request_by_id(request_id)
                .await?
                .ok_or_else(|| error::SystemError::not_found("Friend request not found"))?;

            if request.status != RequestStatus::Pending {
                return Err(error::SystemError::AlreadyResolved);
            }

            self.requests.lock().unwrap().retain(|r| r.id != request_id);
            Ok(())
        }
    }

    struct InMemoryUserRepo {
        ids: Vec<i64>,
    }

    #[async_trait::async_trait]
    impl UserRepository for InMemoryUserRepo {
        async fn find_by_id(&self, id: i64) -> Result<Option<UserEntity>, error::SystemError> {
            if !self.ids.contains(&id) {
                return Ok(None);
            }
            Ok(Some(UserEntity {
                id,
                username: format!("user{}", id),
                email: format!("user{}@example.com", id),
                hash_password: String::new(),
                display_name: format!("User {}", id),
                avatar_url: None,
                deleted_at: None,
                created_at: chrono::Utc::now(),
            }))
        }

        async fn find_by_username(
            &self,
            _username: &str,
        ) -> Result<Option<UserEntity>, error::SystemError> {
            Ok(None)
        }

        async fn create(&self, _user: &InsertUser) -> Result<i64, error::SystemError> {
            Ok(0)
        }

        async fn exists(&self, id: i64) -> Result<bool, error::SystemError> {
            Ok(self.ids.contains(&id))
        }
    }

    fn service(users: &[i64]) -> FriendService<InMemoryFriendRepo, InMemoryUserRepo> {
        FriendService::with_dependencies(
            Arc::new(InMemoryFriendRepo::new()),
            Arc::new(InMemoryUserRepo { ids: users.to_vec() }),
        )
    }

    async fn befriend(svc: &FriendService<InMemoryFriendRepo, InMemoryUserRepo>, a: i64, b: i64) {
        match svc.send_request(a, b).await.unwrap() {
            SendRequestOutcome::Created(request) => {
                svc.accept_request(request.id, b).await.unwrap();
            }
            SendRequestOutcome::AutoAccepted(_) => {}
        }
    }

    #[actix_web::test]
    async fn accept_creates_symmetric_friendship() {
        let svc = service(&[1, 2]);

        let request = match svc.send_request(1, 2).await.unwrap() {
            SendRequestOutcome::Created(request) => request,
            other => panic!("expected a new pending request, got {:?}", other),
        };
        assert_eq!(request.status, RequestStatus::Pending);

        let edge = svc.accept_request(request.id, 2).await.unwrap();
        assert_eq!((edge.owner_id, edge.peer_id), (2, 1));

        assert!(svc.is_friend(1, 2).await.unwrap());
        assert!(svc.is_friend(2, 1).await.unwrap());

        // The request record is gone once resolved.
        let err = svc.accept_request(request.id, 2).await.unwrap_err();
        assert!(matches!(err, error::SystemError::NotFound(_)));
    }

    #[actix_web::test]
    async fn mutual_request_auto_accepts() {
        let svc = service(&[1, 2]);

        assert!(matches!(
            svc.send_request(1, 2).await.unwrap(),
            SendRequestOutcome::Created(_)
        ));

        let edge = match svc.send_request(2, 1).await.unwrap() {
            SendRequestOutcome::AutoAccepted(edge) => edge,
            other => panic!("expected auto-accept, got {:?}", other),
        };
        // The edge belongs to the caller's direction.
        assert_eq!((edge.owner_id, edge.peer_id), (2, 1));

        assert!(svc.is_friend(1, 2).await.unwrap());
        assert!(svc.is_friend(2, 1).await.unwrap());
        assert!(svc.pending_requests(1).await.unwrap().is_empty());
        assert!(svc.pending_requests(2).await.unwrap().is_empty());

        let err = svc.send_request(1, 2).await.unwrap_err();
        assert!(matches!(err, error::SystemError::AlreadyFriends));
    }

    #[actix_web::test]
    async fn send_request_rejects_self_and_unknown_users() {
        let svc = service(&[1, 2]);

        let err = svc.send_request(1, 1).await.unwrap_err();
        assert!(matches!(err, error::SystemError::InvalidOperation(_)));

        let err = svc.send_request(1, 99).await.unwrap_err();
        assert!(matches!(err, error::SystemError::NotFound(_)));

        let err = svc.send_request(99, 1).await.unwrap_err();
        assert!(matches!(err, error::SystemError::NotFound(_)));
    }

    #[actix_web::test]
    async fn duplicate_pending_request_is_rejected() {
        let svc = service(&[1, 2]);

        assert!(matches!(
            svc.send_request(1, 2).await.unwrap(),
            SendRequestOutcome::Created(_)
        ));
        let err = svc.send_request(1, 2).await.unwrap_err();
        assert!(matches!(err, error::SystemError::DuplicateRequest));
    }

    #[actix_web::test]
    async fn only_the_receiver_may_resolve_a_request() {
        let svc = service(&[1, 2, 3]);

        let request = match svc.send_request(1, 2).await.unwrap() {
            SendRequestOutcome::Created(request) => request,
            other => panic!("expected a new pending request, got {:?}", other),
        };

        let err = svc.accept_request(request.id, 1).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Forbidden(_)));

        let err = svc.reject_request(request.id, 3).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Forbidden(_)));

        let err = svc.accept_request(999, 2).await.unwrap_err();
        assert!(matches!(err, error::SystemError::NotFound(_)));
    }

    #[actix_web::test]
    async fn rejecting_twice_reports_not_found() {
        let svc = service(&[1, 2]);

        let request = match svc.send_request(1, 2).await.unwrap() {
            SendRequestOutcome::Created(request) => request,
            other => panic!("expected a new pending request, got {:?}", other),
        };

        svc.reject_request(request.id, 2).await.unwrap();

        // The record is deleted on resolution, so the second call cannot
        // even see a resolved request.
        let err = svc.reject_request(request.id, 2).await.unwrap_err();
        assert!(matches!(err, error::SystemError::NotFound(_)));

        assert!(!svc.is_friend(1, 2).await.unwrap());
    }

    #[actix_web::test]
    async fn remove_friendship_deletes_both_directions() {
        let svc = service(&[1, 2]);
        befriend(&svc, 1, 2).await;

        svc.remove_friendship(1, 2).await.unwrap();
        assert!(!svc.is_friend(1, 2).await.unwrap());
        assert!(!svc.is_friend(2, 1).await.unwrap());

        let err = svc.remove_friendship(1, 2).await.unwrap_err();
        assert!(matches!(err, error::SystemError::NotFriends));

        let err = svc.remove_friendship(1, 1).await.unwrap_err();
        assert!(matches!(err, error::SystemError::InvalidOperation(_)));
    }

    #[actix_web::test]
    async fn remark_is_directional_and_blank_clears() {
        let svc = service(&[1, 2]);
        befriend(&svc, 1, 2).await;

        svc.set_remark(1, 2, Some("bestie".to_string())).await.unwrap();

        let friends_of_1 = svc.get_friends(1).await.unwrap();
        assert_eq!(friends_of_1.len(), 1);
        assert_eq!(friends_of_1[0].remark.as_deref(), Some("bestie"));

        // The mirror edge keeps its own annotation.
        let friends_of_2 = svc.get_friends(2).await.unwrap();
        assert_eq!(friends_of_2.len(), 1);
        assert_eq!(friends_of_2[0].remark, None);

        svc.set_remark(1, 2, Some("   ".to_string())).await.unwrap();
        let friends_of_1 = svc.get_friends(1).await.unwrap();
        assert_eq!(friends_of_1[0].remark, None);

        let err = svc.set_remark(1, 3, Some("x".to_string())).await.unwrap_err();
        assert!(matches!(err, error::SystemError::NotFriends));
    }

    #[actix_web::test]
    async fn friend_count_follows_edges() {
        let svc = service(&[1, 2, 3]);
        befriend(&svc, 1, 2).await;
        befriend(&svc, 1, 3).await;

        assert_eq!(svc.friend_count(1).await.unwrap(), 2);
        assert_eq!(svc.friend_count(2).await.unwrap(), 1);
        assert_eq!(svc.friend_count(3).await.unwrap(), 1);

        svc.remove_friendship(2, 1).await.unwrap();
        assert_eq!(svc.friend_count(1).await.unwrap(), 1);
    }
}
