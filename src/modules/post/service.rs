use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    api::error,
    modules::{
        friend::repository::FriendEdgeRepository,
        post::{
            model::{FeedItem, InsertPost, PageResponse},
            repository::PostRepo,
            schema::PostEntity,
        },
    },
};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Clone)]
pub struct PostService<P, F>
where
    P: PostRepo + Send + Sync,
    F: FriendEdgeRepository + Send + Sync,
{
    post_repo: Arc<P>,
    friend_repo: Arc<F>,
}

impl<P, F> PostService<P, F>
where
    P: PostRepo + Send + Sync,
    F: FriendEdgeRepository + Send + Sync,
{
    pub fn with_dependencies(post_repo: Arc<P>, friend_repo: Arc<F>) -> Self {
        PostService { post_repo, friend_repo }
    }

    pub async fn create_post(
        &self,
        author_id: i64,
        content: String,
    ) -> Result<PostEntity, error::SystemError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(error::SystemError::bad_request("Post content cannot be empty"));
        }

        self.post_repo.create(&InsertPost { author_id, content: content.to_owned() }).await
    }

    pub async fn posts_of(&self, author_id: i64) -> Result<Vec<PostEntity>, error::SystemError> {
        self.post_repo.find_by_author(author_id).await
    }

    /// The feed is the merge of two disjoint partitions: posts by friends
    /// and the user themselves, then everyone else's. All priority posts
    /// sort ahead of all other posts; within each partition the order is
    /// `created_at DESC, id DESC`. The requested page is sliced out of that
    /// merged ordering without materializing it: the priority partition
    /// serves `[offset, offset+size)` as far as it reaches, the other
    /// partition serves the rest with its offset shifted by the priority
    /// total.
    pub async fn get_feed(
        &self,
        user_id: i64,
        page: Option<i64>,
        size: Option<i64>,
    ) -> Result<PageResponse<FeedItem>, error::SystemError> {
        let page = page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE);
        let size = size.filter(|s| *s > 0).unwrap_or(DEFAULT_PAGE_SIZE);

        let mut authors = self.friend_repo.friend_ids(user_id).await?;
        if !authors.contains(&user_id) {
            authors.push(user_id);
        }

        let (priority_total, other_total) = tokio::try_join!(
            self.post_repo.count_by_authors(&authors),
            self.post_repo.count_excluding_authors(&authors),
        )?;
        let total = priority_total + other_total;

        let offset = (page - 1) * size;
        let mut posts: Vec<PostEntity>;
        if offset < priority_total {
            let take = size.min(priority_total - offset);
            posts = self.post_repo.find_by_authors(&authors, offset, take).await?;

            let remainder = size - posts.len() as i64;
            if remainder > 0 {
                posts.extend(
                    self.post_repo.find_excluding_authors(&authors, 0, remainder).await?,
                );
            }
        } else {
            posts = self
                .post_repo
                .find_excluding_authors(&authors, offset - priority_total, size)
                .await?;
        }

        let post_ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        let liked = if post_ids.is_empty() {
            HashSet::new()
        } else {
            self.post_repo.liked_post_ids(&post_ids, user_id).await?
        };

        let items = posts
            .into_iter()
            .map(|post| FeedItem { liked: liked.contains(&post.id), post })
            .collect();

        Ok(PageResponse::new(items, page, size, total))
    }

    pub async fn like_post(
        &self,
        post_id: i64,
        user_id: i64,
    ) -> Result<PostEntity, error::SystemError> {
        self.post_repo
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Post not found"))?;

        if !self.post_repo.like_atomic(post_id, user_id).await? {
            return Err(error::SystemError::AlreadyLiked);
        }

        self.post_repo
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Post not found"))
    }

    pub async fn unlike_post(
        &self,
        post_id: i64,
        user_id: i64,
    ) -> Result<PostEntity, error::SystemError> {
        self.post_repo
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Post not found"))?;

        if !self.post_repo.unlike_atomic(post_id, user_id).await? {
            return Err(error::SystemError::NotLiked);
        }

        self.post_repo
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Post not found"))
    }
}
