use actix_web::{get, post, web, HttpRequest};

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        friend::repository_pg::FriendRepositoryPg,
        post::{
            model::{CreatePostBody, FeedItem, FeedQuery, PageResponse},
            repository_pg::PostRepositoryPg,
            schema::PostEntity,
            service::PostService,
        },
    },
    utils::ValidatedJson,
};

pub type PostSvc = PostService<PostRepositoryPg, FriendRepositoryPg>;

#[post("/")]
pub async fn create_post(
    post_service: web::Data<PostSvc>,
    body: ValidatedJson<CreatePostBody>,
    req: HttpRequest,
) -> Result<success::Success<PostEntity>, error::Error> {
    let author_id = get_claims(&req)?.sub;
    let post = post_service.create_post(author_id, body.0.content).await?;

    Ok(success::Success::created(Some(post)).message("Post created successfully"))
}

#[get("/feed")]
pub async fn get_feed(
    post_service: web::Data<PostSvc>,
    query: web::Query<FeedQuery>,
    req: HttpRequest,
) -> Result<success::Success<PageResponse<FeedItem>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let feed = post_service.get_feed(user_id, query.page, query.size).await?;

    Ok(success::Success::ok(Some(feed)).message("Feed retrieved successfully"))
}

#[get("/mine")]
pub async fn list_own_posts(
    post_service: web::Data<PostSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<PostEntity>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let posts = post_service.posts_of(user_id).await?;

    Ok(success::Success::ok(Some(posts)).message("Posts retrieved successfully"))
}

#[post("/{post_id:\\d+}/like")]
pub async fn like_post(
    post_service: web::Data<PostSvc>,
    post_id: web::Path<i64>,
    req: HttpRequest,
) -> Result<success::Success<PostEntity>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let post = post_service.like_post(*post_id, user_id).await?;

    Ok(success::Success::ok(Some(post)).message("Post liked successfully"))
}

#[post("/{post_id:\\d+}/unlike")]
pub async fn unlike_post(
    post_service: web::Data<PostSvc>,
    post_id: web::Path<i64>,
    req: HttpRequest,
) -> Result<success::Success<PostEntity>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let post = post_service.unlike_post(*post_id, user_id).await?;

    Ok(success::Success::ok(Some(post)).message("Post unliked successfully"))
}
