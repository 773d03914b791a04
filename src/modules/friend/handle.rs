use actix_web::{delete, get, post, put, web, HttpRequest};

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        friend::{
            model::{
                FriendCountResponse, FriendView, PendingRequestView, RemarkBody, SendRequestBody,
                SendRequestOutcome,
            },
            repository_pg::FriendRepositoryPg,
            schema::FriendEdgeEntity,
            service::FriendService,
        },
        user::repository_pg::UserRepositoryPg,
    },
    utils::ValidatedJson,
};

pub type FriendSvc = FriendService<FriendRepositoryPg, UserRepositoryPg>;

#[post("/requests")]
pub async fn send_friend_request(
    friend_service: web::Data<FriendSvc>,
    body: ValidatedJson<SendRequestBody>,
    req: HttpRequest,
) -> Result<success::Success<SendRequestOutcome>, error::Error> {
    let requester_id = get_claims(&req)?.sub;
    let outcome = friend_service.send_request(requester_id, body.0.receiver_id).await?;

    Ok(match outcome {
        SendRequestOutcome::Created(_) => success::Success::created(Some(outcome))
            .message("Friend request sent successfully"),
        SendRequestOutcome::AutoAccepted(_) => success::Success::ok(Some(outcome))
            .message("Mutual request resolved, you are now friends"),
    })
}

#[post("/requests/{request_id:\\d+}/accept")]
pub async fn accept_friend_request(
    friend_service: web::Data<FriendSvc>,
    request_id: web::Path<i64>,
    req: HttpRequest,
) -> Result<success::Success<FriendEdgeEntity>, error::Error> {
    let receiver_id = get_claims(&req)?.sub;
    let edge = friend_service.accept_request(*request_id, receiver_id).await?;

    Ok(success::Success::ok(Some(edge)).message("Friend request accepted successfully"))
}

#[post("/requests/{request_id:\\d+}/decline")]
pub async fn decline_friend_request(
    friend_service: web::Data<FriendSvc>,
    request_id: web::Path<i64>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let receiver_id = get_claims(&req)?.sub;
    friend_service.reject_request(*request_id, receiver_id).await?;
    Ok(success::Success::no_content())
}

#[get("/")]
pub async fn list_friends(
    friend_service: web::Data<FriendSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<FriendView>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let friends = friend_service.get_friends(user_id).await?;

    Ok(success::Success::ok(Some(friends)).message("Friends retrieved successfully"))
}

#[get("/requests")]
pub async fn list_friend_requests(
    friend_service: web::Data<FriendSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<PendingRequestView>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let requests = friend_service.pending_requests(user_id).await?;

    Ok(success::Success::ok(Some(requests)).message("Friend requests retrieved successfully"))
}

#[get("/count")]
pub async fn friend_count(
    friend_service: web::Data<FriendSvc>,
    req: HttpRequest,
) -> Result<success::Success<FriendCountResponse>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let count = friend_service.friend_count(user_id).await?;

    Ok(success::Success::ok(Some(FriendCountResponse { count })))
}

#[get("/{friend_id:\\d+}/status")]
pub async fn friendship_status(
    friend_service: web::Data<FriendSvc>,
    friend_id: web::Path<i64>,
    req: HttpRequest,
) -> Result<success::Success<bool>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let is_friend = friend_service.is_friend(user_id, *friend_id).await?;

    Ok(success::Success::ok(Some(is_friend)))
}

#[put("/{friend_id:\\d+}/remark")]
pub async fn set_friend_remark(
    friend_service: web::Data<FriendSvc>,
    friend_id: web::Path<i64>,
    body: ValidatedJson<RemarkBody>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    friend_service.set_remark(user_id, *friend_id, body.0.remark).await?;
    Ok(success::Success::ok(None).message("Remark updated successfully"))
}

#[delete("/{friend_id:\\d+}")]
pub async fn remove_friend(
    friend_service: web::Data<FriendSvc>,
    friend_id: web::Path<i64>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    friend_service.remove_friendship(user_id, *friend_id).await?;
    Ok(success::Success::no_content())
}
