use actix_web::{
    cookie::{time, Cookie},
    get, post, web, HttpRequest,
};

use crate::modules::user::model::SignUpResponse;
use crate::modules::user::{model, service::UserService};
use crate::{
    api::{error, success},
    utils::ValidatedJson,
};
use crate::{middlewares::get_claims, ENV};

#[get("/profile")]
pub async fn get_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let id = get_claims(&req)?.sub;
    let user = user_service.get_by_id(id).await?;
    Ok(success::Success::ok(Some(user)).message("Profile retrieved successfully"))
}

#[get("/{id:\\d+}")]
pub async fn get_user(
    user_service: web::Data<UserService>,
    user_id: web::Path<i64>,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let user = user_service.get_by_id(user_id.into_inner()).await?;
    Ok(success::Success::ok(Some(user)).message("User retrieved successfully"))
}

#[post("/signup")]
pub async fn sign_up(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::SignUpModel>,
) -> Result<success::Success<SignUpResponse>, error::Error> {
    let user_id = user_service.sign_up(user_data.0).await?;
    Ok(success::Success::created(Some(SignUpResponse { id: user_id })).message("Signup successful"))
}

#[post("/signin")]
pub async fn sign_in(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::SignInModel>,
) -> Result<success::Success<model::SignInResponse>, error::Error> {
    let (access_token, refresh_token_value) = user_service.sign_in(user_data.0).await?;
    let response = model::SignInResponse { access_token };
    let refresh_cookie = Cookie::build("refresh_token", refresh_token_value)
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(ENV.refresh_token_expiration as i64))
        .finish();

    Ok(success::Success::ok(Some(response))
        .message("Signin successful")
        .cookies(vec![refresh_cookie]))
}

#[post("/refresh")]
pub async fn refresh_token(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<model::SignInResponse>, error::Error> {
    let cookie = req
        .cookie("refresh_token")
        .ok_or_else(|| error::Error::unauthorized("Token Invalid or Expired"))?;

    let access_token = user_service.refresh_access_token(cookie.value()).await?;
    Ok(success::Success::ok(Some(model::SignInResponse { access_token }))
        .message("Token refreshed successfully"))
}
