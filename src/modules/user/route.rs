use crate::modules::user::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn public_api_configure(cfg: &mut ServiceConfig) {
    cfg.service(scope("/auth").service(sign_up).service(sign_in).service(refresh_token));
}

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(scope("/users").service(get_profile).service(get_user));
}
