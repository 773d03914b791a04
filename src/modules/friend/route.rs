use crate::modules::friend::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/friends")
            .service(send_friend_request)
            .service(accept_friend_request)
            .service(decline_friend_request)
            .service(list_friends)
            .service(list_friend_requests)
            .service(friend_count)
            .service(friendship_status)
            .service(set_friend_remark)
            .service(remove_friend),
    );
}
