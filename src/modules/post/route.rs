use crate::modules::post::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/posts")
            .service(create_post)
            .service(get_feed)
            .service(list_own_posts)
            .service(like_post)
            .service(unlike_post),
    );
}
