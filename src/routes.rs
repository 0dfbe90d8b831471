use actix_web::web;

use crate::handlers;

/// 统一注册 HTTP 路由，方便集中管理
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::hello)
        .service(handlers::start_flood)
        .service(handlers::get_flood_chunk)
        .service(handlers::start_growth)
        .service(handlers::advance_growth)
        .service(handlers::auto_growth)
        .service(handlers::stop_growth)
        .service(handlers::get_growth_mask)
        .service(handlers::get_performance);
}
