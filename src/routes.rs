//! Route configuration for the authenticated /v1 scope.

use actix_web::web;

use crate::handlers;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/stocks", web::get().to(handlers::search_stocks))
        .route("/stocks", web::put().to(handlers::rank_all_stocks))
        .route(
            "/stocks/suggestions",
            web::get().to(handlers::suggest_stocks),
        )
        .route("/stocks/{symbol}", web::put().to(handlers::rank_stock));
}
