/// HTTP endpoints for stock search, suggestions, and ranking refresh.
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware::jwt_auth::UserId;
use crate::services::StockService;

const DEFAULT_SEARCH_LIMIT: i64 = 10;
const DEFAULT_SUGGESTION_LIMIT: i64 = 5;

/// Query parameters for GET /v1/stocks
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,

    /// Max results (default: 10)
    pub limit: Option<i64>,
}

/// Query parameters for GET /v1/stocks/suggestions
#[derive(Debug, Deserialize)]
pub struct SuggestionQuery {
    /// Comma-separated symbols to leave out (default: none)
    pub exclude: Option<String>,

    /// Max results (default: 5)
    pub limit: Option<i64>,
}

/// GET /v1/stocks?query=&limit=
///
/// Any authenticated caller. Returns `[{name, symbol}]` ordered by mention
/// count; an empty array when nothing matches.
pub async fn search_stocks(
    query: web::Query<SearchQuery>,
    service: web::Data<StockService>,
) -> Result<HttpResponse> {
    let limit = validate_limit(query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT))?;
    let results = service.search(&query.query, limit).await?;

    Ok(HttpResponse::Ok().json(results))
}

/// GET /v1/stocks/suggestions?exclude=&limit=
///
/// Any authenticated caller. Most mentioned active stocks, minus the
/// caller's excluded symbols.
pub async fn suggest_stocks(
    query: web::Query<SuggestionQuery>,
    service: web::Data<StockService>,
) -> Result<HttpResponse> {
    let limit = validate_limit(query.limit.unwrap_or(DEFAULT_SUGGESTION_LIMIT))?;
    let excluded = parse_exclude(query.exclude.as_deref());
    let results = service.suggestions(&excluded, limit).await?;

    Ok(HttpResponse::Ok().json(results))
}

/// PUT /v1/stocks
///
/// Admin only. Refreshes the mention count of every mentioned symbol.
pub async fn rank_all_stocks(
    req: HttpRequest,
    service: web::Data<StockService>,
    config: web::Data<Config>,
) -> Result<HttpResponse> {
    let admin = require_admin(&req, &config)?;
    info!(%admin, "full stock ranking refresh requested");

    service.rank_stocks().await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}

/// PUT /v1/stocks/{symbol}
///
/// Admin only. Refreshes the mention count of a single symbol; 404 when the
/// symbol has no recorded mentions.
pub async fn rank_stock(
    req: HttpRequest,
    symbol: web::Path<String>,
    service: web::Data<StockService>,
    config: web::Data<Config>,
) -> Result<HttpResponse> {
    require_admin(&req, &config)?;

    service.rank_stock(&symbol).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}

/// The ranking endpoints are restricted to the configured admin identity.
/// The caller's identity comes from the JWT middleware; role resolution
/// beyond this one comparison lives outside the service.
fn require_admin(req: &HttpRequest, config: &Config) -> Result<Uuid> {
    let user_id = req
        .extensions()
        .get::<UserId>()
        .map(|id| id.0)
        .ok_or_else(|| AppError::Authentication("user ID missing from request".to_string()))?;

    if user_id != config.auth.admin_user_id {
        return Err(AppError::Authorization(
            "admin privileges required".to_string(),
        ));
    }

    Ok(user_id)
}

fn validate_limit(limit: i64) -> Result<i64> {
    if limit < 1 {
        return Err(AppError::Validation(format!(
            "limit must be a positive integer, got {limit}"
        )));
    }

    Ok(limit)
}

fn parse_exclude(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
