use actix_web::{get, guard, post, web, HttpResponse, Responder, ResponseError};
use serde::Serialize;
use validator::Validate;

use crate::cors;
use crate::error::ServiceError;
use crate::models::BusinessProfilesQuery;
use crate::service::QueryService;

fn respond<T: Serialize>(action: &str, result: Result<T, ServiceError>) -> HttpResponse {
    match result {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(err) => {
            if err.status_code().is_server_error() {
                log::error!("Failed to {action}: {err:?}");
            } else {
                log::warn!("Failed to {action}: {err}");
            }
            err.error_response()
        }
    }
}

fn require_id(name: &str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{name} must not be blank")));
    }
    Ok(())
}

/// Malformed JSON bodies get the same error envelope as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ServiceError::Validation(err.to_string()).into())
}

/// Register every route. The pre-flight resource goes first so OPTIONS never
/// lands on a method-guarded resource.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(
            web::resource("/{tail:.*}")
                .guard(guard::Options())
                .to(cors::preflight),
        )
        .service(hello)
        .service(health_check)
        .service(fetch_business_profile)
        .service(fetch_business_profiles)
        .service(fetch_liked_business_profiles)
        .service(fetch_review)
        .service(fetch_business_reviews)
        .service(fetch_user_reviews);
}

// ============================================================================
// HEALTH
// ============================================================================

#[get("/")]
pub async fn hello() -> impl Responder {
    "hello"
}

#[get("/health")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "business-profile-service",
        "timestamp": chrono::Utc::now()
    }))
}

// ============================================================================
// BUSINESS PROFILES
// ============================================================================

#[get("/fetchBusinessProfile/{business_id}/{user_id}")]
pub async fn fetch_business_profile(
    service: web::Data<QueryService>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (business_id, user_id) = path.into_inner();
    let result = match require_id("businessId", &business_id)
        .and_then(|()| require_id("userId", &user_id))
    {
        Ok(()) => service.get_business_profile(&business_id, &user_id).await,
        Err(err) => Err(err),
    };

    respond("fetch business profile", result)
}

#[post("/fetchBusinessProfiles")]
pub async fn fetch_business_profiles(
    service: web::Data<QueryService>,
    payload: web::Json<BusinessProfilesQuery>,
) -> impl Responder {
    let body = payload.into_inner();
    if let Err(e) = body.validate() {
        return respond::<()>("fetch business profiles", Err(e.into()));
    }

    let result = service
        .list_business_profiles(
            &body.user_id,
            body.tags.as_deref(),
            body.business_states.as_deref(),
        )
        .await;
    respond("fetch business profiles", result)
}

#[post("/fetchLikedBusinessProfiles")]
pub async fn fetch_liked_business_profiles(
    service: web::Data<QueryService>,
    payload: web::Json<BusinessProfilesQuery>,
) -> impl Responder {
    let body = payload.into_inner();
    if let Err(e) = body.validate() {
        return respond::<()>("fetch liked business profiles", Err(e.into()));
    }

    let result = service
        .list_liked_business_profiles(
            &body.user_id,
            body.tags.as_deref(),
            body.business_states.as_deref(),
        )
        .await;
    respond("fetch liked business profiles", result)
}

// ============================================================================
// REVIEWS
// ============================================================================

#[get("/fetchReview/{business_id}/{user_id}")]
pub async fn fetch_review(
    service: web::Data<QueryService>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (business_id, user_id) = path.into_inner();
    let result = match require_id("businessId", &business_id)
        .and_then(|()| require_id("userId", &user_id))
    {
        Ok(()) => service.get_review(&business_id, &user_id).await,
        Err(err) => Err(err),
    };

    respond("fetch review", result)
}

#[get("/fetchBusinessReviews/{business_id}")]
pub async fn fetch_business_reviews(
    service: web::Data<QueryService>,
    business_id: web::Path<String>,
) -> impl Responder {
    let business_id = business_id.into_inner();
    let result = match require_id("businessId", &business_id) {
        Ok(()) => service.list_business_reviews(&business_id).await,
        Err(err) => Err(err),
    };

    respond("fetch business reviews", result)
}

#[get("/fetchUserReviews/{user_id}")]
pub async fn fetch_user_reviews(
    service: web::Data<QueryService>,
    user_id: web::Path<String>,
) -> impl Responder {
    let user_id = user_id.into_inner();
    let result = match require_id("userId", &user_id) {
        Ok(()) => service.list_user_reviews(&user_id).await,
        Err(err) => Err(err),
    };

    respond("fetch user reviews", result)
}
