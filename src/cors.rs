use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{self, HeaderValue};
use actix_web::middleware::Next;
use actix_web::{web, Error, HttpResponse};

const PREFLIGHT_ALLOW_METHODS: &str = "GET,OPTIONS,PATCH,DELETE,POST,PUT";
const PREFLIGHT_ALLOW_HEADERS: &str = "X-API-KEY, X-CSRF-Token, X-Requested-With, Accept, \
Accept-Version, Content-Length, Content-MD5, Content-Type, Date, X-Api-Version, environment-flag";

/// Origins whose `Origin` header is echoed back on regular responses.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
}

impl CorsPolicy {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    pub fn allows(&self, origin: &HeaderValue) -> bool {
        origin
            .to_str()
            .map(|origin| self.allowed_origins.iter().any(|allowed| allowed == origin))
            .unwrap_or(false)
    }
}

/// Echo an allowlisted `Origin` as `Access-Control-Allow-Origin`.
///
/// Responses that already carry the header (the pre-flight) are left alone.
pub async fn allowlisted_origin(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .filter(|origin| {
            req.app_data::<web::Data<CorsPolicy>>()
                .is_some_and(|policy| policy.allows(origin))
        })
        .cloned();

    let mut res = next.call(req).await?;

    if let Some(origin) = origin {
        let headers = res.headers_mut();
        if !headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        }
    }

    Ok(res)
}

/// Pre-flight answer for any path. Always wildcard, whatever the `Origin`.
pub async fn preflight() -> HttpResponse {
    HttpResponse::NoContent()
        .insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, PREFLIGHT_ALLOW_METHODS))
        .insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, PREFLIGHT_ALLOW_HEADERS))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_matches_exact_origins_only() {
        let policy = CorsPolicy::new(vec!["http://localhost:3000".into()]);

        assert!(policy.allows(&HeaderValue::from_static("http://localhost:3000")));
        assert!(!policy.allows(&HeaderValue::from_static("http://localhost:3000/")));
        assert!(!policy.allows(&HeaderValue::from_static("http://evil.com")));
    }
}
