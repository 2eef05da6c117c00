use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::{web, ResponseError};
use actix_web_lab::middleware::{from_fn, Next};

use crate::api::errors::ApiError;
use crate::api::handlers::{self, AppState};
use crate::api::sse;

const API_KEY_HEADER: &str = "X-API-Key";

/// When an API key is configured, every versioned route requires it in the
/// `X-API-Key` header. Provider webhooks are never behind the key: the
/// provider cannot present one.
async fn require_api_key(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, actix_web::Error> {
    let expected = req
        .app_data::<web::Data<AppState>>()
        .and_then(|state| state.settings.api_key.clone());

    if let Some(expected) = expected {
        let presented = req
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok());
        if presented != Some(expected.as_str()) {
            return Ok(req.into_response(ApiError::Unauthorized.error_response()));
        }
    }

    next.call(req).await.map(ServiceResponse::map_into_boxed_body)
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .wrap(from_fn(require_api_key))
            .service(handlers::fetch_emails)
            .service(handlers::send_email)
            .service(handlers::list_sms)
            .service(handlers::send_sms)
            .service(sse::sms_events)
            .service(handlers::mark_sms_seen)
            .service(handlers::create_call)
            .service(handlers::voice_token),
    );

    cfg.service(
        web::scope("/webhooks")
            .service(handlers::receive_sms)
            .service(handlers::voice_inbound),
    );
}
