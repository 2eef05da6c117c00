//! HTTP handlers for the versioned API and the provider webhooks.

use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse};
use futures_util::TryStreamExt;
use log::info;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::api::errors::ApiError;
use crate::config::Settings;
use crate::mail::{EmailSender, MailFetcher, OutgoingAttachment, OutgoingEmail};
use crate::store::RecordStore;
use crate::telephony::{token::capability_token, TelephonyApi, VoiceResponse};

/// How many of the newest mailbox entries a fetch returns.
pub const RECENT_WINDOW: u32 = 5;

/// Shared application state: configuration plus the injected provider
/// clients, all behind trait objects so tests can swap in fakes.
pub struct AppState {
    pub settings: Arc<Settings>,
    pub fetcher: Arc<dyn MailFetcher>,
    pub sender: Arc<dyn EmailSender>,
    pub telephony: Arc<dyn TelephonyApi>,
    pub store: Arc<dyn RecordStore>,
}

#[get("/emails")]
pub async fn fetch_emails(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let messages = state.fetcher.fetch_recent(RECENT_WINDOW).await?;
    Ok(HttpResponse::Ok().json(messages))
}

#[post("/emails/send")]
pub async fn send_email(
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let mut to = String::new();
    let mut subject = String::new();
    let mut text = String::new();
    let mut attachments = Vec::new();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|_| ApiError::BadRequest("Malformed multipart payload".to_string()))?
    {
        let name = field.name().to_string();
        let filename = field
            .content_disposition()
            .get_filename()
            .map(str::to_string);
        let content_type = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|_| ApiError::BadRequest("Malformed multipart payload".to_string()))?
        {
            data.extend_from_slice(&chunk);
        }

        match (name.as_str(), filename) {
            ("to", _) => to = String::from_utf8_lossy(&data).into_owned(),
            ("subject", _) => subject = String::from_utf8_lossy(&data).into_owned(),
            ("text", _) => text = String::from_utf8_lossy(&data).into_owned(),
            (_, Some(filename)) => attachments.push(OutgoingAttachment {
                filename,
                content_type,
                content: data,
            }),
            _ => {}
        }
    }

    if to.is_empty() {
        return Err(ApiError::BadRequest("Missing To".to_string()));
    }

    state
        .sender
        .send(OutgoingEmail {
            to,
            subject,
            text,
            attachments,
        })
        .await?;
    Ok(HttpResponse::Ok().json(json!({"message": "Email sent successfully"})))
}

#[get("/sms")]
pub async fn list_sms(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let records: Vec<_> = state
        .store
        .list()
        .await?
        .into_iter()
        .map(|r| r.sanitized())
        .collect();
    Ok(HttpResponse::Ok().json(json!({"messages": records})))
}

#[derive(Debug, Deserialize)]
pub struct SendSmsRequest {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub body: String,
}

#[post("/sms/send")]
pub async fn send_sms(
    state: web::Data<AppState>,
    request: web::Json<SendSmsRequest>,
) -> Result<HttpResponse, ApiError> {
    if request.to.is_empty() {
        return Err(ApiError::BadRequest("Missing To".to_string()));
    }
    if request.body.is_empty() {
        return Err(ApiError::BadRequest("Missing Body".to_string()));
    }

    let sid = state.telephony.send_sms(&request.to, &request.body).await?;
    Ok(HttpResponse::Ok().json(json!({"sid": sid})))
}

#[post("/sms/{key}/seen")]
pub async fn mark_sms_seen(
    state: web::Data<AppState>,
    key: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let record = state.store.mark_seen(key.into_inner()).await?;
    Ok(HttpResponse::Ok().json(record))
}

#[derive(Debug, Deserialize)]
pub struct CreateCallRequest {
    #[serde(default)]
    pub to: String,
}

#[post("/calls")]
pub async fn create_call(
    state: web::Data<AppState>,
    request: web::Json<CreateCallRequest>,
) -> Result<HttpResponse, ApiError> {
    if request.to.is_empty() {
        return Err(ApiError::BadRequest("Missing To".to_string()));
    }

    let sid = state.telephony.create_call(&request.to).await?;
    Ok(HttpResponse::Ok().json(json!({"sid": sid})))
}

#[get("/token")]
pub async fn voice_token(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let token = capability_token(&state.settings.telephony)?;
    Ok(HttpResponse::Ok().json(json!({"token": token})))
}

/// Inbound SMS webhook payload, in the provider's form encoding.
#[derive(Debug, Deserialize)]
pub struct InboundSmsForm {
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "Body")]
    pub body: Option<String>,
}

#[post("/sms")]
pub async fn receive_sms(
    state: web::Data<AppState>,
    form: web::Form<InboundSmsForm>,
) -> Result<HttpResponse, ApiError> {
    let form = form.into_inner();
    let (from, body) = match (form.from, form.body) {
        (Some(from), Some(body)) => (from, body),
        _ => return Err(ApiError::BadRequest("Missing From or Body".to_string())),
    };

    let record = state.store.insert(from, body).await?;
    info!("Stored inbound SMS under key {}", record.key);
    Ok(HttpResponse::Ok().json(json!({"message": "Message received"})))
}

#[post("/voice")]
pub async fn voice_inbound(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let twiml = VoiceResponse::dial_client(&state.settings.telephony.client_name).to_xml()?;
    Ok(HttpResponse::Ok().content_type("text/xml").body(twiml))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::routes::configure_routes;
    use crate::mail::imap::MockMailFetcher;
    use crate::mail::smtp::MockEmailSender;
    use crate::models::Message;
    use crate::store::MemoryStore;
    use crate::telephony::rest::MockTelephonyApi;
    use actix_web::{test, App};
    use chrono::{TimeZone, Utc};

    fn settings() -> Settings {
        let mut settings = Settings::new(None).unwrap();
        settings.telephony.account_sid = "AC123".to_string();
        settings.telephony.auth_token = "supersecret".to_string();
        settings.telephony.phone_number = "+15550009999".to_string();
        settings.telephony.twiml_app_sid = "AP456".to_string();
        settings
    }

    struct StateParts {
        settings: Settings,
        fetcher: MockMailFetcher,
        sender: MockEmailSender,
        telephony: MockTelephonyApi,
    }

    impl Default for StateParts {
        fn default() -> Self {
            Self {
                settings: settings(),
                fetcher: MockMailFetcher::new(),
                sender: MockEmailSender::new(),
                telephony: MockTelephonyApi::new(),
            }
        }
    }

    fn app_state(parts: StateParts) -> web::Data<AppState> {
        web::Data::new(AppState {
            settings: Arc::new(parts.settings),
            fetcher: Arc::new(parts.fetcher),
            sender: Arc::new(parts.sender),
            telephony: Arc::new(parts.telephony),
            store: Arc::new(MemoryStore::new()),
        })
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data($state.clone())
                    .configure(configure_routes),
            )
            .await
        };
    }

    fn message(id: &str) -> Message {
        Message {
            id: id.to_string(),
            from: "alice@example.com".to_string(),
            subject: Some("Hi".to_string()),
            body: "<p>Hi</p>".to_string(),
            snippet: "Hi".to_string(),
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            seen: false,
            flags: vec![],
            attachments: vec![],
        }
    }

    #[actix_web::test]
    async fn emails_endpoint_returns_fetched_window() {
        let mut parts = StateParts::default();
        parts
            .fetcher
            .expect_fetch_recent()
            .withf(|limit| *limit == RECENT_WINDOW)
            .returning(|_| Ok(vec![message("42")]));
        let app = app!(app_state(parts));

        let req = test::TestRequest::get().uri("/api/v1/emails").to_request();
        let body: Vec<Message> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].id, "42");
    }

    #[actix_web::test]
    async fn emails_endpoint_hides_provider_failure_details() {
        let mut parts = StateParts::default();
        parts
            .fetcher
            .expect_fetch_recent()
            .returning(|_| Err(crate::mail::MailError::Connection("refused".to_string())));
        let app = app!(app_state(parts));

        let req = test::TestRequest::get().uri("/api/v1/emails").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 500);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Mail operation failed");
    }

    fn multipart_request(uri: &str, body: &'static str) -> actix_web::test::TestRequest {
        test::TestRequest::post()
            .uri(uri)
            .insert_header((
                "content-type",
                "multipart/form-data; boundary=BOUNDARY",
            ))
            .set_payload(body)
    }

    #[actix_web::test]
    async fn send_email_accepts_multipart_with_attachment() {
        let mut parts = StateParts::default();
        parts
            .sender
            .expect_send()
            .withf(|email| {
                email.to == "bob@example.com"
                    && email.subject == "Hello"
                    && email.text == "Body text"
                    && email.attachments.len() == 1
                    && email.attachments[0].filename == "notes.txt"
                    && email.attachments[0].content == b"hello"
            })
            .returning(|_| Ok(()));
        let app = app!(app_state(parts));

        let body = concat!(
            "--BOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"to\"\r\n\r\n",
            "bob@example.com\r\n",
            "--BOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"subject\"\r\n\r\n",
            "Hello\r\n",
            "--BOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"text\"\r\n\r\n",
            "Body text\r\n",
            "--BOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"attachments\"; filename=\"notes.txt\"\r\n",
            "Content-Type: text/plain\r\n\r\n",
            "hello\r\n",
            "--BOUNDARY--\r\n",
        );
        let req = multipart_request("/api/v1/emails/send", body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }

    #[actix_web::test]
    async fn send_email_without_recipient_is_rejected() {
        let mut parts = StateParts::default();
        parts.sender.expect_send().times(0);
        let app = app!(app_state(parts));

        let body = concat!(
            "--BOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"subject\"\r\n\r\n",
            "Hello\r\n",
            "--BOUNDARY--\r\n",
        );
        let req = multipart_request("/api/v1/emails/send", body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn send_sms_returns_provider_sid() {
        let mut parts = StateParts::default();
        parts
            .telephony
            .expect_send_sms()
            .withf(|to, body| to == "+15551234567" && body == "hi")
            .returning(|_, _| Ok("SM123".to_string()));
        let app = app!(app_state(parts));

        let req = test::TestRequest::post()
            .uri("/api/v1/sms/send")
            .set_json(json!({"to": "+15551234567", "body": "hi"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["sid"], "SM123");
    }

    #[actix_web::test]
    async fn send_sms_validates_before_calling_provider() {
        let mut parts = StateParts::default();
        parts.telephony.expect_send_sms().times(0);
        let app = app!(app_state(parts));

        let req = test::TestRequest::post()
            .uri("/api/v1/sms/send")
            .set_json(json!({"body": "hi"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let req = test::TestRequest::post()
            .uri("/api/v1/sms/send")
            .set_json(json!({"to": "+15551234567"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn inbound_webhook_persists_and_lists_unseen() {
        let state = app_state(StateParts::default());
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/webhooks/sms")
            .set_form([("From", "+15550001111"), ("Body", "hello there")])
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Message received");

        let req = test::TestRequest::get().uri("/api/v1/sms").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["from"], "+15550001111");
        assert_eq!(messages[0]["body"], "hello there");
        assert_eq!(messages[0]["seen"], false);
    }

    #[actix_web::test]
    async fn inbound_webhook_requires_sender_and_body() {
        let app = app!(app_state(StateParts::default()));

        let req = test::TestRequest::post()
            .uri("/webhooks/sms")
            .set_form([("From", "+15550001111")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn mark_seen_persists_across_reads() {
        let state = app_state(StateParts::default());
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/webhooks/sms")
            .set_form([("From", "+15550001111"), ("Body", "hi")])
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/api/v1/sms").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let key = body["messages"][0]["key"].as_i64().unwrap();

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/sms/{}/seen", key))
            .to_request();
        let record: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(record["seen"], true);

        let req = test::TestRequest::get().uri("/api/v1/sms").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["messages"][0]["seen"], true);
    }

    #[actix_web::test]
    async fn mark_seen_unknown_key_is_404() {
        let app = app!(app_state(StateParts::default()));

        let req = test::TestRequest::post()
            .uri("/api/v1/sms/12345/seen")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn create_call_returns_provider_sid() {
        let mut parts = StateParts::default();
        parts
            .telephony
            .expect_create_call()
            .withf(|to| to == "+15551234567")
            .returning(|_| Ok("CA999".to_string()));
        let app = app!(app_state(parts));

        let req = test::TestRequest::post()
            .uri("/api/v1/calls")
            .set_json(json!({"to": "+15551234567"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["sid"], "CA999");
    }

    #[actix_web::test]
    async fn token_endpoint_issues_signed_token() {
        let app = app!(app_state(StateParts::default()));

        let req = test::TestRequest::get().uri("/api/v1/token").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let token = body["token"].as_str().unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[actix_web::test]
    async fn voice_webhook_routes_to_browser_client() {
        let app = app!(app_state(StateParts::default()));

        let req = test::TestRequest::post().uri("/webhooks/voice").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let content_type = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert_eq!(content_type, "text/xml");
        let body = test::read_body(resp).await;
        let xml = std::str::from_utf8(&body).unwrap();
        assert!(xml.contains("<Dial><Client>browser-client</Client></Dial>"));
    }

    #[actix_web::test]
    async fn api_key_guards_versioned_routes_but_not_webhooks() {
        let mut parts = StateParts::default();
        parts.settings.api_key = Some("sekrit".to_string());
        let app = app!(app_state(parts));

        let req = test::TestRequest::get().uri("/api/v1/sms").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        let req = test::TestRequest::get()
            .uri("/api/v1/sms")
            .insert_header(("X-API-Key", "sekrit"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let req = test::TestRequest::post()
            .uri("/webhooks/sms")
            .set_form([("From", "+15550001111"), ("Body", "hi")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }
}
