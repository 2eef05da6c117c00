//! Thin client for the telephony provider's REST API. Each operation is one
//! provider call; the returned correlation SID is passed through untouched.

use async_trait::async_trait;
use log::{error, info};
use serde::Deserialize;

use crate::config::TelephonyConfig;
use crate::telephony::error::TelephonyError;

const API_VERSION: &str = "2010-04-01";
const DEFAULT_BASE_URL: &str = "https://api.twilio.com";

#[derive(Debug, Deserialize)]
struct CreateResourceResponse {
    sid: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelephonyApi: Send + Sync {
    /// Sends one SMS; returns the provider message SID.
    async fn send_sms(&self, to: &str, body: &str) -> Result<String, TelephonyError>;

    /// Creates one outbound call routed through the configured handler URL;
    /// returns the provider call SID.
    async fn create_call(&self, to: &str) -> Result<String, TelephonyError>;
}

pub struct TwilioRestClient {
    http: reqwest::Client,
    config: TelephonyConfig,
    base_url: String,
}

impl TwilioRestClient {
    pub fn new(config: TelephonyConfig) -> Self {
        Self::with_base_url(config, DEFAULT_BASE_URL.to_string())
    }

    /// Tests point this at a local stand-in for the provider.
    pub fn with_base_url(config: TelephonyConfig, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            base_url,
        }
    }

    async fn create(
        &self,
        resource: &str,
        params: &[(&str, &str)],
    ) -> Result<String, TelephonyError> {
        if self.config.account_sid.is_empty() || self.config.auth_token.is_empty() {
            return Err(TelephonyError::Config(
                "telephony credentials are not set".to_string(),
            ));
        }

        let url = format!(
            "{}/{}/Accounts/{}/{}.json",
            self.base_url, API_VERSION, self.config.account_sid, resource
        );

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Provider rejected {} create: {} {}", resource, status, message);
            return Err(TelephonyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: CreateResourceResponse = response.json().await?;
        info!("Provider accepted {} create, sid {}", resource, body.sid);
        Ok(body.sid)
    }
}

#[async_trait]
impl TelephonyApi for TwilioRestClient {
    async fn send_sms(&self, to: &str, body: &str) -> Result<String, TelephonyError> {
        self.create(
            "Messages",
            &[
                ("To", to),
                ("From", self.config.phone_number.as_str()),
                ("Body", body),
            ],
        )
        .await
    }

    async fn create_call(&self, to: &str) -> Result<String, TelephonyError> {
        self.create(
            "Calls",
            &[
                ("To", to),
                ("From", self.config.phone_number.as_str()),
                ("Url", self.config.voice_handler_url.as_str()),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TelephonyConfig {
        TelephonyConfig {
            account_sid: String::new(),
            auth_token: String::new(),
            phone_number: "+15550009999".to_string(),
            twiml_app_sid: "AP123".to_string(),
            voice_handler_url: "https://example.com/voice".to_string(),
            client_name: "browser-client".to_string(),
        }
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_request() {
        let client = TwilioRestClient::new(config());
        let err = client.send_sms("+15551234567", "hi").await.unwrap_err();
        assert!(matches!(err, TelephonyError::Config(_)));
    }
}
