//! Capability tokens: short-lived signed credentials letting a browser
//! client authenticate directly to the telephony provider.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::config::TelephonyConfig;
use crate::telephony::error::TelephonyError;

const TOKEN_TTL_SECONDS: i64 = 3600;

#[derive(Debug, Serialize, Deserialize)]
pub struct CapabilityClaims {
    pub scope: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues a capability token scoped for incoming calls to the configured
/// browser client and outgoing calls through the TwiML application.
pub fn capability_token(config: &TelephonyConfig) -> Result<String, TelephonyError> {
    if config.account_sid.is_empty() || config.auth_token.is_empty() {
        return Err(TelephonyError::Config(
            "telephony credentials are not set".to_string(),
        ));
    }
    if config.twiml_app_sid.is_empty() {
        return Err(TelephonyError::Config(
            "TwiML application SID is not set".to_string(),
        ));
    }

    let scopes = [
        format!("scope:client:incoming?clientName={}", config.client_name),
        format!("scope:client:outgoing?appSid={}", config.twiml_app_sid),
    ];

    let now = Utc::now();
    let claims = CapabilityClaims {
        scope: scopes.join(" "),
        iss: config.account_sid.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(TOKEN_TTL_SECONDS)).timestamp(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.auth_token.as_bytes()),
    )?;
    Ok(token)
}
