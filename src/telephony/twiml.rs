//! Call-routing instruction documents returned to the provider's inbound
//! voice webhook.

use serde::Serialize;

use crate::telephony::error::TelephonyError;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

#[derive(Debug, Serialize)]
#[serde(rename = "Response")]
pub struct VoiceResponse {
    #[serde(rename = "Dial")]
    dial: Dial,
}

#[derive(Debug, Serialize)]
struct Dial {
    #[serde(rename = "Client")]
    client: String,
}

impl VoiceResponse {
    /// Routes the inbound call to the named browser client.
    pub fn dial_client(name: &str) -> Self {
        Self {
            dial: Dial {
                client: name.to_string(),
            },
        }
    }

    pub fn to_xml(&self) -> Result<String, TelephonyError> {
        let body =
            quick_xml::se::to_string(self).map_err(|e| TelephonyError::Twiml(e.to_string()))?;
        Ok(format!("{}{}", XML_DECLARATION, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_dial_client_document() {
        let xml = VoiceResponse::dial_client("browser-client").to_xml().unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<Response>"));
        assert!(xml.contains("<Dial><Client>browser-client</Client></Dial>"));
    }
}
