pub mod device;
pub mod error;
pub mod rest;
pub mod token;
pub mod twiml;

pub use device::{CallController, DeviceEvent, VoiceDevice};
pub use error::TelephonyError;
pub use rest::{TelephonyApi, TwilioRestClient};
pub use twiml::VoiceResponse;
