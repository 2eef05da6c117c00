//! The softphone seam: a narrow capability interface over whatever client
//! SDK actually carries the audio, and a controller that maps its events
//! onto the explicit call state machine.

use log::debug;

use crate::models::{CallEvent, CallSession, CallState, CallStateError};
use crate::telephony::error::TelephonyError;

/// Events surfaced by a voice device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Incoming { from: String },
    Connect,
    Disconnect,
}

/// Minimal capability surface of a softphone connection. Implementations
/// wrap a real client SDK; tests use a fake.
pub trait VoiceDevice: Send {
    fn connect(&mut self, number: &str) -> Result<(), TelephonyError>;
    fn accept(&mut self) -> Result<(), TelephonyError>;
    fn reject(&mut self) -> Result<(), TelephonyError>;
    fn disconnect(&mut self) -> Result<(), TelephonyError>;
}

/// Owns one [`VoiceDevice`] and one [`CallSession`]; user actions go through
/// the device first, device callbacks come back in via [`handle_event`].
///
/// [`handle_event`]: CallController::handle_event
pub struct CallController<D: VoiceDevice> {
    device: D,
    session: CallSession,
}

impl<D: VoiceDevice> CallController<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            session: CallSession::new(),
        }
    }

    pub fn session(&self) -> &CallSession {
        &self.session
    }

    pub fn dial(&mut self, number: &str) -> Result<(), TelephonyError> {
        self.device.connect(number)?;
        self.apply(CallEvent::DialRequested {
            number: number.to_string(),
        })
    }

    pub fn accept(&mut self) -> Result<(), TelephonyError> {
        self.device.accept()?;
        self.apply(CallEvent::Accepted)
    }

    pub fn reject(&mut self) -> Result<(), TelephonyError> {
        self.device.reject()?;
        self.apply(CallEvent::Rejected)
    }

    pub fn hang_up(&mut self) -> Result<(), TelephonyError> {
        self.device.disconnect()?;
        self.apply(CallEvent::HungUp)?;
        self.session.reset();
        Ok(())
    }

    /// Feeds a device callback into the state machine. A disconnect that
    /// arrives while idle is ignored rather than treated as a fault.
    pub fn handle_event(&mut self, event: DeviceEvent) -> Result<(), TelephonyError> {
        debug!("Device event: {:?}", event);
        match event {
            DeviceEvent::Incoming { from } => self.apply(CallEvent::IncomingRinging { from }),
            DeviceEvent::Connect => self.apply(CallEvent::Connected),
            DeviceEvent::Disconnect => {
                if self.session.state() == CallState::Idle {
                    return Ok(());
                }
                self.apply(CallEvent::Disconnected)?;
                self.session.reset();
                Ok(())
            }
        }
    }

    fn apply(&mut self, event: CallEvent) -> Result<(), TelephonyError> {
        self.session
            .apply(event)
            .map_err(|e: CallStateError| TelephonyError::Device(e.to_string()))
    }
}
