use serde::Serialize;
use thiserror::Error;

/// Who initiated the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Lifecycle of a single call session.
///
/// Outbound: `Idle -> Dialing -> Active -> Ended`.
/// Inbound: `Idle -> Ringing -> Active` on accept, or back to `Idle` on reject.
/// `Ended` is terminal; [`CallSession::reset`] returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallState {
    Idle,
    Dialing,
    Ringing,
    Active,
    Ended,
}

impl CallState {
    fn name(&self) -> &'static str {
        match self {
            CallState::Idle => "idle",
            CallState::Dialing => "dialing",
            CallState::Ringing => "ringing",
            CallState::Active => "active",
            CallState::Ended => "ended",
        }
    }
}

/// Discrete events driving the call state machine. These mirror the
/// softphone device callbacks plus the two user actions (dial, hang up).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    DialRequested { number: String },
    Connected,
    IncomingRinging { from: String },
    Accepted,
    Rejected,
    HungUp,
    Disconnected,
}

impl CallEvent {
    fn name(&self) -> &'static str {
        match self {
            CallEvent::DialRequested { .. } => "dial_requested",
            CallEvent::Connected => "connected",
            CallEvent::IncomingRinging { .. } => "incoming_ringing",
            CallEvent::Accepted => "accepted",
            CallEvent::Rejected => "rejected",
            CallEvent::HungUp => "hung_up",
            CallEvent::Disconnected => "disconnected",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallStateError {
    #[error("event '{event}' is not valid in state '{state}'")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },
}

/// An ephemeral call session. Created on dial or on an incoming-call event,
/// destroyed on disconnect; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSession {
    state: CallState,
    phone_number: Option<String>,
    direction: Option<Direction>,
    duration_seconds: u64,
}

impl Default for CallSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CallSession {
    pub fn new() -> Self {
        Self {
            state: CallState::Idle,
            phone_number: None,
            direction: None,
            duration_seconds: 0,
        }
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }

    pub fn is_active(&self) -> bool {
        self.state == CallState::Active
    }

    /// Advances the duration counter by one second while the call is active.
    pub fn tick(&mut self) {
        if self.state == CallState::Active {
            self.duration_seconds += 1;
        }
    }

    /// Clears the session back to `Idle`, dropping number and duration.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Applies one event. Invalid transitions leave the session untouched
    /// and report the rejected event.
    pub fn apply(&mut self, event: CallEvent) -> Result<(), CallStateError> {
        let rejected = |state: CallState, event: &CallEvent| CallStateError::InvalidTransition {
            state: state.name(),
            event: event.name(),
        };

        match (self.state, &event) {
            (CallState::Idle, CallEvent::DialRequested { number }) => {
                self.phone_number = Some(number.clone());
                self.direction = Some(Direction::Outbound);
                self.duration_seconds = 0;
                self.state = CallState::Dialing;
                Ok(())
            }
            (CallState::Idle, CallEvent::IncomingRinging { from }) => {
                self.phone_number = Some(from.clone());
                self.direction = Some(Direction::Inbound);
                self.duration_seconds = 0;
                self.state = CallState::Ringing;
                Ok(())
            }
            (CallState::Dialing, CallEvent::Connected) => {
                self.state = CallState::Active;
                Ok(())
            }
            (CallState::Dialing, CallEvent::HungUp | CallEvent::Disconnected) => {
                self.state = CallState::Ended;
                Ok(())
            }
            (CallState::Ringing, CallEvent::Accepted) => {
                self.state = CallState::Active;
                Ok(())
            }
            (CallState::Ringing, CallEvent::Rejected) => {
                self.reset();
                Ok(())
            }
            (CallState::Active, CallEvent::HungUp | CallEvent::Disconnected) => {
                self.state = CallState::Ended;
                Ok(())
            }
            (state, event) => Err(rejected(state, event)),
        }
    }
}
