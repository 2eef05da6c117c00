pub mod call;
pub mod message;

pub use call::{CallEvent, CallSession, CallState, CallStateError, Direction};
pub use message::{Attachment, Message};
