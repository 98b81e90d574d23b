//! Protocol module containing the event envelope and the wire codec.

pub mod codec;
pub mod event;

pub use codec::{decode_event, encode_event, ProtocolError, WireFormat};
pub use event::{Event, EventKind};
