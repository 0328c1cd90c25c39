//! HL7v2 over MLLP.
//!
//! - [`frame`]: the `0x0B ... 0x1C 0x0D` envelope as a tokio codec
//! - [`message`] / [`ack`]: ADT^A04 / ADT^A23 generation and parsing, ACKs
//! - [`handler`]: hub-side dispatch into the patient store
//! - [`transport`]: accept loop and one-shot client, plain TCP or TLS
//! - [`sender`]: intake-side send with ACK correlation

pub mod ack;
pub mod error;
pub mod frame;
pub mod handler;
pub mod message;
mod segment;
pub mod sender;
pub mod transport;

pub use ack::{AckCode, AckMessage, build_ack};
pub use error::{FrameError, Hl7Error, Result, TransportError};
pub use frame::{MllpCodec, decode_frame, encode_frame};
pub use handler::{AdtHandler, MessageHandler};
pub use message::{AdtMessage, OutboundMessage, admit_message, discharge_message};
pub use sender::{AdtOutcome, AdtSender};
pub use transport::{MllpClient, MllpServer};
