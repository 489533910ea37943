//! Chain-agnostic domain types: message identity, VAA decoding, directions.

mod direction;
mod id;
mod message;
mod payload;
mod vaa;

pub use direction::Direction;
pub use id::{MessageKey, TransactionId};
pub use message::{RawMessage, RelayMessage};
pub use payload::{PayloadSummary, PAYLOAD_FIELD_LEN};
pub use vaa::{
    correlation_id, DecodedEvent, CORRELATION_ID_LEN, SIGNATURE_ENTRY_LEN, SUPPORTED_VERSION,
};
