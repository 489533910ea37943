//! Best-effort breakdown of the application payload for debug logging.
//!
//! After the 32-byte correlation id the payload is a sequence of 31-byte
//! fields. Only the first three carry known meaning. Nothing here influences
//! routing; a malformed payload simply yields absent fields.

use super::vaa::{correlation_id, CORRELATION_ID_LEN};

/// Width of each payload field following the correlation id.
pub const PAYLOAD_FIELD_LEN: usize = 31;

/// Known payload fields, decoded where present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadSummary {
    /// Correlation id (source transaction id) from bytes 0..32.
    pub correlation_id: Option<String>,
    /// 20-byte address from the head of field 0.
    pub address: Option<String>,
    /// Chain id from field 1, stored low byte first.
    pub chain_id: Option<u16>,
    /// Amount from the first byte of field 2.
    pub amount: Option<u64>,
    /// Every field as `0x`-prefixed hex, in order.
    pub fields: Vec<String>,
}

impl PayloadSummary {
    /// Summarize a payload.
    #[must_use]
    pub fn parse(payload: &[u8]) -> Self {
        let mut summary = Self {
            correlation_id: correlation_id(payload),
            ..Self::default()
        };

        let Some(body) = payload.get(CORRELATION_ID_LEN..) else {
            return summary;
        };

        for (index, field) in body.chunks(PAYLOAD_FIELD_LEN).enumerate() {
            summary.fields.push(format!("0x{}", hex::encode(field)));
            match index {
                0 if field.len() >= 20 => {
                    summary.address = Some(format!("0x{}", hex::encode(&field[..20])));
                }
                1 if field.len() >= 2 => {
                    summary.chain_id = Some(u16::from_le_bytes([field[0], field[1]]));
                }
                2 if !field.is_empty() => {
                    summary.amount = Some(u64::from(field[0]));
                }
                _ => {}
            }
        }

        summary
    }
}
