//! VAA envelope decoding.
//!
//! The relayer trusts the feed to have verified guardian signatures, so the
//! decoder only walks the wire layout to recover the body fields. Signatures
//! are skipped, never checked.
//!
//! # Wire Layout
//!
//! All integers are big-endian.
//!
//! ```text
//! header: version u8 | guardian_set_index u32 | signature_count u8
//!         | signature_count x (guardian_index u8 | signature [65])
//! body:   timestamp u32 | nonce u32 | emitter_chain u16
//!         | emitter_address [32] | sequence u64 | consistency_level u8
//!         | payload ..
//! ```

use chrono::{DateTime, Utc};

use crate::error::DecodeError;

/// The only envelope version the decoder accepts.
pub const SUPPORTED_VERSION: u8 = 1;

/// Size of one guardian signature entry (index byte + 65-byte signature).
pub const SIGNATURE_ENTRY_LEN: usize = 66;

/// Length of a correlation identifier at the head of the payload.
pub const CORRELATION_ID_LEN: usize = 32;

/// A decoded signed cross-chain message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEvent {
    /// Chain the emitter lives on.
    pub source_chain_id: u16,
    /// Emitter address as 64 lowercase hex characters.
    pub emitter_address: String,
    /// Emitter-scoped sequence number.
    pub sequence: u64,
    /// Observation time reported in the body.
    pub timestamp: DateTime<Utc>,
    /// Application payload.
    pub payload: Vec<u8>,
    /// First 32 payload bytes as `0x`-prefixed hex, when present.
    pub correlation_id: Option<String>,
    /// Body nonce.
    pub nonce: u32,
    /// Requested consistency (finality) level.
    pub consistency_level: u8,
    /// Guardian set that signed the envelope.
    pub guardian_set_index: u32,
    /// Number of signatures carried in the header.
    pub signature_count: u8,
}

impl DecodedEvent {
    /// Decode a raw VAA.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnsupportedVersion`] for a non-v1 envelope and
    /// [`DecodeError::Truncated`] when the bytes end before the fixed-size
    /// body fields do.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(raw);

        let version = reader.u8()?;
        if version != SUPPORTED_VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }
        let guardian_set_index = reader.u32()?;
        let signature_count = reader.u8()?;
        reader.skip(usize::from(signature_count) * SIGNATURE_ENTRY_LEN)?;

        let timestamp_secs = reader.u32()?;
        let nonce = reader.u32()?;
        let source_chain_id = reader.u16()?;
        let emitter = reader.take(32)?;
        let sequence = reader.u64()?;
        let consistency_level = reader.u8()?;
        let payload = reader.rest().to_vec();

        let timestamp =
            DateTime::from_timestamp(i64::from(timestamp_secs), 0).unwrap_or_default();

        Ok(Self {
            source_chain_id,
            emitter_address: hex::encode(emitter),
            sequence,
            timestamp,
            correlation_id: correlation_id(&payload),
            payload,
            nonce,
            consistency_level,
            guardian_set_index,
            signature_count,
        })
    }
}

/// Extract the correlation id from the head of a payload.
#[must_use]
pub fn correlation_id(payload: &[u8]) -> Option<String> {
    payload
        .get(..CORRELATION_ID_LEN)
        .map(|bytes| format!("0x{}", hex::encode(bytes)))
}

/// Bounds-checked big-endian cursor.
struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(DecodeError::Truncated {
                offset: self.offset,
                needed: len,
                available: self.bytes.len().saturating_sub(self.offset),
            })?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> Result<(), DecodeError> {
        self.take(len).map(|_| ())
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    fn rest(&mut self) -> &'a [u8] {
        let rest = &self.bytes[self.offset..];
        self.offset = self.bytes.len();
        rest
    }
}
