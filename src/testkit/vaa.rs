//! Builder for well-formed VAA v1 envelopes.

use crate::domain::{CORRELATION_ID_LEN, SIGNATURE_ENTRY_LEN, SUPPORTED_VERSION};

/// Assembles raw VAA bytes field by field.
///
/// Signatures are filler bytes; the decoder never checks them.
#[derive(Debug, Clone)]
pub struct VaaBuilder {
    version: u8,
    guardian_set_index: u32,
    signatures: u8,
    timestamp: u32,
    nonce: u32,
    chain: u16,
    emitter: [u8; 32],
    sequence: u64,
    consistency_level: u8,
    payload: Vec<u8>,
}

impl VaaBuilder {
    pub fn new(chain: u16, sequence: u64) -> Self {
        Self {
            version: SUPPORTED_VERSION,
            guardian_set_index: 0,
            signatures: 1,
            timestamp: 1_700_000_000,
            nonce: 0,
            chain,
            emitter: [0x11; 32],
            sequence,
            consistency_level: 1,
            payload: Vec::new(),
        }
    }

    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    pub fn guardian_set_index(mut self, index: u32) -> Self {
        self.guardian_set_index = index;
        self
    }

    pub fn signatures(mut self, count: u8) -> Self {
        self.signatures = count;
        self
    }

    pub fn timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn nonce(mut self, nonce: u32) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn emitter(mut self, emitter: [u8; 32]) -> Self {
        self.emitter = emitter;
        self
    }

    pub fn consistency_level(mut self, level: u8) -> Self {
        self.consistency_level = level;
        self
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    /// Prefix the payload with a 32-byte correlation id.
    pub fn correlation_id(mut self, id: [u8; CORRELATION_ID_LEN]) -> Self {
        let mut payload = id.to_vec();
        payload.extend_from_slice(&self.payload);
        self.payload = payload;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            6 + usize::from(self.signatures) * SIGNATURE_ENTRY_LEN + 51 + self.payload.len(),
        );
        out.push(self.version);
        out.extend_from_slice(&self.guardian_set_index.to_be_bytes());
        out.push(self.signatures);
        for index in 0..self.signatures {
            out.push(index);
            out.extend_from_slice(&[0xab; SIGNATURE_ENTRY_LEN - 1]);
        }
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.extend_from_slice(&self.nonce.to_be_bytes());
        out.extend_from_slice(&self.chain.to_be_bytes());
        out.extend_from_slice(&self.emitter);
        out.extend_from_slice(&self.sequence.to_be_bytes());
        out.push(self.consistency_level);
        out.extend_from_slice(&self.payload);
        out
    }
}
