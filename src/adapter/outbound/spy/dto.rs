//! Spy feed wire messages.
//!
//! Hand-written `prost` equivalents of the `spy.v1` protobuf messages used by
//! `SpyRPCService/SubscribeSignedVAA`. Only the fields the relayer reads or
//! sends are declared; unknown fields are skipped by the decoder.

/// Fully qualified path of the server-streaming subscribe call.
pub const SUBSCRIBE_SIGNED_VAA_PATH: &str = "/spy.v1.SpyRPCService/SubscribeSignedVAA";

/// gRPC service name.
pub const SPY_SERVICE_NAME: &str = "spy.v1.SpyRPCService";

/// Subscription request. No filters means every signed VAA.
#[derive(Clone, PartialEq, prost::Message)]
pub struct SubscribeSignedVaaRequest {
    #[prost(message, repeated, tag = "1")]
    pub filters: Vec<FilterEntry>,
}

impl SubscribeSignedVaaRequest {
    /// Request for all signed VAAs.
    #[must_use]
    pub fn all() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Request restricted to the given `(chain, emitter)` pairs.
    #[must_use]
    pub fn emitters<I>(emitters: I) -> Self
    where
        I: IntoIterator<Item = (u16, String)>,
    {
        Self {
            filters: emitters
                .into_iter()
                .map(|(chain_id, emitter_address)| FilterEntry {
                    emitter_filter: Some(EmitterFilter {
                        chain_id: i32::from(chain_id),
                        emitter_address,
                    }),
                })
                .collect(),
        }
    }
}

/// One filter clause. Field 1 of the upstream `oneof filter`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct FilterEntry {
    #[prost(message, optional, tag = "1")]
    pub emitter_filter: Option<EmitterFilter>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct EmitterFilter {
    #[prost(int32, tag = "1")]
    pub chain_id: i32,
    #[prost(string, tag = "2")]
    pub emitter_address: String,
}

/// One streamed signed VAA.
#[derive(Clone, PartialEq, prost::Message)]
pub struct SubscribeSignedVaaResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub vaa_bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn unfiltered_request_encodes_empty() {
        assert!(SubscribeSignedVaaRequest::all().encode_to_vec().is_empty());
    }

    #[test]
    fn emitter_filter_wire_layout() {
        let request = SubscribeSignedVaaRequest::emitters([(2, "ab".to_string())]);
        // filters[0] { emitter_filter { chain_id: 2, emitter_address: "ab" } }
        assert_eq!(
            request.encode_to_vec(),
            vec![0x0a, 0x08, 0x0a, 0x06, 0x08, 0x02, 0x12, 0x02, b'a', b'b']
        );
    }

    #[test]
    fn response_decodes_vaa_bytes() {
        let wire = [0x0a, 0x03, 1, 2, 3, 0x10, 0x01];
        let response = SubscribeSignedVaaResponse::decode(&wire[..]).unwrap();
        assert_eq!(response.vaa_bytes, vec![1, 2, 3]);
    }
}
