//! Marshaling envelope for delegate calls.
//!
//! Requests cross the C ABI as UTF-8 JSON. The dispatcher serializes
//! the stage key and the request attribute list into the delegate's
//! input buffer; the delegate may answer with a JSON array of reply
//! attributes written into a caller-provided buffer of at most
//! [`REPLY_CAPACITY`] bytes.

use crate::request::Attribute;
use serde::Serialize;

/// Upper bound on the reply payload a delegate may write.
pub const REPLY_CAPACITY: usize = 64 * 1024;

/// The envelope serialized into a delegate's input buffer.
#[derive(Debug, Serialize)]
pub struct DispatchPayload<'a> {
    pub stage: &'a str,
    pub request: &'a [Attribute],
}

/// Serializes the dispatch envelope for one stage invocation.
pub fn encode_dispatch(stage: &str, request: &[Attribute]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&DispatchPayload { stage, request })
}

/// Parses the reply payload a delegate wrote. An empty payload means
/// "no reply changes".
pub fn decode_reply(payload: &[u8]) -> Result<Vec<Attribute>, serde_json::Error> {
    if payload.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_slice(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_dispatch_envelope() {
        let request = vec![Attribute::new("User-Name", "alice")];
        let payload = encode_dispatch("authorize", &request).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(parsed["stage"], "authorize");
        assert_eq!(parsed["request"][0]["name"], "User-Name");
        assert_eq!(parsed["request"][0]["value"], "alice");
    }

    #[test]
    fn test_decode_reply_attributes() {
        let reply = br#"[{"name":"Reply-Message","value":"ok"}]"#;
        let attributes = decode_reply(reply).unwrap();
        assert_eq!(attributes, vec![Attribute::new("Reply-Message", "ok")]);
    }

    #[test]
    fn test_decode_empty_reply_is_no_change() {
        assert!(decode_reply(b"").unwrap().is_empty());
        assert!(decode_reply(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_decode_malformed_reply_fails() {
        assert!(decode_reply(b"{not json").is_err());
        assert!(decode_reply(br#"{"name":"x"}"#).is_err());
    }
}
