//! Hand-declared subset of `dnstap.proto` (https://dnstap.info/), covering
//! only the fields the reverse-DNS enrichment hook reads: whether the frame
//! is a `MESSAGE`, and that message's `response_message` bytes. Declared
//! directly against the wire tags with `prost` rather than generating
//! bindings from the full `.proto` file, since only two of its ~15 fields
//! are needed.

#[derive(Clone, PartialEq, prost::Message)]
pub struct DnstapMessage {
    #[prost(int32, optional, tag = "1")]
    pub r#type: Option<i32>,
    #[prost(bytes, optional, tag = "14")]
    pub response_message: Option<Vec<u8>>,
}

/// `Dnstap.Type.MESSAGE`, the only outer variant the hook cares about.
pub const DNSTAP_TYPE_MESSAGE: i32 = 1;

#[derive(Clone, PartialEq, prost::Message)]
pub struct Dnstap {
    #[prost(string, optional, tag = "1")]
    pub identity: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub version: Option<String>,
    #[prost(message, optional, tag = "14")]
    pub message: Option<DnstapMessage>,
    #[prost(int32, optional, tag = "15")]
    pub r#type: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn round_trips_a_message_with_response_bytes() {
        let dt = Dnstap {
            identity: Some("test".to_string()),
            version: None,
            message: Some(DnstapMessage { r#type: Some(2), response_message: Some(vec![1, 2, 3]) }),
            r#type: Some(DNSTAP_TYPE_MESSAGE),
        };

        let encoded = dt.encode_to_vec();
        let decoded = Dnstap::decode(encoded.as_slice()).unwrap();
        assert_eq!(decoded.r#type, Some(DNSTAP_TYPE_MESSAGE));
        assert_eq!(decoded.message.unwrap().response_message, Some(vec![1, 2, 3]));
    }
}
