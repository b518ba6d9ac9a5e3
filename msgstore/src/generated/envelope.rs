/// / Storage representation of a single message.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Envelope {
    /// / Canonical hyphenated UUID text.
    #[prost(string, required, tag="1")]
    pub id: ::prost::alloc::string::String,
    /// / Creation timestamp in epoch milli-seconds.
    #[prost(int64, required, tag="2")]
    pub timestamp: i64,
    /// / Free-form string headers.
    #[prost(btree_map="string, string", tag="3")]
    pub headers: ::prost::alloc::collections::BTreeMap<::prost::alloc::string::String, ::prost::alloc::string::String>,
    /// / The opaque message body.
    #[prost(bytes="vec", required, tag="4")]
    pub payload: ::prost::alloc::vec::Vec<u8>,
}
