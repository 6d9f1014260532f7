/// Errors produced when decoding untyped bus messages.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The topic name is not one the dashboard knows.
    #[error("unknown topic: {0:?}")]
    UnknownTopic(String),

    /// The payload does not match the schema of its topic.
    #[error("malformed payload for {topic}: {reason}")]
    MalformedPayload { topic: String, reason: String },
}

/// Convenience alias used throughout the bus crate.
pub type BusResult<T> = std::result::Result<T, BusError>;
