/// Errors from constructing or parsing dashboard value types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    /// A currency code was empty, too long, or contained invalid characters.
    #[error("invalid currency code: {0:?}")]
    InvalidCurrencyCode(String),

    /// A string did not name any variant of the given enum.
    #[error("unknown {kind}: {value:?}")]
    UnknownVariant { kind: &'static str, value: String },
}
