//! Error types for poclass

/// Result type alias using poclass's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for poclass operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors (taxonomy, rules, model artifact)
    #[error("configuration error: {0}")]
    Config(String),

    /// Result cache errors
    #[error("cache error: {0}")]
    Cache(String),

    /// Language model call errors
    #[error("llm error: {0}")]
    Llm(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timeout errors
    #[error("operation timed out")]
    Timeout,
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new cache error
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Create a new llm error
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_pick_variant() {
        assert!(matches!(Error::config("x"), Error::Config(_)));
        assert!(matches!(Error::cache("x"), Error::Cache(_)));
        assert!(matches!(Error::llm("x"), Error::Llm(_)));
        assert_eq!(Error::cache("disk full").to_string(), "cache error: disk full");
    }
}
