use thiserror::Error;

/// Errors produced while gathering delays
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum Error {
    /// An argument was out of range, e.g. a negative task count or delay bound
    #[error("invalid argument `{name}`: {value}")]
    InvalidArgument {
        /// Name of the offending argument
        name: &'static str,
        /// The rejected value, rendered as text
        value: String,
    },

    /// A delay task failed to produce its sample
    #[error("delay task failed: {0}")]
    Task(String),
}
