use thiserror::Error;

use crate::host::HostError;
use crate::message::UnknownFieldType;
use crate::wire::DecodeError;

/// Errors returned by identification and comparison.
///
/// # Examples
/// ```
/// use biscuit_core::{MatchError, UnknownFieldType};
///
/// let err = MatchError::from(UnknownFieldType("bogus".to_string()));
/// assert!(err.to_string().contains("unknown field type"));
/// ```
#[derive(Debug, Error)]
pub enum MatchError {
    #[error(transparent)]
    UnknownFieldType(#[from] UnknownFieldType),
    #[error("failed to decode {context}: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: DecodeError,
    },
    #[error("registry lock poisoned")]
    RegistryPoisoned,
    #[error("host error: {0}")]
    Host(#[from] HostError),
    #[error("comparer '{name}' failed: {message}")]
    Comparer { name: String, message: String },
}
