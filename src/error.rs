use thiserror::Error;

/// Errors returned by fallible table operations.
///
/// Every operation that can fail checks before it touches storage, so the
/// table is left exactly as it was when one of these comes back.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum TableError {
    /// No valid bucket count is large enough for the requested size.
    #[error("no bucket count of at least {requested} is available (largest is {largest})")]
    SizeExhausted { requested: usize, largest: usize },

    /// The maximum load factor must be strictly positive.
    #[error("invalid maximum load factor {0}: must be greater than {min}", min = crate::config::MIN_MAX_LOAD_FACTOR)]
    InvalidLoadFactor(f64),
}

pub type Result<T, E = TableError> = std::result::Result<T, E>;
