pub mod error;
pub mod types;
pub mod valuation;

pub use error::DcfError;
pub use types::*;

/// Standard result type for all dcftool operations
pub type DcfResult<T> = Result<T, DcfError>;
