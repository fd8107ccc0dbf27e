pub mod error;
pub mod types;

#[cfg(feature = "growth")]
pub mod growth;

#[cfg(feature = "mortgage")]
pub mod mortgage;

#[cfg(feature = "housing")]
pub mod housing;

#[cfg(feature = "monte_carlo")]
pub mod random;

#[cfg(feature = "monte_carlo")]
pub mod monte_carlo;

#[cfg(feature = "income")]
pub mod income;

#[cfg(feature = "dca")]
pub mod dca;

#[cfg(feature = "portfolio")]
pub mod portfolio;

pub use error::AtharError;
pub use types::*;

/// Standard result type for all athar operations
pub type AtharResult<T> = Result<T, AtharError>;
