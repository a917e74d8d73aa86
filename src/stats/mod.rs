pub mod correlation;
pub mod error;
pub mod paired;
pub mod tdist;

pub use error::{ConfigurationError, CorrelationError};
pub use paired::{correlation_t, CorrelationT, PairedCorrelation, StatConfig};
