//! Conversion from external subword model formats.

use alloc::string::String;

mod sentencepiece;

pub use sentencepiece::*;

/// Errors encountered when a conversion fails.
#[non_exhaustive]
#[derive(Debug)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum ConversionError {
    /// The data is invalid. See the error message for more information.
    #[cfg_attr(feature = "std", error("invalid data: {0}"))]
    InvalidData(String),
}
