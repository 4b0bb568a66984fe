//! Unified error types for filter operations.

use core::fmt;

use crate::pixel::PixelFormat;

/// Unified error type for the reframer, decoder and converter stages.
#[derive(Debug)]
#[non_exhaustive]
pub enum FilterError {
    /// Input not recognized, or port capabilities don't match this stage.
    UnsupportedFormat,
    /// Operation invoked on a port the stage does not own.
    BadParameter,
    /// Buffer allocation failure.
    Oom,
    /// The host failed a service request (e.g. output port creation).
    Service(&'static str),
    /// Pixel conversion pair not implemented.
    NotSupported {
        from: PixelFormat,
        to: PixelFormat,
    },
    /// Underlying decode primitive error.
    Decode(Box<dyn core::error::Error + Send + Sync>),
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::UnsupportedFormat => write!(f, "unsupported format"),
            FilterError::BadParameter => write!(f, "bad parameter"),
            FilterError::Oom => write!(f, "out of memory"),
            FilterError::Service(detail) => write!(f, "service error: {}", detail),
            FilterError::NotSupported { from, to } => {
                write!(f, "pixel conversion {:?} -> {:?} not supported", from, to)
            }
            FilterError::Decode(source) => write!(f, "decode error: {}", source),
        }
    }
}

impl core::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            FilterError::Decode(source) => Some(source.as_ref()),
            _ => None,
        }
    }
}

// Conversion helper for backend-specific errors
impl FilterError {
    /// Wrap a decode-backend error.
    pub fn from_decode<E>(error: E) -> Self
    where
        E: core::error::Error + Send + Sync + 'static,
    {
        FilterError::Decode(Box::new(error))
    }
}
