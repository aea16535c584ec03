//! Errors raised while parsing or resolving a geometry descriptor.

use alloc::string::String;

/// Failure from [`GeometryDescriptor::parse`](crate::GeometryDescriptor::parse)
/// or [`resolve`](crate::resolve()).
///
/// There are only two kinds. Neither is recoverable inside the crate; both
/// abort the call and are returned to the caller as-is.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    /// The descriptor is malformed or asks for something the resolver
    /// cannot express.
    #[error("invalid geometry {descriptor:?}: {reason}")]
    InvalidGeometry {
        /// The offending descriptor text.
        descriptor: String,
        /// What was wrong with it.
        reason: InvalidReason,
    },

    /// Source image has a zero width or height.
    #[error("invalid source dimensions {width}x{height}: both must be positive")]
    InvalidDimensions {
        /// Source width in pixels.
        width: u32,
        /// Source height in pixels.
        height: u32,
    },
}

impl GeometryError {
    pub(crate) fn invalid(descriptor: impl Into<String>, reason: InvalidReason) -> Self {
        Self::InvalidGeometry {
            descriptor: descriptor.into(),
            reason,
        }
    }

    /// The [`InvalidReason`] if this is an `InvalidGeometry` error.
    pub fn reason(&self) -> Option<InvalidReason> {
        match self {
            Self::InvalidGeometry { reason, .. } => Some(*reason),
            Self::InvalidDimensions { .. } => None,
        }
    }
}

/// Why a descriptor was rejected.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum InvalidReason {
    #[error("expected `x` between width and height")]
    MissingSeparator,
    #[error("width and height are both absent or zero")]
    NoDimensions,
    #[error("number does not fit in range")]
    NumberOutOfRange,
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("unknown gravity; expected one of c, n, s, e, w, ne, nw, se, sw")]
    UnknownGravity,
    #[error("gravity and explicit offsets cannot be combined")]
    ConflictingCrop,
    #[error("expected a signed offset pair like +10+20")]
    MalformedOffset,
    #[error("this mode needs both width and height")]
    MissingDimension,
    #[error("resolved size does not fit in a u32 pixel count")]
    ResultOutOfRange,
}
