// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Crate-wide error type.

/// Errors returned by SAT operations.
///
/// Capacity errors (`CapacityExceeded`, `AlreadyPresent`) are expected in routine
/// use and callers usually branch on them. Protocol errors only surface from the
/// frame codec; the discovery receive path drops such frames instead of
/// propagating them.
///
/// # Example
///
/// ```rust
/// use sat::{Error, Growth, Set};
///
/// let mut set = Set::new(2, |a: &u32, b: &u32| a == b, Growth::Static).unwrap();
/// set.add(7).unwrap();
///
/// match set.add(7) {
///     Err(Error::AlreadyPresent) => println!("7 is already registered"),
///     Err(e) => println!("other error: {}", e),
///     Ok(()) => println!("added"),
/// }
/// ```
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// A required argument is empty, zero or otherwise unusable.
    InvalidArgument(String),
    /// Operation not allowed in the current lifecycle state.
    InvalidState(String),
    /// A string field does not fit its fixed-width wire slot.
    FieldTooLong { field: &'static str, max: usize },

    // ========================================================================
    // Capacity Errors
    // ========================================================================
    /// Static container is full.
    CapacityExceeded { capacity: usize },
    /// Set insertion rejected because an equal element is present.
    AlreadyPresent,
    /// Index is not below the element count.
    IndexOutOfBounds { index: usize, len: usize },
    /// No element matched.
    NotFound,

    // ========================================================================
    // Iterator Errors
    // ========================================================================
    /// Collection exposes neither the index nor the link capability.
    UnsupportedSource,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Input shorter than the structure being decoded.
    Truncated { expected: usize, actual: usize },
    /// Frame carries a protocol version this build does not speak.
    VersionMismatch { expected: u8, found: u8 },
    /// Frame type byte outside the known range.
    InvalidFrameType(u8),
    /// Destination buffer cannot hold the encoded frame.
    BufferTooSmall { required: usize, available: usize },

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// Failed to bind socket to address.
    BindFailed(String),
    /// Failed to join multicast group.
    MulticastJoinFailed(String),
    /// Send operation failed.
    SendFailed(String),
    /// I/O error with underlying cause.
    IoError(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Configuration
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::FieldTooLong { field, max } => {
                write!(f, "Field '{}' too long (max {} bytes)", field, max)
            }
            // Capacity
            Error::CapacityExceeded { capacity } => {
                write!(f, "Capacity exceeded (static capacity {})", capacity)
            }
            Error::AlreadyPresent => write!(f, "Element already present"),
            Error::IndexOutOfBounds { index, len } => {
                write!(f, "Index {} out of bounds (len {})", index, len)
            }
            Error::NotFound => write!(f, "Not found"),
            // Iterator
            Error::UnsupportedSource => {
                write!(f, "Collection exposes no iteration capability")
            }
            // Protocol
            Error::Truncated { expected, actual } => {
                write!(f, "Truncated input: expected {} bytes, got {}", expected, actual)
            }
            Error::VersionMismatch { expected, found } => write!(
                f,
                "Protocol version mismatch: expected {}, found {}",
                expected, found
            ),
            Error::InvalidFrameType(t) => write!(f, "Invalid frame type: {}", t),
            Error::BufferTooSmall {
                required,
                available,
            } => write!(
                f,
                "Buffer too small: {} bytes required, {} available",
                required, available
            ),
            // Resource
            Error::BindFailed(msg) => write!(f, "Bind failed: {}", msg),
            Error::MulticastJoinFailed(msg) => write!(f, "Multicast join failed: {}", msg),
            Error::SendFailed(msg) => write!(f, "Send failed: {}", msg),
            Error::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e)
    }
}

/// Convenient alias for API results using the public `Error` type.
pub type Result<T> = core::result::Result<T, Error>;
