//! Error types for container access.

use thiserror::Error;

/// Errors raised while opening or reading a report container.
///
/// Every variant here is unrecoverable for the member (or run) it concerns:
/// a container that cannot be opened aborts the run, and a member that
/// cannot be read yields no payload. Recoverable conditions (undecodable or
/// unparsable payloads) are not errors at this layer; see
/// [`decode`](crate::decode) and [`parse_structured`](crate::parse_structured).
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Underlying file I/O failed.
    #[error("failed to read container: {0}")]
    Io(#[from] std::io::Error),

    /// No end-of-central-directory record was found.
    #[error("not a report container (no central directory): {path}")]
    NotAContainer { path: String },

    /// The archive structure runs past the end of the file.
    #[error("container truncated while reading {context}")]
    Truncated { context: &'static str },

    /// Zip64 markers present; such containers are not handled.
    #[error("zip64 containers are not supported")]
    Zip64Unsupported,

    /// The requested member does not exist in the container.
    #[error("member not found in container: {member}")]
    MemberNotFound { member: String },

    /// A member uses a compression method other than stored or DEFLATE.
    #[error("unsupported compression method {method} for member {member}")]
    UnsupportedCompression { member: String, method: u16 },

    /// DEFLATE decompression of a member failed.
    #[error("failed to inflate member {member}: {detail}")]
    Inflate { member: String, detail: String },
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ContainerError>;
