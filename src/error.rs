//! The error type returned by every fallible operation in this crate.

use std::fmt;

/// Shorthand for a `Result` using this crate's [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

/// Shorthand for a fallible operation that produces no value on success.
pub type UnitResult = Result<()>;

/// Everything that can go wrong while compressing or decompressing a buffer.
///
/// Variants map directly onto the error taxonomy of the container format:
/// a caller can match on them to decide whether a failure is a bad request
/// (`Config`), a resource limit (`Allocation`), a codec failure (`Codec`),
/// a malformed container (`Format`), or a threading failure (`Worker`).
#[derive(Debug)]
pub enum Error {
    /// An unsupported `(N, bytes_mode)` combination, an invalid method byte
    /// recovered from a container, or an `origSize` inconsistent with the
    /// parsed chunk layout.
    Config(String),

    /// A heap allocation failed (or would have exceeded a declared capacity).
    Allocation(String),

    /// The underlying entropy codec reported an error, or a decoded stream's
    /// size did not match the expected uncompressed size.
    Codec(String),

    /// The container is malformed: header too short, non-monotonic
    /// cumulative sizes, or a declared total length that disagrees with the
    /// parsed sections.
    Format(String),

    /// A worker thread could not be spawned, or a worker pool could not be
    /// built.
    Worker(String),

    /// Wraps `std::io::Error` for the CLI and test tooling; not part of the
    /// core codec's own failure modes.
    Io(std::io::Error),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn allocation(message: impl Into<String>) -> Self {
        Error::Allocation(message.into())
    }

    pub fn codec(message: impl Into<String>) -> Self {
        Error::Codec(message.into())
    }

    pub fn format(message: impl Into<String>) -> Self {
        Error::Format(message.into())
    }

    pub fn worker(message: impl Into<String>) -> Self {
        Error::Worker(message.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(message) => write!(formatter, "invalid configuration: {message}"),
            Error::Allocation(message) => write!(formatter, "allocation failed: {message}"),
            Error::Codec(message) => write!(formatter, "codec error: {message}"),
            Error::Format(message) => write!(formatter, "malformed container: {message}"),
            Error::Worker(message) => write!(formatter, "worker thread error: {message}"),
            Error::Io(io_error) => write!(formatter, "io error: {io_error}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(io_error) => Some(io_error),
            _ => None,
        }
    }
}

/// Enable using the `?` operator on `io::Result`.
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io(error)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn displays_variants_distinctly() {
        let messages = [
            Error::config("bad N").to_string(),
            Error::allocation("oom").to_string(),
            Error::codec("huffman failed").to_string(),
            Error::format("short header").to_string(),
            Error::worker("spawn failed").to_string(),
        ];

        // every variant should mention its own category so callers grepping logs can tell them apart
        assert!(messages[0].contains("configuration"));
        assert!(messages[1].contains("allocation"));
        assert!(messages[2].contains("codec"));
        assert!(messages[3].contains("container"));
        assert!(messages[4].contains("worker"));
    }
}
