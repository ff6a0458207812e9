//! Error types for the form filler.
//!
//! Malformed lines in a field list are not errors: the parser drops them.
//! Everything here aborts the current operation.

use std::path::PathBuf;

/// Result type alias for form filler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reading field lists or filling documents.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Field list or document file does not exist
    #[error("{} (No such file or directory)", path.display())]
    NotFound {
        /// Path that could not be opened
        path: PathBuf,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding label not recognised
    #[error("Unsupported encoding: {0}")]
    UnknownEncoding(String),

    /// Field list bytes are not valid in the declared encoding
    #[error("Malformed input for encoding {0}")]
    Encoding(String),

    /// Document structure rejected (missing catalog, broken field tree, ...)
    #[error("Invalid document: {0}")]
    Document(String),

    /// Error reported by the PDF object layer
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Substitution font could not be used
    #[error("Font error: {0}")]
    Font(String),

    /// Entry cannot be written in the field list format
    #[error("Field '{name}' cannot be encoded: {reason}")]
    Unencodable {
        /// Offending field name
        name: String,
        /// What makes the entry unrepresentable
        reason: &'static str,
    },
}

impl Error {
    /// Turn an `io::Error` raised while opening `path` into `NotFound` when
    /// the file is missing.
    pub fn from_open(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound { path: path.into() }
        } else {
            Error::Io(err)
        }
    }

    /// Process exit code for this error.
    ///
    /// `1` is reserved for usage errors, which never reach this type.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::NotFound { .. } => 2,
            Error::Io(_) | Error::UnknownEncoding(_) | Error::Encoding(_) => 3,
            Error::Document(_) | Error::Pdf(_) | Error::Font(_) | Error::Unencodable { .. } => 4,
        }
    }

    /// Message prefix used when reporting this error on stderr.
    pub fn report_prefix(&self) -> &'static str {
        match self.exit_code() {
            2 => "FileNotFoundException",
            3 => "Input output error",
            _ => "Error while processing document",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = Error::NotFound {
            path: PathBuf::from("missing.pdf"),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("missing.pdf"));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.report_prefix(), "FileNotFoundException");
    }

    #[test]
    fn test_from_open_maps_missing_file() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(Error::from_open(io, "a.txt"), Error::NotFound { .. }));

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = Error::from_open(io, "a.txt");
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_encoding_errors_are_io_class() {
        assert_eq!(Error::UnknownEncoding("klingon".into()).exit_code(), 3);
        assert_eq!(Error::Encoding("UTF-8".into()).exit_code(), 3);
    }

    #[test]
    fn test_unencodable_error() {
        let err = Error::Unencodable {
            name: "a]b c".to_string(),
            reason: "bracketed name contains ']'",
        };
        let msg = format!("{}", err);
        assert!(msg.contains("a]b c"));
        assert!(msg.contains("']'"));
        assert_eq!(err.exit_code(), 4);
    }
}
