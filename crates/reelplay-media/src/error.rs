//! Error types for reelplay-media.

use std::io;
use thiserror::Error;

/// Result type for reelplay-media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for reelplay-media operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A frame was requested outside the asset.
    #[error("frame {frame} out of range for asset {asset} ({duration} frames)")]
    FrameOutOfRange {
        asset: String,
        frame: i64,
        duration: i64,
    },

    /// An asset was opened in a way its essence does not support.
    #[error("wrong essence for asset {asset}: {message}")]
    WrongEssence { asset: String, message: String },

    /// The package could not be resolved.
    #[error("invalid package: {0}")]
    InvalidPackage(String),

    /// The package resolved with recoverable problems and tolerance was not requested.
    #[error("package has {} recoverable problem(s): {}", .0.len(), .0.join("; "))]
    Warnings(Vec<String>),

    /// An encrypted asset was read without a key, or key material did not match.
    #[error("decryption error: {0}")]
    Decryption(String),

    /// Manifest could not be parsed.
    #[cfg(feature = "manifest")]
    #[error("manifest error: {0}")]
    Manifest(#[from] toml::de::Error),
}

impl Error {
    /// Create an invalid package error.
    pub fn invalid_package(msg: impl Into<String>) -> Self {
        Self::InvalidPackage(msg.into())
    }

    /// Create a decryption error.
    pub fn decryption(msg: impl Into<String>) -> Self {
        Self::Decryption(msg.into())
    }

    /// Create a wrong-essence error for the given asset.
    pub fn wrong_essence(asset: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::WrongEssence {
            asset: asset.into(),
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_display() {
        let err = Error::Warnings(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "package has 2 recoverable problem(s): a; b");
    }

    #[test]
    fn test_frame_out_of_range_display() {
        let err = Error::FrameOutOfRange {
            asset: "pic".into(),
            frame: 30,
            duration: 24,
        };
        assert_eq!(
            err.to_string(),
            "frame 30 out of range for asset pic (24 frames)"
        );
    }
}
