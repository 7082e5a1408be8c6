//! Error types for reelplay playback.
//!
//! Construction failures mean "this content cannot be read"; failures from
//! `pass()` and `seek()` propagate straight from the package library.

/// Error type for reelplay.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The package library failed.
    #[error(transparent)]
    Media(#[from] reelplay_media::Error),

    /// Resolving the content's directories found no playlists.
    #[error("No CPLs found in DCP")]
    NoCpls,

    /// A picture asset that is neither mono nor stereo.
    #[error("Picture asset {0} is neither mono nor stereo")]
    InvalidPicture(String),

    /// Key material could not be applied to the selected playlist.
    #[error("Could not apply KDM: {0}")]
    Kdm(String),

    /// Referencing needs the content to run at the output rate.
    #[error("Cannot reference content at {content} fps in a {film} fps film")]
    FrameRateMismatch { content: f64, film: i32 },

    /// Invalid content description.
    #[error("Invalid content: {0}")]
    InvalidContent(String),
}

impl Error {
    /// Create a new InvalidContent error.
    pub fn invalid_content<S: Into<String>>(msg: S) -> Self {
        Self::InvalidContent(msg.into())
    }
}

/// Result type alias using the reelplay Error type.
pub type Result<T> = std::result::Result<T, Error>;
