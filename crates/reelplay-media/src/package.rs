//! The package library seam.

use crate::reel::Cpl;
use crate::Result;
use std::path::PathBuf;

/// Finds and parses the playlists of a package.
///
/// Implementations own the on-disk layout; playback only sees resolved
/// [`Cpl`]s whose reels point at readable assets.
pub trait PackageLibrary: Send + Sync {
    /// Human-readable name identifying this library implementation.
    fn name(&self) -> &'static str;

    /// Find every playlist under `directories` and resolve its reels
    /// against the assets found there.
    ///
    /// Recoverable inconsistencies fail the call with
    /// [`Error::Warnings`](crate::Error::Warnings) unless `tolerant` is set,
    /// in which case they are logged and resolution carries on. Anything
    /// else is always an error.
    fn find_and_resolve_cpls(&self, directories: &[PathBuf], tolerant: bool) -> Result<Vec<Cpl>>;
}
