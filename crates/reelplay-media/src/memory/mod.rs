//! An in-memory [`PackageLibrary`] built from synthetic assets.
//!
//! Packages are registered against a directory; resolving that directory
//! yields fresh [`Cpl`] values whose reels share the registered assets.
//! Every frame is a pure function of its index, so playback can be checked
//! frame by frame.

mod assets;
#[cfg(feature = "manifest")]
pub mod manifest;

#[cfg(feature = "manifest")]
pub use manifest::PackageManifest;

pub use assets::{
    frame_payload, HmacCounter, MemoryAtmos, MemoryPicture, MemorySound, MemorySubtitle,
};

use crate::asset::{PictureKind, Subtitle};
use crate::package::PackageLibrary;
use crate::reel::{Cpl, Reel, ReelAsset};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Builder for one [`Reel`] of synthetic assets.
#[derive(Debug, Clone)]
pub struct MemoryReel {
    reel: Reel,
    frame_rate: u32,
}

impl MemoryReel {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            reel: Reel::new(id),
            frame_rate: 24,
        }
    }

    /// Edit rate used for assets added after this call.
    pub fn frame_rate(mut self, rate: u32) -> Self {
        self.frame_rate = rate;
        self
    }

    fn asset_id(&self, kind: &str) -> String {
        format!("{}-{}", self.reel.id, kind)
    }

    /// Mono picture of `duration` frames.
    pub fn picture(self, duration: i64) -> Self {
        let id = self.asset_id("picture");
        let rate = f64::from(self.frame_rate);
        self.picture_asset(
            MemoryPicture::new(id, Some(PictureKind::Mono), duration).with_frame_rate(rate),
        )
    }

    /// Stereoscopic picture of `duration` frames.
    pub fn stereo_picture(self, duration: i64) -> Self {
        let id = self.asset_id("picture");
        let rate = f64::from(self.frame_rate);
        self.picture_asset(
            MemoryPicture::new(id, Some(PictureKind::Stereo), duration).with_frame_rate(rate),
        )
    }

    pub fn picture_asset(mut self, asset: MemoryPicture) -> Self {
        self.reel.main_picture = Some(ReelAsset::new(Arc::new(asset)));
        self
    }

    /// 48kHz sound of `duration` frames.
    pub fn sound(self, duration: i64, channels: usize) -> Self {
        let id = self.asset_id("sound");
        let rate = self.frame_rate;
        self.sound_asset(MemorySound::new(id, channels, duration).with_rates(48_000, rate))
    }

    pub fn sound_asset(mut self, asset: MemorySound) -> Self {
        self.reel.main_sound = Some(ReelAsset::new(Arc::new(asset)));
        self
    }

    pub fn subtitle(self, duration: i64, subtitles: Vec<Subtitle>) -> Self {
        let id = self.asset_id("subtitle");
        self.subtitle_asset(MemorySubtitle::new(id, duration, subtitles))
    }

    pub fn subtitle_asset(mut self, asset: MemorySubtitle) -> Self {
        self.reel.main_subtitle = Some(ReelAsset::new(Arc::new(asset)));
        self
    }

    pub fn closed_caption(mut self, duration: i64, subtitles: Vec<Subtitle>) -> Self {
        let id = self.asset_id(&format!("ccap{}", self.reel.closed_captions.len()));
        self.reel
            .closed_captions
            .push(ReelAsset::new(Arc::new(MemorySubtitle::new(id, duration, subtitles))));
        self
    }

    pub fn atmos(self, duration: i64) -> Self {
        let id = self.asset_id("atmos");
        self.atmos_asset(MemoryAtmos::new(id, duration))
    }

    pub fn atmos_asset(mut self, asset: MemoryAtmos) -> Self {
        self.reel.atmos = Some(ReelAsset::new(Arc::new(asset)));
        self
    }

    /// Start every asset already in the reel at `frames` into its file,
    /// playing `duration` frames from there.
    pub fn trimmed(mut self, entry_point: i64, duration: i64) -> Self {
        let reel = &mut self.reel;
        if let Some(a) = &mut reel.main_picture {
            a.set_entry_point(entry_point);
            a.set_duration(duration);
        }
        if let Some(a) = &mut reel.main_sound {
            a.set_entry_point(entry_point);
            a.set_duration(duration);
        }
        if let Some(a) = &mut reel.main_subtitle {
            a.set_entry_point(entry_point);
            a.set_duration(duration);
        }
        for a in &mut reel.closed_captions {
            a.set_entry_point(entry_point);
            a.set_duration(duration);
        }
        if let Some(a) = &mut reel.atmos {
            a.set_entry_point(entry_point);
            a.set_duration(duration);
        }
        self
    }

    pub fn build(self) -> Reel {
        self.reel
    }
}

/// The playlists and problems found in one package directory.
#[derive(Debug, Clone, Default)]
pub struct MemoryPackage {
    cpls: Vec<Cpl>,
    warnings: Vec<String>,
    fatal: Option<String>,
}

impl MemoryPackage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cpl(mut self, id: impl Into<String>, reels: Vec<MemoryReel>) -> Self {
        let mut cpl = Cpl::new(id);
        cpl.reels = reels.into_iter().map(MemoryReel::build).collect();
        self.cpls.push(cpl);
        self
    }

    /// A recoverable problem reported on every resolution.
    pub fn warning(mut self, message: impl Into<String>) -> Self {
        self.warnings.push(message.into());
        self
    }

    /// An unrecoverable problem: resolution always fails.
    pub fn fatal(mut self, message: impl Into<String>) -> Self {
        self.fatal = Some(message.into());
        self
    }
}

/// A [`PackageLibrary`] over packages held in memory.
#[derive(Debug, Default)]
pub struct MemoryLibrary {
    packages: BTreeMap<PathBuf, MemoryPackage>,
    resolutions: AtomicUsize,
}

impl MemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `package` as the contents of `directory`.
    pub fn insert(&mut self, directory: impl AsRef<Path>, package: MemoryPackage) {
        self.packages
            .insert(directory.as_ref().to_path_buf(), package);
    }

    /// Number of times any directory has been scanned.
    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::Relaxed)
    }
}

impl PackageLibrary for MemoryLibrary {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn find_and_resolve_cpls(&self, directories: &[PathBuf], tolerant: bool) -> Result<Vec<Cpl>> {
        self.resolutions.fetch_add(1, Ordering::Relaxed);

        let mut cpls = Vec::new();
        let mut warnings = Vec::new();

        for directory in directories {
            let Some(package) = self.packages.get(directory) else {
                continue;
            };
            if let Some(fatal) = &package.fatal {
                return Err(Error::invalid_package(format!(
                    "{}: {}",
                    directory.display(),
                    fatal
                )));
            }
            warnings.extend(package.warnings.iter().cloned());
            cpls.extend(package.cpls.iter().cloned());
        }

        if !warnings.is_empty() {
            if !tolerant {
                return Err(Error::Warnings(warnings));
            }
            for warning in &warnings {
                tracing::warn!("Ignoring package problem: {}", warning);
            }
        }

        Ok(cpls)
    }
}
