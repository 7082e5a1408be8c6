//! Reels, the assets they place on the timeline, and the playlists that
//! order them.

use crate::asset::{Asset, AtmosAsset, PictureAsset, SoundAsset, SubtitleAsset};
use crate::key::{DecryptedKdm, DecryptionKey};
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// One asset as a reel uses it: which part of the underlying file plays.
pub struct ReelAsset<A: ?Sized> {
    pub id: String,
    pub asset: Arc<A>,
    /// First edit unit of the file that is played.
    pub entry_point: Option<i64>,
    /// Number of edit units played; `None` means "to the end of the file".
    pub duration: Option<i64>,
    pub intrinsic_duration: i64,
    pub key_id: Option<String>,
    /// Content key, once key material has been applied.
    pub key: Option<DecryptionKey>,
}

impl<A: Asset + ?Sized> ReelAsset<A> {
    /// Play the whole of `asset`.
    pub fn new(asset: Arc<A>) -> Self {
        Self {
            id: asset.id().to_string(),
            intrinsic_duration: asset.intrinsic_duration(),
            key_id: asset.key_id().map(str::to_string),
            asset,
            entry_point: None,
            duration: None,
            key: None,
        }
    }
}

impl<A: ?Sized> ReelAsset<A> {
    pub fn entry_point_or_zero(&self) -> i64 {
        self.entry_point.unwrap_or(0)
    }

    /// Edit units that actually play.
    pub fn actual_duration(&self) -> i64 {
        self.duration
            .unwrap_or(self.intrinsic_duration - self.entry_point_or_zero())
    }

    pub fn set_entry_point(&mut self, entry_point: i64) {
        self.entry_point = Some(entry_point);
    }

    pub fn set_duration(&mut self, duration: i64) {
        self.duration = Some(duration);
    }

    pub fn is_encrypted(&self) -> bool {
        self.key_id.is_some()
    }

    fn apply_kdm(&mut self, kdm: &DecryptedKdm) {
        if let Some(key_id) = &self.key_id {
            if let Some(key) = kdm.key(key_id) {
                self.key = Some(key.clone());
            }
        }
    }
}

impl<A: ?Sized> Clone for ReelAsset<A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            asset: Arc::clone(&self.asset),
            entry_point: self.entry_point,
            duration: self.duration,
            intrinsic_duration: self.intrinsic_duration,
            key_id: self.key_id.clone(),
            key: self.key.clone(),
        }
    }
}

impl<A: ?Sized> fmt::Debug for ReelAsset<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReelAsset")
            .field("id", &self.id)
            .field("entry_point", &self.entry_point)
            .field("duration", &self.duration)
            .field("intrinsic_duration", &self.intrinsic_duration)
            .field("key_id", &self.key_id)
            .field("has_key", &self.key.is_some())
            .finish()
    }
}

pub type ReelPictureAsset = ReelAsset<dyn PictureAsset>;
pub type ReelSoundAsset = ReelAsset<dyn SoundAsset>;
pub type ReelTextAsset = ReelAsset<dyn SubtitleAsset>;
pub type ReelAtmosAsset = ReelAsset<dyn AtmosAsset>;

/// A time-contiguous unit of a playlist.
#[derive(Debug, Clone, Default)]
pub struct Reel {
    pub id: String,
    pub main_picture: Option<ReelPictureAsset>,
    pub main_sound: Option<ReelSoundAsset>,
    pub main_subtitle: Option<ReelTextAsset>,
    pub closed_captions: Vec<ReelTextAsset>,
    pub atmos: Option<ReelAtmosAsset>,
}

impl Reel {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Length of the reel in frames: the picture's, or the sound's when
    /// there is no picture.
    pub fn duration(&self) -> i64 {
        if let Some(picture) = &self.main_picture {
            picture.actual_duration()
        } else if let Some(sound) = &self.main_sound {
            sound.actual_duration()
        } else {
            0
        }
    }

    pub fn is_encrypted(&self) -> bool {
        self.main_picture.as_ref().is_some_and(ReelAsset::is_encrypted)
            || self.main_sound.as_ref().is_some_and(ReelAsset::is_encrypted)
            || self.main_subtitle.as_ref().is_some_and(ReelAsset::is_encrypted)
            || self.closed_captions.iter().any(ReelAsset::is_encrypted)
            || self.atmos.as_ref().is_some_and(ReelAsset::is_encrypted)
    }

    fn apply_kdm(&mut self, kdm: &DecryptedKdm) {
        if let Some(a) = &mut self.main_picture {
            a.apply_kdm(kdm);
        }
        if let Some(a) = &mut self.main_sound {
            a.apply_kdm(kdm);
        }
        if let Some(a) = &mut self.main_subtitle {
            a.apply_kdm(kdm);
        }
        for a in &mut self.closed_captions {
            a.apply_kdm(kdm);
        }
        if let Some(a) = &mut self.atmos {
            a.apply_kdm(kdm);
        }
    }
}

/// A content playlist: one version of the content as an ordered list of reels.
#[derive(Debug, Clone)]
pub struct Cpl {
    pub id: String,
    pub annotation_text: Option<String>,
    pub reels: Vec<Reel>,
}

impl Cpl {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            annotation_text: None,
            reels: Vec::new(),
        }
    }

    pub fn any_encrypted(&self) -> bool {
        self.reels.iter().any(Reel::is_encrypted)
    }

    /// Attach the content keys in `kdm` to every encrypted asset they unlock.
    ///
    /// Fails if the key material was issued for a different playlist.
    pub fn add_kdm(&mut self, kdm: &DecryptedKdm) -> Result<()> {
        if kdm.cpl_id() != self.id {
            return Err(Error::decryption(format!(
                "key material {} is for CPL {}, not {}",
                kdm.id(),
                kdm.cpl_id(),
                self.id
            )));
        }

        for reel in &mut self.reels {
            reel.apply_kdm(kdm);
        }
        Ok(())
    }

    /// Total length in frames.
    pub fn duration(&self) -> i64 {
        self.reels.iter().map(Reel::duration).sum()
    }
}
