//! TOML description of a synthetic package.
//!
//! ```toml
//! directory = "/dcp/feature"
//! warnings = ["Reel 2 has an odd edit rate"]
//!
//! [[cpl]]
//! id = "cpl-feature"
//!
//! [[cpl.reel]]
//! id = "r1"
//! picture = 24
//! sound = 24
//! channels = 6
//!
//! [[cpl.reel.subtitle]]
//! text = "Hello"
//! in = 0.5
//! out = 2.0
//! ```
//!
//! Unknown keys are ignored so a manifest can carry settings for other
//! consumers alongside the package itself.

use super::{MemoryAtmos, MemoryPackage, MemoryPicture, MemoryReel, MemorySound, MemorySubtitle};
use crate::asset::{PictureKind, Subtitle, SubtitleString};
use crate::key::DecryptionKey;
use crate::time::ContentTime;
use crate::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct PackageManifest {
    pub directory: PathBuf,

    #[serde(default)]
    pub warnings: Vec<String>,

    #[serde(default)]
    pub cpl: Vec<CplManifest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CplManifest {
    pub id: String,

    #[serde(default)]
    pub annotation: Option<String>,

    #[serde(default)]
    pub reel: Vec<ReelManifest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReelManifest {
    pub id: String,

    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// Picture length in frames.
    #[serde(default)]
    pub picture: Option<i64>,

    #[serde(default)]
    pub stereo: bool,

    /// Sound length in frames.
    #[serde(default)]
    pub sound: Option<i64>,

    #[serde(default = "default_channels")]
    pub channels: usize,

    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: u32,

    /// Object-audio length in frames.
    #[serde(default)]
    pub atmos: Option<i64>,

    #[serde(default)]
    pub entry_point: Option<i64>,

    #[serde(default)]
    pub duration: Option<i64>,

    /// Picture and sound are encrypted with this key.
    #[serde(default)]
    pub key: Option<KeyManifest>,

    #[serde(default)]
    pub subtitle: Vec<CueManifest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyManifest {
    pub id: String,
    pub value: [u8; 16],
}

#[derive(Debug, Clone, Deserialize)]
pub struct CueManifest {
    pub text: String,

    /// Seconds from the start of the asset.
    #[serde(rename = "in")]
    pub in_secs: f64,

    #[serde(rename = "out")]
    pub out_secs: f64,

    #[serde(default)]
    pub font: Option<String>,

    /// Closed-caption track number; main subtitle when absent.
    #[serde(default)]
    pub caption: Option<usize>,
}

fn default_frame_rate() -> u32 {
    24
}

fn default_channels() -> usize {
    6
}

fn default_sampling_rate() -> u32 {
    48_000
}

impl PackageManifest {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn into_package(self) -> MemoryPackage {
        let mut package = MemoryPackage::new();
        for warning in self.warnings {
            package = package.warning(warning);
        }
        for cpl in self.cpl {
            let reels = cpl.reel.into_iter().map(ReelManifest::into_reel).collect();
            package = package.cpl(cpl.id, reels);
            if let (Some(annotation), Some(last)) = (cpl.annotation, package.cpls.last_mut()) {
                last.annotation_text = Some(annotation);
            }
        }
        package
    }
}

impl ReelManifest {
    fn length(&self) -> i64 {
        self.picture.or(self.sound).unwrap_or(0)
    }

    fn into_reel(self) -> MemoryReel {
        let length = self.length();
        let key = self
            .key
            .as_ref()
            .map(|k| (k.id.clone(), DecryptionKey::new(k.value)));

        let mut reel = MemoryReel::new(&self.id).frame_rate(self.frame_rate);

        if let Some(duration) = self.picture {
            let kind = if self.stereo {
                PictureKind::Stereo
            } else {
                PictureKind::Mono
            };
            let mut picture = MemoryPicture::new(format!("{}-picture", self.id), Some(kind), duration)
                .with_frame_rate(f64::from(self.frame_rate));
            if let Some((id, value)) = &key {
                picture = picture.encrypted(id, value.clone());
            }
            reel = reel.picture_asset(picture);
        }

        if let Some(duration) = self.sound {
            let mut sound = MemorySound::new(format!("{}-sound", self.id), self.channels, duration)
                .with_rates(self.sampling_rate, self.frame_rate);
            if let Some((id, value)) = &key {
                sound = sound.encrypted(id, value.clone());
            }
            reel = reel.sound_asset(sound);
        }

        if let Some(duration) = self.atmos {
            reel = reel.atmos_asset(MemoryAtmos::new(format!("{}-atmos", self.id), duration));
        }

        let mut main = Vec::new();
        let mut captions: Vec<Vec<Subtitle>> = Vec::new();
        for cue in self.subtitle {
            let track = cue.caption;
            let subtitle = cue.into_subtitle();
            match track {
                None => main.push(subtitle),
                Some(n) => {
                    if captions.len() <= n {
                        captions.resize_with(n + 1, Vec::new);
                    }
                    captions[n].push(subtitle);
                }
            }
        }
        if !main.is_empty() {
            reel = reel.subtitle_asset(MemorySubtitle::new(
                format!("{}-subtitle", self.id),
                length,
                main,
            ));
        }
        for track in captions {
            reel = reel.closed_caption(length, track);
        }

        match (self.entry_point, self.duration) {
            (None, None) => reel,
            (entry_point, duration) => {
                let entry_point = entry_point.unwrap_or(0);
                reel.trimmed(entry_point, duration.unwrap_or(length - entry_point))
            }
        }
    }
}

impl CueManifest {
    fn into_subtitle(self) -> Subtitle {
        let mut string = SubtitleString::new(
            self.text,
            ContentTime::from_seconds(self.in_secs),
            ContentTime::from_seconds(self.out_secs),
        );
        string.font = self.font;
        Subtitle::String(string)
    }
}
