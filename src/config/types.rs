use crate::content::Film;
use reelplay_media::ContentTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub film: FilmConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,
}

/// Output settings that decoded content is fitted to.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilmConfig {
    #[serde(default = "default_video_frame_rate")]
    pub video_frame_rate: i32,

    #[serde(default = "default_audio_frame_rate")]
    pub audio_frame_rate: u32,

    #[serde(default = "default_audio_channels")]
    pub audio_channels: usize,
}

fn default_video_frame_rate() -> i32 {
    24
}
fn default_audio_frame_rate() -> u32 {
    48_000
}
fn default_audio_channels() -> usize {
    6
}

impl Default for FilmConfig {
    fn default() -> Self {
        Self {
            video_frame_rate: default_video_frame_rate(),
            audio_frame_rate: default_audio_frame_rate(),
            audio_channels: default_audio_channels(),
        }
    }
}

impl FilmConfig {
    pub fn film(&self) -> Film {
        Film {
            video_frame_rate: self.video_frame_rate,
            audio_frame_rate: self.audio_frame_rate,
            audio_channels: self.audio_channels,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackConfig {
    /// Seconds of text replayed before a seek target (default: 2)
    #[serde(default = "default_preroll_secs")]
    pub preroll_secs: f64,

    /// Log recoverable package problems instead of failing
    #[serde(default)]
    pub tolerant: bool,

    /// Decode assets that are marked to be referenced
    #[serde(default)]
    pub decode_referenced: bool,

    /// Resolution levels to discard when decoding pictures
    #[serde(default)]
    pub forced_reduction: Option<u32>,
}

fn default_preroll_secs() -> f64 {
    crate::dcp_decoder::DEFAULT_PREROLL_SECONDS
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            preroll_secs: default_preroll_secs(),
            tolerant: false,
            decode_referenced: false,
            forced_reduction: None,
        }
    }
}

impl PlaybackConfig {
    pub fn preroll(&self) -> ContentTime {
        ContentTime::from_seconds(self.preroll_secs)
    }
}
