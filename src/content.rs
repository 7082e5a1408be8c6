//! Descriptions of the output film and of one piece of package content.
//!
//! These are what content examination hands to a decoder: which essences
//! the content carries, how its video relates to the output rate, and which
//! of its assets are to be referenced instead of re-encoded.

use reelplay_media::{
    ContentTime, Cpl, DcpTime, DecryptedKdm, FrameRateChange, PictureKind, Size,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Output settings of the film being played or built.
#[derive(Debug, Clone, PartialEq)]
pub struct Film {
    /// Output video frame rate.
    pub video_frame_rate: i32,
    /// Output audio sampling rate.
    pub audio_frame_rate: u32,
    pub audio_channels: usize,
}

impl Default for Film {
    fn default() -> Self {
        Self {
            video_frame_rate: 24,
            audio_frame_rate: 48_000,
            audio_channels: 6,
        }
    }
}

impl Film {
    pub fn new(video_frame_rate: i32) -> Self {
        Self {
            video_frame_rate,
            ..Default::default()
        }
    }
}

/// How the frames of a video source are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoFrameType {
    #[default]
    TwoD,
    /// Each frame arrives tagged with the eye it belongs to.
    ThreeD,
    /// Frames alternate left, right, left, ...
    ThreeDAlternate,
    /// Both eyes side by side in one frame.
    ThreeDLeftRight,
    /// Both eyes stacked in one frame, left on top.
    ThreeDTopBottom,
    /// Only the left eye of a 3D source is used.
    ThreeDLeft,
    /// Only the right eye of a 3D source is used.
    ThreeDRight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoContent {
    /// Native rate; `None` means "whatever the film runs at".
    pub frame_rate: Option<f64>,
    pub frame_type: VideoFrameType,
    pub size: Size,
    /// Length in frames.
    pub length: i64,
}

impl Default for VideoContent {
    fn default() -> Self {
        Self {
            frame_rate: None,
            frame_type: VideoFrameType::TwoD,
            size: Size::new(1998, 1080),
            length: 0,
        }
    }
}

/// One audio stream of a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioStream {
    pub frame_rate: u32,
    pub channels: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AudioContent {
    pub streams: Vec<AudioStream>,
    /// Delay applied to all streams, in milliseconds; negative plays early.
    pub delay_ms: i32,
}

/// What a text track is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextType {
    /// Subtitles shown on screen to everybody.
    OpenSubtitle,
    /// Captions shown on a separate device.
    ClosedCaption,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextContent {
    pub text_type: TextType,
    pub language: Option<String>,
}

impl TextContent {
    pub fn new(text_type: TextType) -> Self {
        Self {
            text_type,
            language: None,
        }
    }
}

/// A digital-cinema package used as content.
#[derive(Debug, Clone, Default)]
pub struct DcpContent {
    /// Files making up the package.
    pub paths: Vec<PathBuf>,
    /// Playlist to play; the first one found when unset or not found.
    pub cpl: Option<String>,
    pub kdm: Option<DecryptedKdm>,
    /// Whether any asset of the package is encrypted.
    pub encrypted: bool,
    pub trim_start: ContentTime,
    pub trim_end: ContentTime,
    /// Where the content starts in the film.
    pub position: DcpTime,
    pub reference_video: bool,
    pub reference_audio: bool,
    pub reference_open_subtitle: bool,
    pub reference_closed_caption: bool,
    pub video: Option<VideoContent>,
    pub audio: Option<AudioContent>,
    pub text: Vec<TextContent>,
    pub atmos: bool,
}

impl DcpContent {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            ..Default::default()
        }
    }

    /// Whether the content can be decoded with the keys it has.
    pub fn can_be_played(&self) -> bool {
        !self.encrypted || self.kdm.is_some()
    }

    /// Directories holding the package's files, each listed once.
    pub fn directories(&self) -> Vec<PathBuf> {
        let set: BTreeSet<PathBuf> = self
            .paths
            .iter()
            .map(|p| match p.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => p.clone(),
            })
            .collect();
        set.into_iter().collect()
    }

    pub fn reference_text(&self, text_type: TextType) -> bool {
        match text_type {
            TextType::OpenSubtitle => self.reference_open_subtitle,
            TextType::ClosedCaption => self.reference_closed_caption,
        }
    }

    /// Whether anything in the package is referenced rather than decoded.
    pub fn references_anything(&self) -> bool {
        self.reference_video
            || self.reference_audio
            || self.reference_open_subtitle
            || self.reference_closed_caption
    }

    /// Rate at which the content's frames are counted.
    pub fn active_video_frame_rate(&self, film: &Film) -> f64 {
        self.video
            .as_ref()
            .and_then(|v| v.frame_rate)
            .unwrap_or_else(|| f64::from(film.video_frame_rate))
    }

    pub fn frame_rate_change(&self, film: &Film) -> FrameRateChange {
        FrameRateChange::new(self.active_video_frame_rate(film), film.video_frame_rate)
    }

    /// Length of the content in the film, before trimming.
    pub fn full_length(&self, film: &Film) -> DcpTime {
        let frames = self.video.as_ref().map_or(0, |v| v.length);
        let length = ContentTime::from_frames(frames, self.active_video_frame_rate(film));
        DcpTime::from_content(length, &self.frame_rate_change(film))
    }

    /// Length of the content in the film once trimmed.
    pub fn length_after_trim(&self, film: &Film) -> DcpTime {
        let frc = self.frame_rate_change(film);
        let trim = DcpTime::from_content(self.trim_start + self.trim_end, &frc);
        (self.full_length(film) - trim).max(DcpTime::default())
    }

    /// Rate audio is resampled to so that it stays in sync when the video
    /// is sped up or slowed down to fit the film.
    pub fn resampled_frame_rate(&self, film: &Film) -> u32 {
        let rate = f64::from(film.audio_frame_rate);
        let frc = self.frame_rate_change(film);
        if frc.change_speed {
            (rate / frc.speed_up).round() as u32
        } else {
            film.audio_frame_rate
        }
    }

    /// Fill in the essences from a resolved playlist: video from the first
    /// picture, one audio stream from the first sound, a text track for the
    /// subtitles and for each closed-caption track, and object audio.
    pub fn examine(&mut self, cpl: &Cpl) {
        self.cpl = Some(cpl.id.clone());
        self.encrypted = cpl.any_encrypted();

        let frame_type = self.video.as_ref().map_or_else(Default::default, |v| v.frame_type);
        self.video = cpl.reels.iter().find_map(|r| r.main_picture.as_ref()).map(|picture| {
            VideoContent {
                frame_rate: Some(picture.asset.frame_rate()),
                frame_type: match picture.asset.kind() {
                    Some(PictureKind::Stereo) if frame_type == VideoFrameType::TwoD => {
                        VideoFrameType::ThreeD
                    }
                    _ => frame_type,
                },
                size: picture.asset.size(),
                length: cpl.duration(),
            }
        });

        let delay_ms = self.audio.as_ref().map_or(0, |a| a.delay_ms);
        self.audio = cpl.reels.iter().find_map(|r| r.main_sound.as_ref()).map(|sound| {
            AudioContent {
                streams: vec![AudioStream {
                    frame_rate: sound.asset.sampling_rate(),
                    channels: sound.asset.channels(),
                }],
                delay_ms,
            }
        });

        self.text.clear();
        if let Some(subtitle) = cpl.reels.iter().find_map(|r| r.main_subtitle.as_ref()) {
            let mut text = TextContent::new(TextType::OpenSubtitle);
            text.language = subtitle.asset.language().map(str::to_string);
            self.text.push(text);
        }
        let captions = cpl.reels.iter().map(|r| r.closed_captions.len()).max().unwrap_or(0);
        for _ in 0..captions {
            self.text.push(TextContent::new(TextType::ClosedCaption));
        }

        self.atmos = cpl.reels.iter().any(|r| r.atmos.is_some());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directories_are_unique_parents() {
        let content = DcpContent::new(vec![
            PathBuf::from("/dcp/a/picture.mxf"),
            PathBuf::from("/dcp/a/sound.mxf"),
            PathBuf::from("/dcp/b/cpl.xml"),
        ]);
        assert_eq!(
            content.directories(),
            vec![PathBuf::from("/dcp/a"), PathBuf::from("/dcp/b")]
        );
    }

    #[test]
    fn test_can_be_played_needs_key_when_encrypted() {
        let mut content = DcpContent::default();
        assert!(content.can_be_played());
        content.encrypted = true;
        assert!(!content.can_be_played());
        content.kdm = Some(DecryptedKdm::new("kdm", "cpl"));
        assert!(content.can_be_played());
    }

    #[test]
    fn test_resampled_rate_follows_speed_change() {
        let film = Film::new(24);
        let mut content = DcpContent::default();
        assert_eq!(content.resampled_frame_rate(&film), 48_000);

        content.video = Some(VideoContent {
            frame_rate: Some(25.0),
            ..Default::default()
        });
        // 25fps slowed to 24fps: audio must be stretched by 25/24
        assert_eq!(content.resampled_frame_rate(&film), 50_000);
    }

    #[test]
    fn test_full_length_and_trim() {
        let film = Film::new(24);
        let content = DcpContent {
            video: Some(VideoContent {
                length: 48,
                ..Default::default()
            }),
            trim_start: ContentTime::from_frames(12, 24.0),
            ..Default::default()
        };
        assert_eq!(content.full_length(&film), DcpTime::from_seconds(2.0));
        assert_eq!(content.length_after_trim(&film), DcpTime::from_seconds(1.5));
    }

    #[test]
    fn test_examine_fills_essences() {
        use reelplay_media::memory::MemoryReel;
        use reelplay_media::{Subtitle, SubtitleString};

        let cue = Subtitle::String(SubtitleString::new(
            "hi",
            ContentTime::default(),
            ContentTime::from_seconds(1.0),
        ));
        let mut cpl = Cpl::new("cpl-1");
        cpl.reels = vec![
            MemoryReel::new("r1")
                .frame_rate(25)
                .stereo_picture(50)
                .sound(50, 2)
                .closed_caption(50, vec![cue.clone()])
                .build(),
            MemoryReel::new("r2")
                .frame_rate(25)
                .stereo_picture(25)
                .sound(25, 2)
                .subtitle(25, vec![cue])
                .atmos(25)
                .build(),
        ];

        let mut content = DcpContent::default();
        content.examine(&cpl);
        let video = content.video.as_ref().unwrap();
        assert_eq!(video.frame_rate, Some(25.0));
        assert_eq!(video.frame_type, VideoFrameType::ThreeD);
        assert_eq!(video.length, 75);
        assert_eq!(content.audio.as_ref().unwrap().streams[0].channels, 2);
        assert_eq!(
            content.text.iter().map(|t| t.text_type).collect::<Vec<_>>(),
            vec![TextType::OpenSubtitle, TextType::ClosedCaption]
        );
        assert!(content.atmos);
        assert_eq!(content.cpl.as_deref(), Some("cpl-1"));
    }
}
