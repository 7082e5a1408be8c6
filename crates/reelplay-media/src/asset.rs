//! Interfaces to the assets a package library hands out.
//!
//! The library owns the binary layout of the package; these traits are the
//! narrow surface playback needs: identity, duration, and a reader that
//! returns frame `n` of the underlying file on request.

use crate::key::DecryptionKey;
use crate::time::ContentTime;
use crate::Result;
use bytes::Bytes;
use std::fmt;

/// Picture dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Identity and length shared by every asset.
pub trait Asset: Send + Sync + fmt::Debug {
    fn id(&self) -> &str;

    /// Number of edit units in the underlying file.
    fn intrinsic_duration(&self) -> i64;

    /// Id of the key needed to read this asset, if it is encrypted.
    fn key_id(&self) -> Option<&str> {
        None
    }
}

/// Sequential or random access to the frames of one asset.
pub trait FrameReader<F>: Send {
    /// Enable or disable verification of the per-frame authentication tag.
    fn set_check_hmac(&mut self, check: bool);

    /// Read edit unit `index` of the underlying file (entry point already applied).
    fn get_frame(&mut self, index: i64) -> Result<F>;
}

pub type BoxedFrameReader<F> = Box<dyn FrameReader<F>>;

/// Whether a picture asset carries one image per frame or one per eye.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PictureKind {
    Mono,
    Stereo,
}

/// Both eyes of one stereoscopic frame, as JPEG2000 codestreams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StereoPictureFrame {
    pub left: Bytes,
    pub right: Bytes,
}

pub trait PictureAsset: Asset {
    /// `None` when the asset is neither mono nor stereo.
    fn kind(&self) -> Option<PictureKind>;

    fn size(&self) -> Size;

    /// Edit rate in frames per second.
    fn frame_rate(&self) -> f64;

    fn start_mono_read(&self, key: Option<&DecryptionKey>) -> Result<BoxedFrameReader<Bytes>>;

    fn start_stereo_read(
        &self,
        key: Option<&DecryptionKey>,
    ) -> Result<BoxedFrameReader<StereoPictureFrame>>;
}

/// Sound essence: each frame is interleaved big-endian PCM24.
pub trait SoundAsset: Asset {
    fn channels(&self) -> usize;

    fn sampling_rate(&self) -> u32;

    fn start_read(&self, key: Option<&DecryptionKey>) -> Result<BoxedFrameReader<Bytes>>;
}

/// Object-audio essence and the metadata that travels with every frame.
pub trait AtmosAsset: Asset {
    fn first_frame(&self) -> i64;

    fn max_channel_count(&self) -> u32;

    fn max_object_count(&self) -> u32;

    fn atmos_version(&self) -> u32;

    fn start_read(&self, key: Option<&DecryptionKey>) -> Result<BoxedFrameReader<Bytes>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VAlign {
    Top,
    Center,
    #[default]
    Bottom,
}

/// A line of styled text with its timing on the asset's own timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleString {
    pub font: Option<String>,
    pub italic: bool,
    pub bold: bool,
    pub size: u32,
    pub h_align: HAlign,
    pub h_position: f32,
    pub v_align: VAlign,
    pub v_position: f32,
    pub text: String,
    pub in_time: ContentTime,
    pub out_time: ContentTime,
}

impl SubtitleString {
    /// Bottom-centred text with default styling.
    pub fn new(text: impl Into<String>, in_time: ContentTime, out_time: ContentTime) -> Self {
        Self {
            font: None,
            italic: false,
            bold: false,
            size: 42,
            h_align: HAlign::Center,
            h_position: 0.0,
            v_align: VAlign::Bottom,
            v_position: 0.1,
            text: text.into(),
            in_time,
            out_time,
        }
    }
}

/// A PNG subtitle positioned relative to the picture.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleImage {
    pub png: Bytes,
    pub width: u32,
    pub height: u32,
    pub h_align: HAlign,
    pub h_position: f32,
    pub v_align: VAlign,
    pub v_position: f32,
    pub in_time: ContentTime,
    pub out_time: ContentTime,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Subtitle {
    String(SubtitleString),
    Image(SubtitleImage),
}

impl Subtitle {
    pub fn in_time(&self) -> ContentTime {
        match self {
            Subtitle::String(s) => s.in_time,
            Subtitle::Image(i) => i.in_time,
        }
    }

    pub fn out_time(&self) -> ContentTime {
        match self {
            Subtitle::String(s) => s.out_time,
            Subtitle::Image(i) => i.out_time,
        }
    }
}

/// A font embedded in a subtitle asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontData {
    pub id: String,
    pub data: Bytes,
}

pub trait SubtitleAsset: Asset {
    fn language(&self) -> Option<&str> {
        None
    }

    /// Every subtitle in the asset, in no particular order.
    fn subtitles(&self) -> &[Subtitle];

    /// Subtitles active in `[from, to)` of the asset timeline, ordered by in
    /// time then out time.
    ///
    /// With `starting` set only subtitles whose in time falls inside the
    /// window are returned.
    fn subtitles_during(&self, from: ContentTime, to: ContentTime, starting: bool) -> Vec<Subtitle> {
        let mut out: Vec<Subtitle> = self
            .subtitles()
            .iter()
            .filter(|s| {
                if starting {
                    from <= s.in_time() && s.in_time() < to
                } else {
                    s.in_time() < to && s.out_time() > from
                }
            })
            .cloned()
            .collect();
        out.sort_by_key(|s| (s.in_time(), s.out_time()));
        out
    }

    fn font_data(&self) -> Vec<FontData> {
        Vec::new()
    }
}
