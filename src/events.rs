//! Typed events produced by decoders and the sink that receives them.

use crate::content::TextType;
use bytes::Bytes;
use reelplay_media::{AudioBuffers, ContentTimePeriod, Size, SubtitleImage, SubtitleString};

/// One eye of a stereoscopic picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eye {
    Left,
    Right,
}

/// Which eyes a video frame is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eyes {
    Both,
    Left,
    Right,
}

impl From<Eye> for Eyes {
    fn from(eye: Eye) -> Self {
        match eye {
            Eye::Left => Eyes::Left,
            Eye::Right => Eyes::Right,
        }
    }
}

/// Which part of a decoded image a video frame uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    Whole,
    LeftHalf,
    RightHalf,
    TopHalf,
    BottomHalf,
}

/// A JPEG2000 codestream waiting to be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct J2kImageProxy {
    pub data: Bytes,
    pub size: Size,
    /// Eye of a stereoscopic frame the codestream holds.
    pub eye: Option<Eye>,
    /// Number of resolution levels to discard when decoding.
    pub reduction: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentVideo {
    pub image: J2kImageProxy,
    /// Frame index in content frames.
    pub frame: i64,
    pub eyes: Eyes,
    pub part: Part,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentAudio {
    pub audio: AudioBuffers,
    /// Index of the first sample at the stream's resampled rate.
    pub frame: i64,
}

/// Text cues sharing one period.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentStringText {
    pub period: ContentTimePeriod,
    pub text_type: TextType,
    pub subs: Vec<SubtitleString>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentBitmapText {
    pub period: ContentTimePeriod,
    pub text_type: TextType,
    pub image: SubtitleImage,
}

/// Description of the object-audio stream, captured when its reader opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtmosMetadata {
    pub first_frame: i64,
    pub max_channel_count: u32,
    pub max_object_count: u32,
    pub atmos_version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentAtmos {
    pub data: Bytes,
    /// Frame index at the output rate.
    pub frame: i64,
    pub metadata: AtmosMetadata,
}

/// Receives what a decoder emits.
///
/// Events arrive in emission order. For any one frame, text is delivered
/// before video. Every method defaults to dropping the event.
pub trait EventSink {
    fn video(&mut self, _video: ContentVideo) {}

    fn audio(&mut self, _stream: usize, _audio: ContentAudio) {}

    fn plain_text(&mut self, _text: ContentStringText) {}

    fn bitmap_text(&mut self, _text: ContentBitmapText) {}

    fn atmos(&mut self, _atmos: ContentAtmos) {}
}

/// A sink that throws everything away.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {}

/// Any event, for sinks that keep them.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Video(ContentVideo),
    Audio(usize, ContentAudio),
    PlainText(ContentStringText),
    BitmapText(ContentBitmapText),
    Atmos(ContentAtmos),
}

/// A sink that records every event in order.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    pub events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn videos(&self) -> impl Iterator<Item = &ContentVideo> {
        self.events.iter().filter_map(|e| match e {
            Event::Video(v) => Some(v),
            _ => None,
        })
    }

    pub fn audios(&self) -> impl Iterator<Item = (usize, &ContentAudio)> {
        self.events.iter().filter_map(|e| match e {
            Event::Audio(stream, a) => Some((*stream, a)),
            _ => None,
        })
    }

    pub fn plain_texts(&self) -> impl Iterator<Item = &ContentStringText> {
        self.events.iter().filter_map(|e| match e {
            Event::PlainText(t) => Some(t),
            _ => None,
        })
    }

    pub fn bitmap_texts(&self) -> impl Iterator<Item = &ContentBitmapText> {
        self.events.iter().filter_map(|e| match e {
            Event::BitmapText(t) => Some(t),
            _ => None,
        })
    }

    pub fn atmos(&self) -> impl Iterator<Item = &ContentAtmos> {
        self.events.iter().filter_map(|e| match e {
            Event::Atmos(a) => Some(a),
            _ => None,
        })
    }
}

impl EventSink for EventLog {
    fn video(&mut self, video: ContentVideo) {
        self.events.push(Event::Video(video));
    }

    fn audio(&mut self, stream: usize, audio: ContentAudio) {
        self.events.push(Event::Audio(stream, audio));
    }

    fn plain_text(&mut self, text: ContentStringText) {
        self.events.push(Event::PlainText(text));
    }

    fn bitmap_text(&mut self, text: ContentBitmapText) {
        self.events.push(Event::BitmapText(text));
    }

    fn atmos(&mut self, atmos: ContentAtmos) {
        self.events.push(Event::Atmos(atmos));
    }
}
