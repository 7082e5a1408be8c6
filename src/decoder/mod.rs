//! Decoders and the per-essence parts they own.
//!
//! A decoder reads one piece of content and hands what it reads to its
//! parts, one per essence. Parts turn reads into timestamped events for an
//! [`EventSink`] and keep track of how far they have got.

pub mod atmos;
pub mod audio;
pub mod resampler;
pub mod text;
pub mod video;

pub use atmos::AtmosDecoder;
pub use audio::AudioDecoder;
pub use resampler::Resampler;
pub use text::TextDecoder;
pub use video::VideoDecoder;

use crate::content::{Film, TextType};
use crate::events::EventSink;
use crate::Result;
use reelplay_media::ContentTime;

/// What every per-essence part of a decoder can do.
pub trait DecoderPart {
    /// Content time of the next thing this part will emit, or `None` if it
    /// has emitted nothing since the last seek or is ignored.
    fn position(&self, film: &Film) -> Option<ContentTime>;

    /// Forget everything emitted so far. The owning decoder moves the
    /// readers.
    fn seek(&mut self);

    /// Whether emission is suppressed.
    fn ignore(&self) -> bool;

    fn set_ignore(&mut self, ignore: bool);
}

/// The parts of one decoder; any of them may be absent.
#[derive(Debug, Default)]
pub struct DecoderParts {
    pub video: Option<VideoDecoder>,
    pub audio: Option<AudioDecoder>,
    pub text: Vec<TextDecoder>,
    pub atmos: Option<AtmosDecoder>,
}

impl DecoderParts {
    /// How far the decoder has got.
    ///
    /// The earliest position of the active video and audio parts. Text only
    /// counts when neither gives a position, as a text track that ends early
    /// would otherwise hold the whole decoder back; object audio counts last
    /// of all.
    pub fn position(&self, film: &Film) -> Option<ContentTime> {
        fn earliest<P: DecoderPart>(pos: &mut Option<ContentTime>, part: &P, film: &Film) {
            if part.ignore() {
                return;
            }
            if let Some(p) = part.position(film) {
                if pos.map_or(true, |current| p < current) {
                    *pos = Some(p);
                }
            }
        }

        let mut pos = None;
        if let Some(video) = &self.video {
            earliest(&mut pos, video, film);
        }
        if let Some(audio) = &self.audio {
            earliest(&mut pos, audio, film);
        }
        if pos.is_none() {
            for text in &self.text {
                earliest(&mut pos, text, film);
            }
        }
        if pos.is_none() {
            if let Some(atmos) = &self.atmos {
                earliest(&mut pos, atmos, film);
            }
        }
        pos
    }

    pub fn seek(&mut self) {
        if let Some(video) = &mut self.video {
            video.seek();
        }
        if let Some(audio) = &mut self.audio {
            audio.seek();
        }
        for text in &mut self.text {
            text.seek();
        }
        if let Some(atmos) = &mut self.atmos {
            atmos.seek();
        }
    }

    /// The `index`th text part of `text_type`.
    pub fn text_of_type(&mut self, text_type: TextType, index: usize) -> Option<&mut TextDecoder> {
        self.text
            .iter_mut()
            .filter(|t| t.text_type() == text_type)
            .nth(index)
    }
}

/// Outcome of one [`Decoder::pass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Something may have been emitted; call again.
    Continued,
    /// Nothing left until the next seek.
    Exhausted,
}

impl Pass {
    pub fn is_exhausted(self) -> bool {
        self == Pass::Exhausted
    }
}

/// A source of content events, pulled one step at a time.
pub trait Decoder {
    fn parts(&self) -> &DecoderParts;

    fn parts_mut(&mut self) -> &mut DecoderParts;

    /// Read and emit the next unit of content.
    fn pass(&mut self, sink: &mut dyn EventSink) -> Result<Pass>;

    /// Move the decoder's own readers so that the next pass emits from
    /// `time`. Parts have already been reset.
    fn seek_content(
        &mut self,
        time: ContentTime,
        accurate: bool,
        sink: &mut dyn EventSink,
    ) -> Result<()>;

    /// Reset every part, then reposition at `time`.
    ///
    /// `accurate` asks for the next emission to be at exactly `time`, at
    /// whatever extra cost.
    fn seek(&mut self, time: ContentTime, accurate: bool, sink: &mut dyn EventSink) -> Result<()> {
        tracing::debug!("Seeking to {} (accurate: {})", time, accurate);
        self.parts_mut().seek();
        self.seek_content(time, accurate, sink)
    }

    /// Earliest position of the decoder's active parts.
    fn position(&self, film: &Film) -> Option<ContentTime> {
        self.parts().position(film)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{AudioContent, AudioStream, DcpContent};
    use crate::events::{EventLog, J2kImageProxy};
    use bytes::Bytes;
    use reelplay_media::{AudioBuffers, ContentTimePeriod, Size, SubtitleString};
    use std::sync::Arc;

    fn content() -> Arc<DcpContent> {
        Arc::new(DcpContent {
            audio: Some(AudioContent {
                streams: vec![AudioStream {
                    frame_rate: 48_000,
                    channels: 1,
                }],
                delay_ms: 0,
            }),
            ..Default::default()
        })
    }

    fn image() -> J2kImageProxy {
        J2kImageProxy {
            data: Bytes::new(),
            size: Size::new(1998, 1080),
            eye: None,
            reduction: None,
        }
    }

    fn emit_text(parts: &mut DecoderParts, at: f64, log: &mut EventLog) {
        let from = ContentTime::from_seconds(at);
        let period = ContentTimePeriod::new(from, from + ContentTime::from_seconds(1.0));
        parts.text[0].emit_plain(period, vec![SubtitleString::new("x", period.from, period.to)], log);
    }

    #[test]
    fn test_position_is_earliest_of_video_and_audio() {
        let film = Film::default();
        let mut parts = DecoderParts {
            video: Some(VideoDecoder::new(content())),
            audio: Some(AudioDecoder::new(content())),
            ..Default::default()
        };
        let mut log = EventLog::new();
        assert_eq!(parts.position(&film), None);

        parts.video.as_mut().unwrap().emit(&film, image(), 23, &mut log);
        parts.audio.as_mut().unwrap().emit(
            &film,
            0,
            &AudioBuffers::new(1, 2000),
            ContentTime::from_frames(4, 24.0),
            false,
            &mut log,
        );
        // video's next frame is 24, audio has reached frame 5
        assert_eq!(parts.position(&film), Some(ContentTime::from_frames(5, 24.0)));

        parts.audio.as_mut().unwrap().set_ignore(true);
        assert_eq!(parts.position(&film), Some(ContentTime::from_frames(24, 24.0)));
    }

    #[test]
    fn test_text_only_counts_without_video_or_audio() {
        let film = Film::default();
        let mut parts = DecoderParts {
            video: Some(VideoDecoder::new(content())),
            text: vec![TextDecoder::new(TextType::OpenSubtitle)],
            ..Default::default()
        };
        let mut log = EventLog::new();
        parts.video.as_mut().unwrap().emit(&film, image(), 95, &mut log);
        emit_text(&mut parts, 1.0, &mut log);
        assert_eq!(parts.position(&film), Some(ContentTime::from_seconds(4.0)));

        parts.video = None;
        assert_eq!(parts.position(&film), Some(ContentTime::from_seconds(1.0)));

        parts.seek();
        assert_eq!(parts.position(&film), None);
    }

    #[test]
    fn test_pass_outcome() {
        assert!(Pass::Exhausted.is_exhausted());
        assert!(!Pass::Continued.is_exhausted());
    }

    #[test]
    fn test_text_of_type() {
        let mut parts = DecoderParts {
            text: vec![
                TextDecoder::new(TextType::OpenSubtitle),
                TextDecoder::new(TextType::ClosedCaption),
                TextDecoder::new(TextType::ClosedCaption),
            ],
            ..Default::default()
        };
        assert!(parts.text_of_type(TextType::OpenSubtitle, 0).is_some());
        assert!(parts.text_of_type(TextType::OpenSubtitle, 1).is_none());
        assert!(parts.text_of_type(TextType::ClosedCaption, 1).is_some());
    }
}
