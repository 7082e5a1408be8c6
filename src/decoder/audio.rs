//! Audio part: resamples each stream to the film's rate and timestamps it
//! by counting samples.

use super::resampler::Resampler;
use super::DecoderPart;
use crate::content::{DcpContent, Film};
use crate::events::{ContentAudio, EventSink};
use reelplay_media::{AudioBuffers, ContentTime};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct StreamState {
    /// Next sample to emit, at the resampled rate; `None` until the first
    /// emission after a seek.
    position: Option<i64>,
    resampler: Option<Resampler>,
}

#[derive(Debug)]
pub struct AudioDecoder {
    content: Arc<DcpContent>,
    streams: BTreeMap<usize, StreamState>,
    ignore: bool,
}

impl AudioDecoder {
    pub fn new(content: Arc<DcpContent>) -> Self {
        Self {
            content,
            streams: BTreeMap::new(),
            ignore: false,
        }
    }

    fn delay_ms(&self) -> i32 {
        self.content.audio.as_ref().map_or(0, |a| a.delay_ms)
    }

    fn stream_channels(&self, stream: usize) -> Option<usize> {
        self.content
            .audio
            .as_ref()
            .and_then(|a| a.streams.get(stream))
            .map(|s| s.channels)
    }

    /// Emit `data` from `stream`, which the source says starts at `time`.
    ///
    /// `time` only places the first block after a seek, or a block that
    /// strays more than a 24fps frame from the counted position; otherwise
    /// blocks follow on from each other without gaps or overlaps.
    /// The content's audio delay is applied unless `already_delayed`.
    pub fn emit(
        &mut self,
        film: &Film,
        stream: usize,
        data: &AudioBuffers,
        time: ContentTime,
        already_delayed: bool,
        sink: &mut dyn EventSink,
    ) {
        if self.ignore {
            return;
        }

        let rate = self.content.resampled_frame_rate(film);
        let delay_ms = if already_delayed { 0 } else { self.delay_ms() };
        let delay = i64::from(delay_ms) * i64::from(rate) / 1000;
        let native = self
            .content
            .audio
            .as_ref()
            .and_then(|a| a.streams.get(stream))
            .map_or(rate, |s| s.frame_rate);

        let state = self.streams.entry(stream).or_default();
        if state.resampler.is_none() && native != rate {
            tracing::debug!(
                "Creating resampler from {} to {} for stream {}",
                native,
                rate,
                stream
            );
            state.resampler = Some(Resampler::new(native, rate, data.channels()));
        }

        let mut block = match &mut state.resampler {
            Some(resampler) => resampler.run(data),
            None => data.clone(),
        };

        let start = time.frames_round(f64::from(rate));
        let mut position = match state.position {
            // first block since a seek: a late start is heard as leading silence
            None if delay > 0 => {
                block = block.padded_front(delay as usize);
                start
            }
            None => start + delay,
            Some(position) => {
                let expected = start + delay;
                if (position - expected).abs() > i64::from(rate) / 24 {
                    tracing::warn!(
                        "Audio stream {} position reset from {} to {}",
                        stream,
                        position,
                        expected
                    );
                    expected
                } else {
                    position
                }
            }
        };

        // an early start drops whatever would play before the content begins
        if position < 0 {
            let dropped = ((-position) as usize).min(block.frames());
            block = drop_front(&block, dropped);
            position += dropped as i64;
        }

        if block.is_empty() {
            state.position = Some(position);
            return;
        }

        state.position = Some(position + block.frames() as i64);
        sink.audio(
            stream,
            ContentAudio {
                audio: block,
                frame: position,
            },
        );
    }

    /// Drain every stream's resampler, and play out a negative delay as
    /// trailing silence so the content keeps its length.
    pub fn flush(&mut self, film: &Film, sink: &mut dyn EventSink) {
        if self.ignore {
            return;
        }

        let rate = self.content.resampled_frame_rate(film);
        let trailing = match self.delay_ms() {
            d if d < 0 => (i64::from(-d) * i64::from(rate) / 1000) as usize,
            _ => 0,
        };

        let content = Arc::clone(&self.content);
        for (&stream, state) in &mut self.streams {
            let Some(position) = state.position else {
                continue;
            };
            let channels = content
                .audio
                .as_ref()
                .and_then(|a| a.streams.get(stream))
                .map_or(0, |s| s.channels);

            let mut block = match &mut state.resampler {
                Some(resampler) => resampler.flush(),
                None => AudioBuffers::new(channels, 0),
            };
            if trailing > 0 {
                block.append(&AudioBuffers::new(block.channels(), trailing));
            }
            if block.is_empty() {
                continue;
            }

            let position = position.max(0);
            state.position = Some(position + block.frames() as i64);
            sink.audio(
                stream,
                ContentAudio {
                    audio: block,
                    frame: position,
                },
            );
        }
    }

    /// A silent block of `ms` milliseconds at the resampled rate.
    pub fn silence(&self, film: &Film, ms: u32) -> AudioBuffers {
        let channels = self.stream_channels(0).unwrap_or(film.audio_channels);
        let rate = u64::from(self.content.resampled_frame_rate(film));
        AudioBuffers::new(channels, (u64::from(ms) * rate / 1000) as usize)
    }
}

fn drop_front(block: &AudioBuffers, frames: usize) -> AudioBuffers {
    let frames = frames.min(block.frames());
    AudioBuffers::from_channels(
        (0..block.channels())
            .map(|c| block.channel(c)[frames..].to_vec())
            .collect(),
    )
}

impl DecoderPart for AudioDecoder {
    /// The earliest next sample over all streams.
    fn position(&self, film: &Film) -> Option<ContentTime> {
        if self.ignore {
            return None;
        }
        let rate = f64::from(self.content.resampled_frame_rate(film));
        self.streams
            .values()
            .filter_map(|s| s.position)
            .map(|p| ContentTime::from_frames(p.max(0), rate))
            .min()
    }

    fn seek(&mut self) {
        for state in self.streams.values_mut() {
            state.position = None;
            if let Some(resampler) = &mut state.resampler {
                resampler.reset();
            }
        }
    }

    fn ignore(&self) -> bool {
        self.ignore
    }

    fn set_ignore(&mut self, ignore: bool) {
        self.ignore = ignore;
    }
}
