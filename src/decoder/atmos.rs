//! Object-audio part.
//!
//! Object audio runs on the output clock with no rate conversion, so
//! positions come straight from the frame index at the film's rate.

use super::DecoderPart;
use crate::content::Film;
use crate::events::{AtmosMetadata, ContentAtmos, EventSink};
use bytes::Bytes;
use reelplay_media::ContentTime;

#[derive(Debug, Default)]
pub struct AtmosDecoder {
    last_frame: Option<i64>,
    ignore: bool,
}

impl AtmosDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(
        &mut self,
        data: Bytes,
        frame: i64,
        metadata: AtmosMetadata,
        sink: &mut dyn EventSink,
    ) {
        if self.ignore {
            return;
        }
        sink.atmos(ContentAtmos {
            data,
            frame,
            metadata,
        });
        self.last_frame = Some(frame);
    }
}

impl DecoderPart for AtmosDecoder {
    fn position(&self, film: &Film) -> Option<ContentTime> {
        if self.ignore {
            return None;
        }
        self.last_frame
            .map(|f| ContentTime::from_frames(f + 1, f64::from(film.video_frame_rate)))
    }

    fn seek(&mut self) {
        self.last_frame = None;
    }

    fn ignore(&self) -> bool {
        self.ignore
    }

    fn set_ignore(&mut self, ignore: bool) {
        self.ignore = ignore;
    }
}
