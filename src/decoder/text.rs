//! Text part: subtitle and caption cues with explicit periods.

use super::DecoderPart;
use crate::content::{Film, TextType};
use crate::events::{ContentBitmapText, ContentStringText, EventSink};
use reelplay_media::{ContentTime, ContentTimePeriod, SubtitleImage, SubtitleString};

#[derive(Debug)]
pub struct TextDecoder {
    text_type: TextType,
    /// Start of the last cue emitted since the last seek.
    position: Option<ContentTime>,
    ignore: bool,
}

impl TextDecoder {
    pub fn new(text_type: TextType) -> Self {
        Self {
            text_type,
            position: None,
            ignore: false,
        }
    }

    pub fn text_type(&self) -> TextType {
        self.text_type
    }

    /// Emit lines that all share `period`.
    ///
    /// Callers must pass every line of a period in one call: receivers may
    /// assume nothing more arrives for a period they have seen.
    pub fn emit_plain(
        &mut self,
        period: ContentTimePeriod,
        mut subs: Vec<SubtitleString>,
        sink: &mut dyn EventSink,
    ) {
        if self.ignore {
            return;
        }
        for sub in &mut subs {
            // markup in our renderer is HTML-like
            if sub.text.contains(['<', '>']) {
                sub.text = sub.text.replace('<', "&lt;").replace('>', "&gt;");
            }
        }
        sink.plain_text(ContentStringText {
            period,
            text_type: self.text_type,
            subs,
        });
        self.position = Some(period.from);
    }

    pub fn emit_bitmap(
        &mut self,
        period: ContentTimePeriod,
        image: SubtitleImage,
        sink: &mut dyn EventSink,
    ) {
        if self.ignore {
            return;
        }
        sink.bitmap_text(ContentBitmapText {
            period,
            text_type: self.text_type,
            image,
        });
        self.position = Some(period.from);
    }
}

impl DecoderPart for TextDecoder {
    fn position(&self, _film: &Film) -> Option<ContentTime> {
        if self.ignore {
            None
        } else {
            self.position
        }
    }

    fn seek(&mut self) {
        self.position = None;
    }

    fn ignore(&self) -> bool {
        self.ignore
    }

    fn set_ignore(&mut self, ignore: bool) {
        self.ignore = ignore;
    }
}

/// Split cues into runs that share a period, in order.
///
/// Adjacent strings are gathered while their period matches the first of
/// the run; a change of period closes the run.
pub fn group_by_period(
    strings: impl IntoIterator<Item = (ContentTimePeriod, SubtitleString)>,
) -> Vec<(ContentTimePeriod, Vec<SubtitleString>)> {
    let mut groups: Vec<(ContentTimePeriod, Vec<SubtitleString>)> = Vec::new();
    for (period, string) in strings {
        match groups.last_mut() {
            Some((current, run)) if *current == period => run.push(string),
            _ => groups.push((period, vec![string])),
        }
    }
    groups
}
