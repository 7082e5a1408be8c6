//! Decoder for digital-cinema packages.
//!
//! Walks the reels of one playlist frame by frame, emitting text, picture,
//! sound and object audio for each output frame. Reel lists are reused from
//! a previous decoder of the same content when its digest matches.

use crate::content::{DcpContent, Film, TextType};
use crate::decoder::text::group_by_period;
use crate::decoder::{
    AtmosDecoder, AudioDecoder, Decoder, DecoderPart, DecoderParts, Pass, TextDecoder,
    VideoDecoder,
};
use crate::events::{AtmosMetadata, EventSink, Eye, J2kImageProxy};
use crate::{Error, Result};
use bytes::Bytes;
use reelplay_media::{
    unpack_pcm24, BoxedFrameReader, ContentTime, ContentTimePeriod, FontData, PackageLibrary,
    PictureKind, Reel, ReelTextAsset, StereoPictureFrame, Subtitle,
};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Default length of the text-only replay before a seek target.
pub const DEFAULT_PREROLL_SECONDS: f64 = 2.0;

/// Readers open on the current reel.
#[derive(Default)]
struct Readers {
    mono: Option<BoxedFrameReader<Bytes>>,
    stereo: Option<BoxedFrameReader<StereoPictureFrame>>,
    sound: Option<BoxedFrameReader<Bytes>>,
    atmos: Option<BoxedFrameReader<Bytes>>,
    atmos_metadata: Option<AtmosMetadata>,
}

pub struct DcpDecoder {
    film: Film,
    content: Arc<DcpContent>,
    parts: DecoderParts,
    reels: Arc<Vec<Reel>>,
    /// Index of the current reel; `reels.len()` once all have been played.
    reel: usize,
    /// Frames in the reels before the current one.
    offset: i64,
    /// Time of the next frame, from the start of the current reel.
    next: ContentTime,
    readers: Readers,
    forced_reduction: Option<u32>,
    decode_referenced: bool,
    lazy_digest: String,
    preroll: ContentTime,
    /// Whether the audio has been flushed since the end of the last reel.
    flushed: bool,
}

impl DcpDecoder {
    /// Build a decoder for `content` playing in `film`.
    ///
    /// If `old` decoded content with the same digest its resolved reels are
    /// reused; otherwise `library` resolves the content's directories, and
    /// with `tolerant` set recoverable package problems are only logged.
    pub fn new(
        library: &dyn PackageLibrary,
        film: &Film,
        content: Arc<DcpContent>,
        tolerant: bool,
        old: Option<&DcpDecoder>,
    ) -> Result<Self> {
        let mut parts = DecoderParts::default();
        if content.can_be_played() {
            if content.video.is_some() {
                parts.video = Some(VideoDecoder::new(Arc::clone(&content)));
            }
            if content.audio.is_some() {
                parts.audio = Some(AudioDecoder::new(Arc::clone(&content)));
            }
            for text in &content.text {
                parts.text.push(TextDecoder::new(text.text_type));
            }
            if content.atmos {
                parts.atmos = Some(AtmosDecoder::new());
            }
        }

        let lazy_digest = calculate_lazy_digest(&content);

        let reels = match old {
            Some(old) if old.lazy_digest == lazy_digest => {
                tracing::debug!("Reusing {} resolved reels", old.reels.len());
                Arc::clone(&old.reels)
            }
            _ => Arc::new(resolve_reels(library, &content, tolerant)?),
        };

        let mut decoder = Self {
            film: film.clone(),
            content,
            parts,
            reels,
            reel: 0,
            offset: 0,
            next: ContentTime::default(),
            readers: Readers::default(),
            forced_reduction: None,
            decode_referenced: false,
            lazy_digest,
            preroll: ContentTime::from_seconds(DEFAULT_PREROLL_SECONDS),
            flushed: false,
        };
        decoder.set_decode_referenced(false)?;
        Ok(decoder)
    }

    pub fn content(&self) -> &Arc<DcpContent> {
        &self.content
    }

    /// The resolved reels, shared with any decoder that reused them.
    pub fn reels(&self) -> &Arc<Vec<Reel>> {
        &self.reels
    }

    /// Identity of the content as far as reel resolution is concerned.
    pub fn lazy_digest(&self) -> &str {
        &self.lazy_digest
    }

    pub fn current_reel(&self) -> usize {
        self.reel
    }

    /// Frames in the reels before the current one.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Content time elapsed since the start of the first reel.
    pub fn elapsed(&self) -> ContentTime {
        ContentTime::from_frames(self.offset, self.video_frame_rate()) + self.next
    }

    pub fn set_preroll(&mut self, preroll: ContentTime) {
        self.preroll = preroll.max(ContentTime::default());
    }

    /// Discard this many resolution levels when pictures are decoded.
    pub fn set_forced_reduction(&mut self, reduction: Option<u32>) {
        self.forced_reduction = reduction;
    }

    /// Decode assets that are marked to be referenced, instead of leaving
    /// them out.
    pub fn set_decode_referenced(&mut self, decode_referenced: bool) -> Result<()> {
        self.decode_referenced = decode_referenced;
        if let Some(video) = &mut self.parts.video {
            video.set_ignore(self.content.reference_video && !decode_referenced);
        }
        if let Some(audio) = &mut self.parts.audio {
            audio.set_ignore(self.content.reference_audio && !decode_referenced);
        }
        self.get_readers()
    }

    /// Fonts embedded in the reels' subtitles, with ids made unique per reel
    /// as they are in emitted text.
    pub fn fonts(&self) -> Vec<FontData> {
        let mut fonts = Vec::new();
        for (index, reel) in self.reels.iter().enumerate() {
            if let Some(subtitle) = &reel.main_subtitle {
                for font in subtitle.asset.font_data() {
                    fonts.push(FontData {
                        id: reel_font_id(index, &font.id),
                        data: font.data,
                    });
                }
            }
        }
        fonts
    }

    fn video_frame_rate(&self) -> f64 {
        self.content.active_video_frame_rate(&self.film)
    }

    fn reel_length(&self, index: usize) -> ContentTime {
        let frames = self.reels.get(index).map_or(0, Reel::duration);
        ContentTime::from_frames(frames, self.video_frame_rate())
    }

    /// Move to the next reel without opening its readers.
    fn advance_reel(&mut self) {
        if let Some(reel) = self.reels.get(self.reel) {
            self.offset += reel.duration();
        }
        self.reel += 1;
    }

    fn next_reel(&mut self) -> Result<()> {
        self.advance_reel();
        tracing::debug!("Moving to reel {} at offset {}", self.reel, self.offset);
        self.get_readers()
    }

    /// Open the readers the current reel needs, with authentication-tag
    /// checking turned off.
    fn get_readers(&mut self) -> Result<()> {
        self.readers = Readers::default();

        let reels = Arc::clone(&self.reels);
        let Some(reel) = reels.get(self.reel) else {
            return Ok(());
        };

        let wants_video = self.parts.video.as_ref().is_some_and(|v| !v.ignore());
        if let (true, Some(picture)) = (wants_video, &reel.main_picture) {
            match picture.asset.kind() {
                Some(PictureKind::Mono) => {
                    let mut reader = picture.asset.start_mono_read(picture.key.as_ref())?;
                    reader.set_check_hmac(false);
                    self.readers.mono = Some(reader);
                }
                Some(PictureKind::Stereo) => {
                    let mut reader = picture.asset.start_stereo_read(picture.key.as_ref())?;
                    reader.set_check_hmac(false);
                    self.readers.stereo = Some(reader);
                }
                None => return Err(Error::InvalidPicture(picture.id.clone())),
            }
        }

        let wants_audio = self.parts.audio.as_ref().is_some_and(|a| !a.ignore());
        if let (true, Some(sound)) = (wants_audio, &reel.main_sound) {
            let mut reader = sound.asset.start_read(sound.key.as_ref())?;
            reader.set_check_hmac(false);
            self.readers.sound = Some(reader);
        }

        if let (true, Some(atmos)) = (self.parts.atmos.is_some(), &reel.atmos) {
            let mut reader = atmos.asset.start_read(atmos.key.as_ref())?;
            reader.set_check_hmac(false);
            self.readers.atmos = Some(reader);
            self.readers.atmos_metadata = Some(AtmosMetadata {
                first_frame: atmos.asset.first_frame(),
                max_channel_count: atmos.asset.max_channel_count(),
                max_object_count: atmos.asset.max_object_count(),
                atmos_version: atmos.asset.atmos_version(),
            });
        }

        Ok(())
    }

    /// Emit the subtitles and captions of `reel` that start in the frame
    /// at `next`.
    fn pass_texts(&mut self, next: ContentTime, reel: &Reel, sink: &mut dyn EventSink) {
        let vfr = self.video_frame_rate();
        let place = TextPlacement {
            reel_index: self.reel,
            offset: self.offset,
            frame: next.frames_round(vfr),
            vfr,
        };

        let open = self.decode_referenced || !self.content.reference_text(TextType::OpenSubtitle);
        if let (true, Some(asset)) = (open, &reel.main_subtitle) {
            if let Some(decoder) = self.parts.text_of_type(TextType::OpenSubtitle, 0) {
                place.pass(asset, decoder, sink);
            }
        }

        let closed =
            self.decode_referenced || !self.content.reference_text(TextType::ClosedCaption);
        if closed {
            for (index, asset) in reel.closed_captions.iter().enumerate() {
                if let Some(decoder) = self.parts.text_of_type(TextType::ClosedCaption, index) {
                    place.pass(asset, decoder, sink);
                }
            }
        }
    }
}

/// Where one frame of a reel's text lands in the content.
struct TextPlacement {
    reel_index: usize,
    offset: i64,
    frame: i64,
    vfr: f64,
}

impl TextPlacement {
    fn pass(&self, asset: &ReelTextAsset, decoder: &mut TextDecoder, sink: &mut dyn EventSink) {
        let entry_point = asset.entry_point_or_zero();
        let from = ContentTime::from_frames(entry_point + self.frame, self.vfr);
        let to = ContentTime::from_frames(entry_point + self.frame + 1, self.vfr);
        // asset times count from the start of the file, not the entry point
        let base = ContentTime::from_frames(self.offset - entry_point, self.vfr);

        let mut strings = Vec::new();
        for subtitle in asset.asset.subtitles_during(from, to, true) {
            match subtitle {
                Subtitle::String(mut string) => {
                    if let Some(font) = &string.font {
                        string.font = Some(reel_font_id(self.reel_index, font));
                    }
                    let period =
                        ContentTimePeriod::new(base + string.in_time, base + string.out_time);
                    strings.push((period, string));
                }
                Subtitle::Image(image) => {
                    let period =
                        ContentTimePeriod::new(base + image.in_time, base + image.out_time);
                    decoder.emit_bitmap(period, image, sink);
                }
            }
        }

        for (period, subs) in group_by_period(strings) {
            decoder.emit_plain(period, subs, sink);
        }
    }
}

fn reel_font_id(reel_index: usize, font: &str) -> String {
    format!("{}_{}", reel_index, font)
}

/// Digest of everything that decides which reels a content resolves to.
fn calculate_lazy_digest(content: &DcpContent) -> String {
    let mut hasher = Sha256::new();
    for path in &content.paths {
        hasher.update(path.to_string_lossy().as_bytes());
        hasher.update([0u8]);
    }
    if let Some(kdm) = &content.kdm {
        hasher.update(b"kdm:");
        hasher.update(kdm.id().as_bytes());
        hasher.update([0u8]);
    }
    if let Some(cpl) = &content.cpl {
        hasher.update(b"cpl:");
        hasher.update(cpl.as_bytes());
    }
    hex::encode(hasher.finalize())
}

fn resolve_reels(
    library: &dyn PackageLibrary,
    content: &DcpContent,
    tolerant: bool,
) -> Result<Vec<Reel>> {
    let directories = content.directories();
    tracing::debug!(
        "Resolving CPLs in {} director(y/ies) with {} library",
        directories.len(),
        library.name()
    );

    let mut cpls = library.find_and_resolve_cpls(&directories, tolerant)?;
    if cpls.is_empty() {
        return Err(Error::NoCpls);
    }

    let index = content
        .cpl
        .as_ref()
        .and_then(|id| cpls.iter().position(|c| &c.id == id))
        .unwrap_or(0);
    let mut cpl = cpls.swap_remove(index);

    if let Some(kdm) = &content.kdm {
        cpl.add_kdm(kdm).map_err(|e| Error::Kdm(e.to_string()))?;
    }

    tracing::debug!("Using CPL {} with {} reels", cpl.id, cpl.reels.len());
    Ok(cpl.reels)
}

impl Decoder for DcpDecoder {
    fn parts(&self) -> &DecoderParts {
        &self.parts
    }

    fn parts_mut(&mut self) -> &mut DecoderParts {
        &mut self.parts
    }

    fn pass(&mut self, sink: &mut dyn EventSink) -> Result<Pass> {
        if !self.content.can_be_played() {
            return Ok(Pass::Exhausted);
        }

        let reels = Arc::clone(&self.reels);
        let Some(reel) = reels.get(self.reel) else {
            if !self.flushed {
                if let Some(audio) = &mut self.parts.audio {
                    audio.flush(&self.film, sink);
                }
                self.flushed = true;
            }
            return Ok(Pass::Exhausted);
        };

        let vfr = self.video_frame_rate();
        let frame = self.next.frames_round(vfr);

        // text first: burning in captions needs them before the picture
        self.pass_texts(self.next, reel, sink);

        if self.decode_referenced || !self.content.reference_video {
            if let (Some(video), Some(picture)) = (&mut self.parts.video, &reel.main_picture) {
                let entry_point = picture.entry_point_or_zero();
                let size = picture.asset.size();
                let image = |data, eye| J2kImageProxy {
                    data,
                    size,
                    eye,
                    reduction: self.forced_reduction,
                };
                if let Some(reader) = &mut self.readers.mono {
                    let data = reader.get_frame(entry_point + frame)?;
                    video.emit(&self.film, image(data, None), self.offset + frame, sink);
                } else if let Some(reader) = &mut self.readers.stereo {
                    let pair = reader.get_frame(entry_point + frame)?;
                    video.emit(
                        &self.film,
                        image(pair.left, Some(Eye::Left)),
                        self.offset + frame,
                        sink,
                    );
                    video.emit(
                        &self.film,
                        image(pair.right, Some(Eye::Right)),
                        self.offset + frame,
                        sink,
                    );
                }
            }
        }

        if self.decode_referenced || !self.content.reference_audio {
            if let (Some(audio), Some(sound), Some(reader)) = (
                &mut self.parts.audio,
                &reel.main_sound,
                &mut self.readers.sound,
            ) {
                let data = reader.get_frame(sound.entry_point_or_zero() + frame)?;
                let buffers = unpack_pcm24(&data, sound.asset.channels());
                let time = ContentTime::from_frames(self.offset, vfr) + self.next;
                audio.emit(&self.film, 0, &buffers, time, false, sink);
            }
        }

        if let (Some(atmos), Some(asset), Some(reader), Some(metadata)) = (
            &mut self.parts.atmos,
            &reel.atmos,
            &mut self.readers.atmos,
            self.readers.atmos_metadata,
        ) {
            let data = reader.get_frame(asset.entry_point_or_zero() + frame)?;
            atmos.emit(data, self.offset + frame, metadata, sink);
        }

        self.next = ContentTime::from_frames(frame + 1, vfr);
        if frame + 1 >= reel.duration() {
            self.next_reel()?;
            self.next = ContentTime::default();
        }

        Ok(Pass::Continued)
    }

    /// Seek in two phases.
    ///
    /// Starting up to the pre-roll before `time`, text alone is replayed one
    /// frame at a time so that cues which began earlier but are still showing
    /// at `time` are delivered; then the position is set to `time` exactly.
    /// Package reads are frame-exact, so `accurate` changes nothing.
    fn seek_content(
        &mut self,
        time: ContentTime,
        _accurate: bool,
        sink: &mut dyn EventSink,
    ) -> Result<()> {
        if !self.content.can_be_played() {
            return Ok(());
        }

        self.flushed = false;
        self.reel = 0;
        self.offset = 0;

        let vfr = self.video_frame_rate();
        let mut time = time.max(ContentTime::default());
        let mut pre = (time - self.preroll).max(ContentTime::default());

        // skip reels that end before the pre-roll starts
        while self.reel < self.reels.len() && pre >= self.reel_length(self.reel) {
            let length = self.reel_length(self.reel);
            pre -= length;
            time -= length;
            self.advance_reel();
        }

        let reels = Arc::clone(&self.reels);
        let mut steps = self.preroll.frames_round(vfr);
        // stop short of the frame the first pass will read
        while steps > 0 && pre.frames_round(vfr) < time.frames_round(vfr) {
            let Some(reel) = reels.get(self.reel) else {
                break;
            };
            self.pass_texts(pre, reel, sink);
            pre = ContentTime::from_frames(pre.frames_round(vfr) + 1, vfr);
            steps -= 1;

            let length = self.reel_length(self.reel);
            if pre >= length {
                pre -= length;
                time -= length;
                self.advance_reel();
            }
        }

        while self.reel < self.reels.len() && time >= self.reel_length(self.reel) {
            time -= self.reel_length(self.reel);
            self.advance_reel();
        }

        self.next = time;
        tracing::debug!(
            "Seek landed in reel {} at {} (offset {})",
            self.reel,
            self.next,
            self.offset
        );
        self.get_readers()
    }
}

impl std::fmt::Debug for DcpDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DcpDecoder")
            .field("reels", &self.reels.len())
            .field("reel", &self.reel)
            .field("offset", &self.offset)
            .field("next", &self.next)
            .field("lazy_digest", &self.lazy_digest)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelplay_media::DecryptedKdm;
    use std::path::PathBuf;

    #[test]
    fn test_lazy_digest_inputs() {
        let base = DcpContent::new(vec![PathBuf::from("/dcp/a/cpl.xml")]);
        let digest = calculate_lazy_digest(&base);
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, calculate_lazy_digest(&base.clone()));

        let mut trimmed = base.clone();
        trimmed.trim_start = ContentTime::from_seconds(1.0);
        assert_eq!(digest, calculate_lazy_digest(&trimmed));

        let mut with_cpl = base.clone();
        with_cpl.cpl = Some("cpl-2".into());
        assert_ne!(digest, calculate_lazy_digest(&with_cpl));

        let mut with_kdm = base.clone();
        with_kdm.kdm = Some(DecryptedKdm::new("kdm-1", "cpl-1"));
        assert_ne!(digest, calculate_lazy_digest(&with_kdm));

        let mut moved = base;
        moved.paths = vec![PathBuf::from("/dcp/b/cpl.xml")];
        assert_ne!(digest, calculate_lazy_digest(&moved));
    }

    #[test]
    fn test_reel_font_id() {
        assert_eq!(reel_font_id(2, "theFont"), "2_theFont");
    }
}
