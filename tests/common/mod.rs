//! Shared fixtures for integration tests.
//!
//! Provides a two-reel, 24 fps package registered in a [`MemoryLibrary`]
//! under [`FEATURE_DIR`], and content descriptors that play it.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reelplay::content::{AudioContent, AudioStream, TextContent, VideoContent};
use reelplay::decoder::{Decoder, Pass};
use reelplay::{DcpContent, DcpDecoder, EventLog, Film, TextType};
use reelplay_media::memory::{MemoryLibrary, MemoryPackage, MemoryReel, MemorySubtitle};
use reelplay_media::{ContentTime, Subtitle, SubtitleString};

pub const FEATURE_DIR: &str = "/dcp/feature";
pub const FEATURE_CPL: &str = "cpl-feature";

/// Frames in each reel of the feature.
pub const REEL_FRAMES: i64 = 24;

pub fn secs(seconds: f64) -> ContentTime {
    ContentTime::from_seconds(seconds)
}

pub fn frames(frames: i64) -> ContentTime {
    ContentTime::from_frames(frames, 24.0)
}

/// A text cue with asset times in seconds.
pub fn cue(text: &str, in_secs: f64, out_secs: f64) -> Subtitle {
    Subtitle::String(SubtitleString::new(text, secs(in_secs), secs(out_secs)))
}

pub fn font_cue(text: &str, in_secs: f64, out_secs: f64, font: &str) -> Subtitle {
    let mut string = SubtitleString::new(text, secs(in_secs), secs(out_secs));
    string.font = Some(font.to_string());
    Subtitle::String(string)
}

/// Reels of the feature: picture, stereo sound and subtitles.
///
/// - reel 0: "One" over [0.5, 1.0) in `theFont`
/// - reel 1: "Two a" and "Two b" over [0.25, 0.75), "Late" over [0.5, 0.75)
pub fn feature_reels() -> Vec<MemoryReel> {
    let r1 = MemoryReel::new("r1")
        .picture(REEL_FRAMES)
        .sound(REEL_FRAMES, 2)
        .subtitle_asset(
            MemorySubtitle::new(
                "r1-subtitle",
                REEL_FRAMES,
                vec![font_cue("One", 0.5, 1.0, "theFont")],
            )
            .with_font("theFont", &b"font-bytes"[..]),
        );
    let r2 = MemoryReel::new("r2")
        .picture(REEL_FRAMES)
        .sound(REEL_FRAMES, 2)
        .subtitle(
            REEL_FRAMES,
            vec![
                cue("Late", 0.5, 0.75),
                cue("Two a", 0.25, 0.75),
                cue("Two b", 0.25, 0.75),
            ],
        );
    vec![r1, r2]
}

pub fn library_with(directory: impl AsRef<Path>, package: MemoryPackage) -> MemoryLibrary {
    let mut library = MemoryLibrary::new();
    library.insert(directory, package);
    library
}

pub fn feature_library() -> MemoryLibrary {
    library_with(FEATURE_DIR, MemoryPackage::new().cpl(FEATURE_CPL, feature_reels()))
}

/// Content playing whatever package is in `directory`, with 24 fps video,
/// one stereo 48 kHz audio stream and one subtitle track.
pub fn content_in(directory: &str) -> DcpContent {
    DcpContent {
        paths: vec![PathBuf::from(directory).join("ASSETMAP.xml")],
        video: Some(VideoContent {
            frame_rate: Some(24.0),
            length: 2 * REEL_FRAMES,
            ..Default::default()
        }),
        audio: Some(AudioContent {
            streams: vec![AudioStream {
                frame_rate: 48_000,
                channels: 2,
            }],
            delay_ms: 0,
        }),
        text: vec![TextContent::new(TextType::OpenSubtitle)],
        ..Default::default()
    }
}

pub fn feature_content() -> Arc<DcpContent> {
    Arc::new(content_in(FEATURE_DIR))
}

pub fn feature_decoder(library: &MemoryLibrary) -> DcpDecoder {
    DcpDecoder::new(library, &Film::default(), feature_content(), false, None)
        .expect("feature should resolve")
}

/// Pass until exhausted, returning the number of passes that continued.
pub fn play_to_end(decoder: &mut DcpDecoder, log: &mut EventLog) -> usize {
    let mut passes = 0;
    while decoder.pass(log).expect("pass should succeed") == Pass::Continued {
        passes += 1;
        assert!(passes < 10_000, "decoder never exhausted");
    }
    passes
}

/// Text of every plain cue emitted, in order.
pub fn cue_texts(log: &EventLog) -> Vec<Vec<String>> {
    log.plain_texts()
        .map(|t| t.subs.iter().map(|s| s.text.clone()).collect())
        .collect()
}
