//! Trimming of reel assets that are referenced rather than re-encoded.
//!
//! A referenced asset is a pointer into an existing package, so trimming it
//! means moving its entry point and shortening its duration; nothing is
//! resampled, which is why the content must already run at the film's rate.

use crate::content::{DcpContent, Film, TextType};
use crate::dcp_decoder::DcpDecoder;
use crate::{Error, Result};
use reelplay_media::{
    Asset, DcpTime, DcpTimePeriod, PackageLibrary, Reel, ReelAsset, ReelPictureAsset,
    ReelSoundAsset, ReelTextAsset,
};
use std::sync::Arc;

/// A reel asset to be referenced, already trimmed.
#[derive(Debug, Clone)]
pub enum ReferencedAsset {
    Picture(ReelPictureAsset),
    Sound(ReelSoundAsset),
    Subtitle(ReelTextAsset),
    ClosedCaption(ReelTextAsset),
}

impl ReferencedAsset {
    pub fn id(&self) -> &str {
        match self {
            Self::Picture(a) => &a.id,
            Self::Sound(a) => &a.id,
            Self::Subtitle(a) | Self::ClosedCaption(a) => &a.id,
        }
    }

    pub fn entry_point(&self) -> i64 {
        match self {
            Self::Picture(a) => a.entry_point_or_zero(),
            Self::Sound(a) => a.entry_point_or_zero(),
            Self::Subtitle(a) | Self::ClosedCaption(a) => a.entry_point_or_zero(),
        }
    }

    pub fn duration(&self) -> i64 {
        match self {
            Self::Picture(a) => a.actual_duration(),
            Self::Sound(a) => a.actual_duration(),
            Self::Subtitle(a) | Self::ClosedCaption(a) => a.actual_duration(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Picture(_) => "picture",
            Self::Sound(_) => "sound",
            Self::Subtitle(_) => "subtitle",
            Self::ClosedCaption(_) => "closed caption",
        }
    }
}

/// A trimmed asset and where it plays in the film.
#[derive(Debug, Clone)]
pub struct ReferencedReelAsset {
    pub asset: ReferencedAsset,
    pub period: DcpTimePeriod,
}

/// Frames trimmed from each end of a reel, where what is left starts in the
/// film, and the film's rate.
type Span = (i64, i64, DcpTime, f64);

/// Trim `asset` to `span`; `None` if nothing is left.
fn trim<A: Asset + ?Sized>(
    asset: &ReelAsset<A>,
    (trim_start, trim_end, from, rate): Span,
) -> Option<(ReelAsset<A>, DcpTimePeriod)> {
    let mut trimmed = asset.clone();
    trimmed.set_entry_point(asset.entry_point_or_zero() + trim_start);
    trimmed.set_duration(asset.actual_duration() - trim_start - trim_end);
    let duration = trimmed.actual_duration();
    if duration <= 0 {
        return None;
    }
    let period = DcpTimePeriod::new(from, from + DcpTime::from_frames(duration, rate));
    Some((trimmed, period))
}

/// Trim the referenced assets of `reels`, which belong to `content`, to the
/// content's start and end trims.
///
/// Reels are walked in order, keeping count of the frames before and after
/// each one; a reel that lies wholly inside a trim contributes nothing.
/// Only essences that `content` marks as referenced are included.
pub fn trim_referenced_reels(
    film: &Film,
    content: &DcpContent,
    reels: &[Reel],
) -> Result<Vec<ReferencedReelAsset>> {
    let content_rate = content
        .video
        .as_ref()
        .and_then(|v| v.frame_rate)
        .ok_or_else(|| Error::invalid_content("referenced content has no video frame rate"))?;
    if content_rate.round() as i32 != film.video_frame_rate {
        return Err(Error::FrameRateMismatch {
            content: content_rate,
            film: film.video_frame_rate,
        });
    }

    let rate = f64::from(film.video_frame_rate);
    let trim_start = content.trim_start.frames_round(rate);
    let trim_end = content.trim_end.frames_round(rate);

    let mut offset_from_start = 0i64;
    let mut offset_from_end: i64 = reels.iter().map(Reel::duration).sum();

    let mut assets = Vec::new();
    for reel in reels {
        let duration = reel.duration();
        let reel_trim_start = (trim_start - offset_from_start).clamp(0, duration);
        let reel_trim_end = (duration - (offset_from_end - trim_end)).clamp(0, duration);
        let from = content.position
            + DcpTime::from_frames(offset_from_start - trim_start, rate).max(DcpTime::default());

        let span = (reel_trim_start, reel_trim_end, from, rate);

        if content.reference_video {
            if let Some((a, period)) = reel.main_picture.as_ref().and_then(|a| trim(a, span)) {
                assets.push(ReferencedReelAsset {
                    asset: ReferencedAsset::Picture(a),
                    period,
                });
            }
        }
        if content.reference_audio {
            if let Some((a, period)) = reel.main_sound.as_ref().and_then(|a| trim(a, span)) {
                assets.push(ReferencedReelAsset {
                    asset: ReferencedAsset::Sound(a),
                    period,
                });
            }
        }
        if content.reference_text(TextType::OpenSubtitle) {
            if let Some((a, period)) = reel.main_subtitle.as_ref().and_then(|a| trim(a, span)) {
                assets.push(ReferencedReelAsset {
                    asset: ReferencedAsset::Subtitle(a),
                    period,
                });
            }
        }
        if content.reference_text(TextType::ClosedCaption) {
            for (a, period) in reel.closed_captions.iter().filter_map(|a| trim(a, span)) {
                assets.push(ReferencedReelAsset {
                    asset: ReferencedAsset::ClosedCaption(a),
                    period,
                });
            }
        }

        offset_from_start += duration;
        offset_from_end -= duration;
    }

    Ok(assets)
}

/// Referenced reel assets of every package content in a playlist.
///
/// Content that references nothing is skipped. If a decoder cannot be built
/// for some content the walk stops there and what has been collected so far
/// is returned.
pub fn referenced_reel_assets(
    library: &dyn PackageLibrary,
    film: &Film,
    contents: &[Arc<DcpContent>],
) -> Result<Vec<ReferencedReelAsset>> {
    let mut assets = Vec::new();
    for content in contents {
        if !content.references_anything() {
            continue;
        }

        let decoder = match DcpDecoder::new(library, film, Arc::clone(content), false, None) {
            Ok(decoder) => decoder,
            Err(e) => {
                tracing::warn!("Could not read referenced content, stopping: {}", e);
                return Ok(assets);
            }
        };

        assets.extend(trim_referenced_reels(film, content, decoder.reels())?);
    }
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::VideoContent;
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use reelplay_media::memory::MemoryReel;
    use reelplay_media::ContentTime;

    fn content(rate: f64) -> DcpContent {
        DcpContent {
            reference_video: true,
            video: Some(VideoContent {
                frame_rate: Some(rate),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_untrimmed_reels_are_placed_back_to_back() {
        let film = Film::default();
        let reels = vec![
            MemoryReel::new("r1").picture(48).build(),
            MemoryReel::new("r2").picture(24).build(),
        ];
        let assets = trim_referenced_reels(&film, &content(24.0), &reels).unwrap();
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[1].period.from, DcpTime::from_frames(48, 24.0));
        assert_eq!(assets[1].period.to, DcpTime::from_frames(72, 24.0));
        assert_eq!(assets[1].asset.kind(), "picture");
    }

    #[test]
    fn test_trim_inside_one_reel() {
        let film = Film::default();
        let mut content = content(24.0);
        content.trim_start = ContentTime::from_frames(10, 24.0);
        content.trim_end = ContentTime::from_frames(5, 24.0);
        let reels = vec![MemoryReel::new("r1").picture(100).build()];
        let assets = trim_referenced_reels(&film, &content, &reels).unwrap();
        assert_eq!(assets[0].asset.entry_point(), 10);
        assert_eq!(assets[0].asset.duration(), 85);
        assert_eq!(assets[0].period.from, DcpTime::default());
    }

    #[test]
    fn test_non_integer_rate_rounds() {
        let film = Film::default();
        let reels = vec![MemoryReel::new("r1").picture(24).build()];
        assert!(trim_referenced_reels(&film, &content(23.976), &reels).is_ok());
        assert_matches!(
            trim_referenced_reels(&film, &content(25.0), &reels),
            Err(Error::FrameRateMismatch { film: 24, .. })
        );
    }

    #[test]
    fn test_missing_video_is_invalid() {
        let film = Film::default();
        let content = DcpContent {
            reference_audio: true,
            ..Default::default()
        };
        assert_matches!(
            trim_referenced_reels(&film, &content, &[]),
            Err(Error::InvalidContent(_))
        );
    }

    proptest! {
        #[test]
        fn trimmed_reels_cover_the_trimmed_length(
            durations in prop::collection::vec(1i64..100, 1..6),
            start in 0i64..200,
            end in 0i64..200,
        ) {
            let film = Film::default();
            let reels: Vec<Reel> = durations
                .iter()
                .enumerate()
                .map(|(i, d)| MemoryReel::new(format!("r{i}")).picture(*d).build())
                .collect();
            let mut content = content(24.0);
            content.trim_start = ContentTime::from_frames(start, 24.0);
            content.trim_end = ContentTime::from_frames(end, 24.0);

            let assets = trim_referenced_reels(&film, &content, &reels).unwrap();
            let total: i64 = durations.iter().sum();
            let kept: i64 = assets.iter().map(|a| a.asset.duration()).sum();
            prop_assert_eq!(kept, (total - start - end).max(0));

            let mut at = DcpTime::default();
            for asset in &assets {
                prop_assert_eq!(asset.period.from, at);
                at = asset.period.to;
            }
        }
    }
}
