//! Video part: turns decoded pictures into eye-tagged video frames.

use super::DecoderPart;
use crate::content::{DcpContent, Film, VideoFrameType};
use crate::events::{ContentVideo, EventSink, Eye, Eyes, J2kImageProxy, Part};
use reelplay_media::ContentTime;
use std::sync::Arc;

#[derive(Debug)]
pub struct VideoDecoder {
    content: Arc<DcpContent>,
    /// Frame index of the last emission since the last seek.
    last_frame: Option<i64>,
    last_emitted_eyes: Option<Eyes>,
    ignore: bool,
}

impl VideoDecoder {
    pub fn new(content: Arc<DcpContent>) -> Self {
        Self {
            content,
            last_frame: None,
            last_emitted_eyes: None,
            ignore: false,
        }
    }

    fn frame_type(&self) -> VideoFrameType {
        self.content
            .video
            .as_ref()
            .map(|v| v.frame_type)
            .unwrap_or_default()
    }

    fn is_eye_sequential(&self) -> bool {
        matches!(
            self.frame_type(),
            VideoFrameType::ThreeD | VideoFrameType::ThreeDAlternate
        )
    }

    /// Frame index the next emission will carry, once something has been
    /// emitted since the last seek.
    fn next_frame(&self) -> Option<i64> {
        let last = self.last_frame?;
        if self.is_eye_sequential() && self.last_emitted_eyes == Some(Eyes::Left) {
            // the right eye of the same frame comes next
            Some(last)
        } else {
            Some(last + 1)
        }
    }

    /// Emit `image`, read as frame `decoder_frame` of the content.
    ///
    /// The first emission after a seek is placed at `decoder_frame`; after
    /// that frames are counted, so a source that repeats or drops indices
    /// still produces a gapless sequence.
    pub fn emit(
        &mut self,
        _film: &Film,
        image: J2kImageProxy,
        decoder_frame: i64,
        sink: &mut dyn EventSink,
    ) {
        if self.ignore {
            return;
        }

        let frame_type = self.frame_type();
        let frame = match self.next_frame() {
            Some(frame) => frame,
            None => match frame_type {
                VideoFrameType::ThreeD => {
                    // whatever eye arrives first, treat the other as already done
                    self.last_emitted_eyes = Some(match image.eye {
                        Some(Eye::Right) => Eyes::Left,
                        _ => Eyes::Right,
                    });
                    decoder_frame
                }
                VideoFrameType::ThreeDAlternate => {
                    self.last_emitted_eyes = Some(if decoder_frame % 2 == 0 {
                        Eyes::Right
                    } else {
                        Eyes::Left
                    });
                    decoder_frame / 2
                }
                _ => decoder_frame,
            },
        };

        let whole = |image, eyes| ContentVideo {
            image,
            frame,
            eyes,
            part: Part::Whole,
        };

        match frame_type {
            VideoFrameType::TwoD => sink.video(whole(image, Eyes::Both)),
            VideoFrameType::ThreeD => {
                let eyes = image.eye.map_or(Eyes::Left, Eyes::from);
                sink.video(whole(image, eyes));
                self.last_emitted_eyes = Some(eyes);
            }
            VideoFrameType::ThreeDAlternate => {
                let eyes = if self.last_emitted_eyes == Some(Eyes::Left) {
                    Eyes::Right
                } else {
                    Eyes::Left
                };
                sink.video(whole(image, eyes));
                self.last_emitted_eyes = Some(eyes);
            }
            VideoFrameType::ThreeDLeftRight => {
                sink.video(ContentVideo {
                    image: image.clone(),
                    frame,
                    eyes: Eyes::Left,
                    part: Part::LeftHalf,
                });
                sink.video(ContentVideo {
                    image,
                    frame,
                    eyes: Eyes::Right,
                    part: Part::RightHalf,
                });
            }
            VideoFrameType::ThreeDTopBottom => {
                sink.video(ContentVideo {
                    image: image.clone(),
                    frame,
                    eyes: Eyes::Left,
                    part: Part::TopHalf,
                });
                sink.video(ContentVideo {
                    image,
                    frame,
                    eyes: Eyes::Right,
                    part: Part::BottomHalf,
                });
            }
            VideoFrameType::ThreeDLeft => sink.video(whole(image, Eyes::Left)),
            VideoFrameType::ThreeDRight => sink.video(whole(image, Eyes::Right)),
        }

        self.last_frame = Some(frame);
    }
}

impl DecoderPart for VideoDecoder {
    fn position(&self, film: &Film) -> Option<ContentTime> {
        if self.ignore {
            return None;
        }
        let rate = self.content.active_video_frame_rate(film);
        self.next_frame()
            .map(|frame| ContentTime::from_frames(frame, rate))
    }

    fn seek(&mut self) {
        self.last_frame = None;
        self.last_emitted_eyes = None;
    }

    fn ignore(&self) -> bool {
        self.ignore
    }

    fn set_ignore(&mut self, ignore: bool) {
        self.ignore = ignore;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::VideoContent;
    use crate::events::EventLog;
    use bytes::Bytes;
    use reelplay_media::Size;

    fn decoder(frame_type: VideoFrameType) -> VideoDecoder {
        VideoDecoder::new(Arc::new(DcpContent {
            video: Some(VideoContent {
                frame_type,
                ..Default::default()
            }),
            ..Default::default()
        }))
    }

    fn image(eye: Option<Eye>) -> J2kImageProxy {
        J2kImageProxy {
            data: Bytes::from_static(b"j2k"),
            size: Size::new(1998, 1080),
            eye,
            reduction: None,
        }
    }

    fn tags(log: &EventLog) -> Vec<(i64, Eyes, Part)> {
        log.videos().map(|v| (v.frame, v.eyes, v.part)).collect()
    }

    #[test]
    fn test_2d_counts_frames_after_first() {
        let film = Film::default();
        let mut video = decoder(VideoFrameType::TwoD);
        let mut log = EventLog::new();
        video.emit(&film, image(None), 10, &mut log);
        video.emit(&film, image(None), 10, &mut log);
        assert_eq!(
            tags(&log),
            vec![(10, Eyes::Both, Part::Whole), (11, Eyes::Both, Part::Whole)]
        );
        assert_eq!(video.position(&film), Some(ContentTime::from_frames(12, 24.0)));

        video.seek();
        assert_eq!(video.position(&film), None);
    }

    #[test]
    fn test_3d_tags_both_eyes_with_one_frame() {
        let film = Film::default();
        let mut video = decoder(VideoFrameType::ThreeD);
        let mut log = EventLog::new();
        for f in 5..7 {
            video.emit(&film, image(Some(Eye::Left)), f, &mut log);
            video.emit(&film, image(Some(Eye::Right)), f, &mut log);
        }
        assert_eq!(
            tags(&log),
            vec![
                (5, Eyes::Left, Part::Whole),
                (5, Eyes::Right, Part::Whole),
                (6, Eyes::Left, Part::Whole),
                (6, Eyes::Right, Part::Whole),
            ]
        );
    }

    #[test]
    fn test_3d_alternate_switches_eyes() {
        let film = Film::default();
        let mut video = decoder(VideoFrameType::ThreeDAlternate);
        let mut log = EventLog::new();
        for i in 0..4 {
            video.emit(&film, image(None), 8 + i, &mut log);
        }
        assert_eq!(
            tags(&log),
            vec![
                (4, Eyes::Left, Part::Whole),
                (4, Eyes::Right, Part::Whole),
                (5, Eyes::Left, Part::Whole),
                (5, Eyes::Right, Part::Whole),
            ]
        );
    }

    #[test]
    fn test_side_by_side_and_single_eye() {
        let film = Film::default();
        let mut log = EventLog::new();
        decoder(VideoFrameType::ThreeDLeftRight).emit(&film, image(None), 0, &mut log);
        decoder(VideoFrameType::ThreeDTopBottom).emit(&film, image(None), 0, &mut log);
        decoder(VideoFrameType::ThreeDRight).emit(&film, image(None), 0, &mut log);
        assert_eq!(
            tags(&log),
            vec![
                (0, Eyes::Left, Part::LeftHalf),
                (0, Eyes::Right, Part::RightHalf),
                (0, Eyes::Left, Part::TopHalf),
                (0, Eyes::Right, Part::BottomHalf),
                (0, Eyes::Right, Part::Whole),
            ]
        );
    }

    #[test]
    fn test_ignored_part_emits_nothing() {
        let film = Film::default();
        let mut video = decoder(VideoFrameType::TwoD);
        video.set_ignore(true);
        let mut log = EventLog::new();
        video.emit(&film, image(None), 0, &mut log);
        assert!(log.events.is_empty());
        assert_eq!(video.position(&film), None);
    }
}
