//! Synthetic assets whose frames are computed from their index.

use crate::asset::{
    Asset, AtmosAsset, BoxedFrameReader, FontData, FrameReader, PictureAsset, PictureKind, Size,
    SoundAsset, StereoPictureFrame, Subtitle, SubtitleAsset,
};
use crate::audio::float_to_pcm24;
use crate::key::DecryptionKey;
use crate::{Error, Result};
use bytes::{BufMut, Bytes, BytesMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Encryption state of a synthetic asset.
#[derive(Debug, Clone, Default)]
struct Lock {
    key_id: Option<String>,
    key: Option<DecryptionKey>,
}

impl Lock {
    fn check(&self, asset: &str, key: Option<&DecryptionKey>) -> Result<()> {
        match (&self.key, key) {
            (None, _) => Ok(()),
            (Some(_), None) => Err(Error::decryption(format!("asset {asset} is encrypted"))),
            (Some(expected), Some(given)) if expected == given => Ok(()),
            (Some(_), Some(_)) => Err(Error::decryption(format!("wrong key for asset {asset}"))),
        }
    }
}

/// Counts frames read while authentication-tag checking was enabled.
#[derive(Debug, Clone, Default)]
pub struct HmacCounter(Arc<AtomicUsize>);

impl HmacCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

struct SyntheticReader<F> {
    asset: String,
    duration: i64,
    check_hmac: bool,
    hmac: HmacCounter,
    make: Box<dyn Fn(i64) -> F + Send>,
}

impl<F> FrameReader<F> for SyntheticReader<F> {
    fn set_check_hmac(&mut self, check: bool) {
        self.check_hmac = check;
    }

    fn get_frame(&mut self, index: i64) -> Result<F> {
        if index < 0 || index >= self.duration {
            return Err(Error::FrameOutOfRange {
                asset: self.asset.clone(),
                frame: index,
                duration: self.duration,
            });
        }
        if self.check_hmac {
            self.hmac.bump();
        }
        Ok((self.make)(index))
    }
}

fn reader<F: 'static>(
    asset: &str,
    duration: i64,
    hmac: &HmacCounter,
    make: impl Fn(i64) -> F + Send + 'static,
) -> BoxedFrameReader<F> {
    Box::new(SyntheticReader {
        asset: asset.to_string(),
        duration,
        check_hmac: true,
        hmac: hmac.clone(),
        make: Box::new(make),
    })
}

/// Frame payload: `tag` followed by the big-endian frame index.
pub fn frame_payload(tag: &[u8], index: i64) -> Bytes {
    let mut buf = BytesMut::with_capacity(tag.len() + 8);
    buf.put_slice(tag);
    buf.put_i64(index);
    buf.freeze()
}

/// Picture frames are `b"J2K"`, `b"J2KL"` or `b"J2KR"` followed by the index.
#[derive(Debug)]
pub struct MemoryPicture {
    id: String,
    kind: Option<PictureKind>,
    size: Size,
    frame_rate: f64,
    duration: i64,
    lock: Lock,
    hmac: HmacCounter,
}

impl MemoryPicture {
    pub fn new(id: impl Into<String>, kind: Option<PictureKind>, duration: i64) -> Self {
        Self {
            id: id.into(),
            kind,
            size: Size::new(1998, 1080),
            frame_rate: 24.0,
            duration,
            lock: Lock::default(),
            hmac: HmacCounter::default(),
        }
    }

    pub fn with_frame_rate(mut self, rate: f64) -> Self {
        self.frame_rate = rate;
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    pub fn encrypted(mut self, key_id: impl Into<String>, key: DecryptionKey) -> Self {
        self.lock = Lock {
            key_id: Some(key_id.into()),
            key: Some(key),
        };
        self
    }

    pub fn hmac_counter(&self) -> HmacCounter {
        self.hmac.clone()
    }
}

impl Asset for MemoryPicture {
    fn id(&self) -> &str {
        &self.id
    }

    fn intrinsic_duration(&self) -> i64 {
        self.duration
    }

    fn key_id(&self) -> Option<&str> {
        self.lock.key_id.as_deref()
    }
}

impl PictureAsset for MemoryPicture {
    fn kind(&self) -> Option<PictureKind> {
        self.kind
    }

    fn size(&self) -> Size {
        self.size
    }

    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn start_mono_read(&self, key: Option<&DecryptionKey>) -> Result<BoxedFrameReader<Bytes>> {
        if self.kind != Some(PictureKind::Mono) {
            return Err(Error::wrong_essence(&self.id, "not a mono picture asset"));
        }
        self.lock.check(&self.id, key)?;
        Ok(reader(&self.id, self.duration, &self.hmac, |i| {
            frame_payload(b"J2K", i)
        }))
    }

    fn start_stereo_read(
        &self,
        key: Option<&DecryptionKey>,
    ) -> Result<BoxedFrameReader<StereoPictureFrame>> {
        if self.kind != Some(PictureKind::Stereo) {
            return Err(Error::wrong_essence(&self.id, "not a stereo picture asset"));
        }
        self.lock.check(&self.id, key)?;
        Ok(reader(&self.id, self.duration, &self.hmac, |i| {
            StereoPictureFrame {
                left: frame_payload(b"J2KL", i),
                right: frame_payload(b"J2KR", i),
            }
        }))
    }
}

/// Sound whose samples follow [`MemorySound::sample_value`].
#[derive(Debug)]
pub struct MemorySound {
    id: String,
    channels: usize,
    sampling_rate: u32,
    frame_rate: u32,
    duration: i64,
    lock: Lock,
    hmac: HmacCounter,
}

impl MemorySound {
    pub fn new(id: impl Into<String>, channels: usize, duration: i64) -> Self {
        Self {
            id: id.into(),
            channels,
            sampling_rate: 48_000,
            frame_rate: 24,
            duration,
            lock: Lock::default(),
            hmac: HmacCounter::default(),
        }
    }

    pub fn with_rates(mut self, sampling_rate: u32, frame_rate: u32) -> Self {
        self.sampling_rate = sampling_rate;
        self.frame_rate = frame_rate;
        self
    }

    pub fn encrypted(mut self, key_id: impl Into<String>, key: DecryptionKey) -> Self {
        self.lock = Lock {
            key_id: Some(key_id.into()),
            key: Some(key),
        };
        self
    }

    pub fn hmac_counter(&self) -> HmacCounter {
        self.hmac.clone()
    }

    /// Samples in each edit unit.
    pub fn samples_per_frame(&self) -> usize {
        (self.sampling_rate / self.frame_rate.max(1)) as usize
    }

    /// Value of `sample` within edit unit `frame` on `channel`, in `[-0.5, 0.5)`.
    pub fn sample_value(frame: i64, sample: usize, channel: usize) -> f32 {
        let n = (frame as u64).wrapping_mul(7919) + sample as u64 * 31 + channel as u64 * 1009;
        (n % 1000) as f32 / 1000.0 - 0.5
    }
}

impl Asset for MemorySound {
    fn id(&self) -> &str {
        &self.id
    }

    fn intrinsic_duration(&self) -> i64 {
        self.duration
    }

    fn key_id(&self) -> Option<&str> {
        self.lock.key_id.as_deref()
    }
}

impl SoundAsset for MemorySound {
    fn channels(&self) -> usize {
        self.channels
    }

    fn sampling_rate(&self) -> u32 {
        self.sampling_rate
    }

    fn start_read(&self, key: Option<&DecryptionKey>) -> Result<BoxedFrameReader<Bytes>> {
        self.lock.check(&self.id, key)?;
        let channels = self.channels;
        let samples = self.samples_per_frame();
        Ok(reader(&self.id, self.duration, &self.hmac, move |frame| {
            let mut buf = BytesMut::with_capacity(samples * channels * 3);
            for s in 0..samples {
                for c in 0..channels {
                    buf.put_slice(&float_to_pcm24(Self::sample_value(frame, s, c)));
                }
            }
            buf.freeze()
        }))
    }
}

#[derive(Debug)]
pub struct MemorySubtitle {
    id: String,
    duration: i64,
    language: Option<String>,
    subtitles: Vec<Subtitle>,
    fonts: Vec<FontData>,
}

impl MemorySubtitle {
    pub fn new(id: impl Into<String>, duration: i64, subtitles: Vec<Subtitle>) -> Self {
        Self {
            id: id.into(),
            duration,
            language: None,
            subtitles,
            fonts: Vec::new(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_font(mut self, id: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.fonts.push(FontData {
            id: id.into(),
            data: data.into(),
        });
        self
    }
}

impl Asset for MemorySubtitle {
    fn id(&self) -> &str {
        &self.id
    }

    fn intrinsic_duration(&self) -> i64 {
        self.duration
    }
}

impl SubtitleAsset for MemorySubtitle {
    fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    fn subtitles(&self) -> &[Subtitle] {
        &self.subtitles
    }

    fn font_data(&self) -> Vec<FontData> {
        self.fonts.clone()
    }
}

/// Object-audio frames are `b"IAB"` followed by the index.
#[derive(Debug)]
pub struct MemoryAtmos {
    id: String,
    duration: i64,
    first_frame: i64,
    max_channel_count: u32,
    max_object_count: u32,
    atmos_version: u32,
    hmac: HmacCounter,
}

impl MemoryAtmos {
    pub fn new(id: impl Into<String>, duration: i64) -> Self {
        Self {
            id: id.into(),
            duration,
            first_frame: 0,
            max_channel_count: 10,
            max_object_count: 118,
            atmos_version: 1,
            hmac: HmacCounter::default(),
        }
    }

    pub fn with_first_frame(mut self, first_frame: i64) -> Self {
        self.first_frame = first_frame;
        self
    }

    pub fn hmac_counter(&self) -> HmacCounter {
        self.hmac.clone()
    }
}

impl Asset for MemoryAtmos {
    fn id(&self) -> &str {
        &self.id
    }

    fn intrinsic_duration(&self) -> i64 {
        self.duration
    }
}

impl AtmosAsset for MemoryAtmos {
    fn first_frame(&self) -> i64 {
        self.first_frame
    }

    fn max_channel_count(&self) -> u32 {
        self.max_channel_count
    }

    fn max_object_count(&self) -> u32 {
        self.max_object_count
    }

    fn atmos_version(&self) -> u32 {
        self.atmos_version
    }

    fn start_read(&self, _key: Option<&DecryptionKey>) -> Result<BoxedFrameReader<Bytes>> {
        Ok(reader(&self.id, self.duration, &self.hmac, |i| {
            frame_payload(b"IAB", i)
        }))
    }
}
