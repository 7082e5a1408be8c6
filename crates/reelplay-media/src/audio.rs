//! Planar floating-point audio and the packed PCM24 sound-frame format.

/// Planar audio: one `Vec<f32>` per channel, all the same length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AudioBuffers {
    data: Vec<Vec<f32>>,
    frames: usize,
}

impl AudioBuffers {
    /// Silent buffers of the given shape.
    pub fn new(channels: usize, frames: usize) -> Self {
        Self {
            data: vec![vec![0.0; frames]; channels],
            frames,
        }
    }

    /// Wrap per-channel sample vectors, truncating to the shortest.
    pub fn from_channels(mut data: Vec<Vec<f32>>) -> Self {
        let frames = data.iter().map(Vec::len).min().unwrap_or(0);
        for channel in &mut data {
            channel.truncate(frames);
        }
        Self { data, frames }
    }

    pub fn channels(&self) -> usize {
        self.data.len()
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.data[index]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.data[index]
    }

    /// Append `other`'s frames; channel counts must match.
    pub fn append(&mut self, other: &AudioBuffers) {
        debug_assert_eq!(self.channels(), other.channels());
        for (mine, theirs) in self.data.iter_mut().zip(&other.data) {
            mine.extend_from_slice(theirs);
        }
        self.frames += other.frames;
    }

    /// A copy with `frames` of silence inserted before the existing audio.
    pub fn padded_front(&self, frames: usize) -> Self {
        let mut out = Self::new(self.channels(), frames);
        out.append(self);
        out
    }
}

/// Bytes per sample in a packed sound frame.
pub const PCM24_BYTES: usize = 3;

/// Divisor applied once a 24-bit sample has been placed in the top three
/// bytes of an `i32`. This is `i32::MAX - 256`, one step short of full scale.
#[allow(clippy::excessive_precision)]
pub const PCM24_DIVISOR: f32 = 2_147_483_391.0;

/// Convert one packed big-endian signed 24-bit sample to a float in `[-1, 1]`.
pub fn pcm24_to_float(bytes: [u8; 3]) -> f32 {
    let sample = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], 0]);
    (sample as f32 / PCM24_DIVISOR).clamp(-1.0, 1.0)
}

/// Unpack an interleaved PCM24 sound frame into planar float buffers.
///
/// Trailing bytes that do not make up a whole frame of `channels` samples are
/// ignored.
pub fn unpack_pcm24(data: &[u8], channels: usize) -> AudioBuffers {
    if channels == 0 {
        return AudioBuffers::default();
    }

    let stride = PCM24_BYTES * channels;
    let frames = data.len() / stride;
    let mut out = AudioBuffers::new(channels, frames);

    for (i, frame) in data.chunks_exact(stride).enumerate() {
        for (c, sample) in frame.chunks_exact(PCM24_BYTES).enumerate() {
            out.data[c][i] = pcm24_to_float([sample[0], sample[1], sample[2]]);
        }
    }

    out
}

/// Pack a float in `[-1, 1]` as big-endian signed 24-bit, the inverse of
/// [`pcm24_to_float`] up to quantisation.
pub fn float_to_pcm24(sample: f32) -> [u8; 3] {
    let scaled = (f64::from(sample.clamp(-1.0, 1.0)) * f64::from(PCM24_DIVISOR)) as i64;
    let top = (scaled.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32) >> 8;
    let bytes = top.to_be_bytes();
    [bytes[1], bytes[2], bytes[3]]
}
