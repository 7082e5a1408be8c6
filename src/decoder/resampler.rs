//! Streaming sample-rate conversion by linear interpolation.

use reelplay_media::AudioBuffers;

/// Converts a continuous stream of audio from one rate to another.
///
/// Output sample `k` is taken at input position `k * input_rate / output_rate`,
/// interpolated between its two neighbouring input samples. The last input
/// sample is held back until the next call (or [`Resampler::flush`]) since
/// its right-hand neighbour is not known yet.
#[derive(Debug, Clone)]
pub struct Resampler {
    input_rate: u32,
    output_rate: u32,
    channels: usize,
    /// Input samples from index `base` onwards that may still be needed.
    history: Vec<Vec<f32>>,
    base: u64,
    /// Input samples received so far.
    received: u64,
    /// Output samples produced so far.
    produced: u64,
}

impl Resampler {
    pub fn new(input_rate: u32, output_rate: u32, channels: usize) -> Self {
        Self {
            input_rate,
            output_rate,
            channels,
            history: vec![Vec::new(); channels],
            base: 0,
            received: 0,
            produced: 0,
        }
    }

    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    /// Input position of output sample `k` as (index, fraction).
    fn source(&self, k: u64) -> (u64, f32) {
        let scaled = k * u64::from(self.input_rate);
        let out = u64::from(self.output_rate);
        (scaled / out, (scaled % out) as f32 / out as f32)
    }

    fn produce(&mut self, whole: bool) -> AudioBuffers {
        let in_rate = u64::from(self.input_rate);
        let out_rate = u64::from(self.output_rate);
        // Output k is ready once input k * in / out has a right-hand neighbour;
        // when flushing, the last input stands in for its own neighbour.
        let limit = if whole {
            self.received * out_rate
        } else {
            self.received.saturating_sub(1) * out_rate
        };

        let mut out: Vec<Vec<f32>> = vec![Vec::new(); self.channels];
        while self.produced * in_rate < limit {
            let (index, frac) = self.source(self.produced);
            let i0 = (index - self.base) as usize;
            for (c, channel) in out.iter_mut().enumerate() {
                let history = &self.history[c];
                let s0 = history[i0];
                let s1 = history.get(i0 + 1).copied().unwrap_or(s0);
                channel.push(s0 + (s1 - s0) * frac);
            }
            self.produced += 1;
        }

        let (next, _) = self.source(self.produced);
        let drop = next.min(self.received).saturating_sub(self.base) as usize;
        for channel in &mut self.history {
            channel.drain(..drop.min(channel.len()));
        }
        self.base += drop as u64;

        AudioBuffers::from_channels(out)
    }

    /// Feed `input` and return whatever output is now ready.
    pub fn run(&mut self, input: &AudioBuffers) -> AudioBuffers {
        debug_assert_eq!(input.channels(), self.channels);
        for (c, channel) in self.history.iter_mut().enumerate() {
            channel.extend_from_slice(input.channel(c));
        }
        self.received += input.frames() as u64;
        self.produce(false)
    }

    /// Return the output still held back.
    ///
    /// After a flush exactly `ceil(received * output_rate / input_rate)`
    /// samples have been produced in total.
    pub fn flush(&mut self) -> AudioBuffers {
        self.produce(true)
    }

    /// Forget all state, as if newly created.
    pub fn reset(&mut self) {
        *self = Self::new(self.input_rate, self.output_rate, self.channels);
    }
}
