//! Time on the two axes of playback.
//!
//! [`ContentTime`] counts ticks on a piece of content's own clock and
//! [`DcpTime`] counts ticks on the output package's clock. Both run at [`HZ`]
//! ticks per second, but they are distinct types: the only way from one to the
//! other is through a [`FrameRateChange`].
//!
//! Values are expected to be non-negative; intermediate results of
//! subtraction may dip below zero and callers clamp with [`Ord::max`].

use crate::FrameRateChange;
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Ticks per second on both time axes.
pub const HZ: i64 = 96_000;

macro_rules! time_axis {
    ($(#[$meta:meta])* $name:ident, $(#[$pmeta:meta])* $period:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(i64);

        impl $name {
            /// The largest representable time.
            pub const MAX: Self = Self(i64::MAX);

            /// Create a time from a raw tick count.
            pub const fn new(ticks: i64) -> Self {
                Self(ticks)
            }

            /// Raw tick count.
            pub const fn get(self) -> i64 {
                self.0
            }

            /// Create a time from a number of seconds.
            pub fn from_seconds(seconds: f64) -> Self {
                Self((seconds * HZ as f64).round() as i64)
            }

            /// Create the time at which frame `frames` starts at `rate` frames per second.
            ///
            /// `from_frames(n, r).frames_round(r) == n` for every `n >= 0` and `r > 0`.
            pub fn from_frames(frames: i64, rate: f64) -> Self {
                debug_assert!(rate > 0.0, "frame rate must be positive");
                Self((frames as f64 * HZ as f64 / rate).round() as i64)
            }

            /// Time in seconds.
            pub fn seconds(self) -> f64 {
                self.0 as f64 / HZ as f64
            }

            /// Frame index at `rate`, rounded to the nearest frame.
            pub fn frames_round(self, rate: f64) -> i64 {
                (self.0 as f64 * rate / HZ as f64).round() as i64
            }

            /// Frame index at `rate`, rounded down.
            pub fn frames_floor(self, rate: f64) -> i64 {
                (self.0 as f64 * rate / HZ as f64).floor() as i64
            }

            /// Frame index at `rate`, rounded up.
            pub fn frames_ceil(self, rate: f64) -> i64 {
                (self.0 as f64 * rate / HZ as f64).ceil() as i64
            }

            /// Round up to the next sampling interval at `rate`.
            pub fn round_up(self, rate: f64) -> Self {
                let n = (HZ as f64 / rate).round() as i64;
                let a = self.0 + n - 1;
                Self(a - a.rem_euclid(n))
            }

            /// `HH:MM:SS:FF` at an integer-ish `rate`.
            pub fn timecode(self, rate: f64) -> String {
                let r = (rate.round() as i64).max(1);
                let mut frames = self.frames_round(rate);
                let h = frames / (3600 * r);
                frames -= h * 3600 * r;
                let m = frames / (60 * r);
                frames -= m * 60 * r;
                let s = frames / r;
                frames -= s * r;
                format!("{:02}:{:02}:{:02}:{:02}", h, m, s, frames)
            }
        }

        impl Add for $name {
            type Output = Self;

            fn add(self, rhs: Self) -> Self {
                Self(self.0 + rhs.0)
            }
        }

        impl AddAssign for $name {
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl Sub for $name {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self {
                Self(self.0 - rhs.0)
            }
        }

        impl SubAssign for $name {
            fn sub_assign(&mut self, rhs: Self) {
                self.0 -= rhs.0;
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}[{:.3}s]", self.0, self.seconds())
            }
        }

        $(#[$pmeta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $period {
            pub from: $name,
            pub to: $name,
        }

        impl $period {
            pub const fn new(from: $name, to: $name) -> Self {
                Self { from, to }
            }

            pub fn duration(&self) -> $name {
                self.to - self.from
            }

            /// Whether the two half-open periods share any time.
            pub fn overlaps(&self, other: &Self) -> bool {
                self.from.max(other.from) < self.to.min(other.to)
            }

            /// Whether `time` lies in `[from, to)`.
            pub fn contains(&self, time: $name) -> bool {
                self.from <= time && time < self.to
            }
        }

        impl Add<$name> for $period {
            type Output = Self;

            fn add(self, rhs: $name) -> Self {
                Self::new(self.from + rhs, self.to + rhs)
            }
        }
    };
}

time_axis!(
    /// A time on a piece of content's own clock.
    ContentTime,
    /// A half-open `[from, to)` span of content time.
    ContentTimePeriod
);

time_axis!(
    /// A time on the output package's clock.
    DcpTime,
    /// A half-open `[from, to)` span of output time.
    DcpTimePeriod
);

impl ContentTime {
    /// Content time corresponding to an output time under `frc`.
    pub fn from_dcp(time: DcpTime, frc: &FrameRateChange) -> Self {
        Self((time.get() as f64 * frc.speed_up).round() as i64)
    }
}

impl DcpTime {
    /// Output time corresponding to a content time under `frc`.
    pub fn from_content(time: ContentTime, frc: &FrameRateChange) -> Self {
        Self((time.get() as f64 / frc.speed_up).round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_frames_exact_at_24() {
        assert_eq!(ContentTime::from_frames(1, 24.0).get(), 4000);
        assert_eq!(ContentTime::from_frames(24, 24.0), ContentTime::from_seconds(1.0));
    }

    #[test]
    fn test_frames_rounding_modes() {
        let t = ContentTime::new(6000); // 1.5 frames at 24fps
        assert_eq!(t.frames_floor(24.0), 1);
        assert_eq!(t.frames_ceil(24.0), 2);
        assert_eq!(t.frames_round(24.0), 2);
    }

    #[test]
    fn test_round_up() {
        assert_eq!(DcpTime::new(0).round_up(24.0), DcpTime::new(0));
        assert_eq!(DcpTime::new(1).round_up(24.0), DcpTime::new(4000));
        assert_eq!(DcpTime::new(4000).round_up(24.0), DcpTime::new(4000));
        assert_eq!(DcpTime::new(4001).round_up(24.0), DcpTime::new(8000));
    }

    #[test]
    fn test_timecode() {
        let t = DcpTime::from_frames(3600 * 24 + 61 * 24 + 5, 24.0);
        assert_eq!(t.timecode(24.0), "01:01:01:05");
    }

    #[test]
    fn test_period_overlaps_and_contains() {
        let a = ContentTimePeriod::new(ContentTime::new(0), ContentTime::new(10));
        let b = ContentTimePeriod::new(ContentTime::new(10), ContentTime::new(20));
        let c = ContentTimePeriod::new(ContentTime::new(5), ContentTime::new(15));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
        assert!(a.contains(ContentTime::new(0)));
        assert!(!a.contains(ContentTime::new(10)));
        assert_eq!(c.duration(), ContentTime::new(10));
    }

    #[test]
    fn test_axis_conversion_through_speed_up() {
        // 25fps content played in a 24fps package runs slow by 24/25
        let frc = FrameRateChange::new(25.0, 24);
        let content = ContentTime::from_seconds(25.0);
        let dcp = DcpTime::from_content(content, &frc);
        assert_eq!(dcp, DcpTime::from_seconds(25.0 * 25.0 / 24.0));
        assert_eq!(ContentTime::from_dcp(dcp, &frc), content);
    }

    proptest! {
        #[test]
        fn frames_round_trip(n in 0i64..50_000_000, rate in prop::sample::select(vec![
            23.976, 24.0, 25.0, 29.97, 30.0, 48.0, 50.0, 59.94, 60.0, 96.0, 100.0, 120.0,
        ])) {
            prop_assert_eq!(ContentTime::from_frames(n, rate).frames_round(rate), n);
            prop_assert_eq!(DcpTime::from_frames(n, rate).frames_round(rate), n);
        }
    }
}
