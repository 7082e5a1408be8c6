//! Relationship between a content's native frame rate and the output rate.

/// Tolerance used when comparing nominal frame rates.
///
/// A film lasting `F` seconds drifts by `F * d` frames when its rate is off
/// by `d`; allowing one frame of drift over three hours gives `d ~= 1e-4`.
pub const RATE_EPSILON: f64 = 1e-4;

/// Whether two nominal rates are the same for playback purposes.
pub fn about_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < RATE_EPSILON
}

/// How content at `source` frames per second is fitted into an output
/// running at `dcp` frames per second.
///
/// Frames are either skipped (every other one is used), repeated a whole
/// number of times, or used one-for-one; whatever mismatch remains is taken
/// up by running the content slightly faster or slower (`speed_up`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRateChange {
    /// Content frame rate.
    pub source: f64,
    /// Output frame rate.
    pub dcp: i32,
    /// Use every other content frame.
    pub skip: bool,
    /// Number of times each content frame is used (1 for no repeat).
    pub repeat: i32,
    /// Output frames per second divided by (content frames per second times `factor()`).
    pub speed_up: f64,
    /// Whether `speed_up` is far enough from 1 to matter.
    pub change_speed: bool,
}

impl FrameRateChange {
    pub fn new(source: f64, dcp: i32) -> Self {
        let dcp_f = f64::from(dcp);
        let mut skip = false;
        let mut repeat = 1;

        if (source / 2.0 - dcp_f).abs() < (source - dcp_f).abs() {
            // halving the content rate lands closer to the output rate
            skip = true;
        } else if (source * 2.0 - dcp_f).abs() < (source - dcp_f).abs() {
            repeat = (dcp_f / source).round() as i32;
        }

        let factor = if skip { 0.5 } else { f64::from(repeat) };
        let speed_up = dcp_f / (source * factor);

        Self {
            source,
            dcp,
            skip,
            repeat,
            speed_up,
            change_speed: !about_equal(speed_up, 1.0),
        }
    }

    /// Output frames produced per content frame.
    pub fn factor(&self) -> f64 {
        if self.skip {
            0.5
        } else {
            f64::from(self.repeat)
        }
    }

    /// Whether content and output run at the same rate with no adjustment.
    pub fn is_identity(&self) -> bool {
        !self.skip && self.repeat == 1 && !self.change_speed
    }

    /// Human-readable summary of the change.
    pub fn description(&self) -> String {
        if self.is_identity() {
            return "Content and output have the same rate.\n".to_string();
        }

        let mut description = String::new();
        if self.skip {
            description.push_str("Output will use every other frame of the content.\n");
        } else if self.repeat == 2 {
            description.push_str("Each content frame will be doubled in the output.\n");
        } else if self.repeat > 2 {
            description.push_str(&format!(
                "Each content frame will be repeated {} more times in the output.\n",
                self.repeat - 1
            ));
        }

        if self.change_speed {
            let pc = f64::from(self.dcp) * 100.0 / (self.source * self.factor());
            description.push_str(&format!(
                "Output will run at {:.1}% of the content speed.\n",
                pc
            ));
        }

        description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let frc = FrameRateChange::new(24.0, 24);
        assert!(frc.is_identity());
        assert_eq!(frc.speed_up, 1.0);
    }

    #[test]
    fn test_skip_50_to_24() {
        let frc = FrameRateChange::new(50.0, 24);
        assert!(frc.skip);
        assert_eq!(frc.factor(), 0.5);
        assert!((frc.speed_up - 0.96).abs() < 1e-9);
        assert!(frc.change_speed);
    }

    #[test]
    fn test_repeat_12_to_48() {
        let frc = FrameRateChange::new(12.0, 48);
        assert!(!frc.skip);
        assert_eq!(frc.repeat, 4);
        assert!(!frc.change_speed);
        assert!(frc.description().contains("repeated 3 more times"));
    }

    #[test]
    fn test_nominal_rates_are_not_equal() {
        // 23.976 is close to 24 but far outside the epsilon
        let frc = FrameRateChange::new(23.976, 24);
        assert!(frc.change_speed);
        assert!(frc.description().contains("100.1%"));
    }

    #[test]
    fn test_about_equal_epsilon() {
        assert!(about_equal(24.0, 24.00005));
        assert!(!about_equal(24.0, 24.0002));
    }
}
