//! Keyframe Animation Helper
//!
//! Linear interpolation over keyframed scalar parameters, used by the UI for
//! property animation. Keyframe timestamps are validated at construction:
//! out-of-order or duplicate timestamps are rejected rather than silently
//! reordered, so a malformed track is caught at the call site that built it.

use serde::{Deserialize, Serialize};

use crate::{MediaError, MediaResult, TimeSec};

// =============================================================================
// Keyframes
// =============================================================================

/// Easing applied from a keyframe to the next one
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Linear interpolation to the next keyframe
    #[default]
    Linear,
    /// Hold this value until the next keyframe
    Hold,
}

/// A single keyframe of a scalar parameter
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyframe {
    /// Time offset from the animation start, in seconds
    pub time_offset: TimeSec,
    /// Parameter value at this keyframe
    pub value: f64,
    /// Easing to the next keyframe
    #[serde(default)]
    pub easing: Easing,
}

impl Keyframe {
    /// Creates a linear keyframe
    pub fn new(time_offset: TimeSec, value: f64) -> Self {
        Self {
            time_offset,
            value,
            easing: Easing::Linear,
        }
    }

    /// Creates a keyframe with explicit easing
    pub fn with_easing(time_offset: TimeSec, value: f64, easing: Easing) -> Self {
        Self {
            time_offset,
            value,
            easing,
        }
    }
}

// =============================================================================
// Keyframe Track
// =============================================================================

/// A validated, time-ordered sequence of keyframes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyframeTrack {
    keyframes: Vec<Keyframe>,
}

impl KeyframeTrack {
    /// Builds a track, validating the keyframes.
    ///
    /// Timestamps must be finite, non-negative, and strictly increasing;
    /// anything else is a validation error. The track must not be empty.
    pub fn new(keyframes: Vec<Keyframe>) -> MediaResult<Self> {
        if keyframes.is_empty() {
            return Err(MediaError::Validation(
                "Keyframe track must contain at least one keyframe".to_string(),
            ));
        }

        for kf in &keyframes {
            if !kf.time_offset.is_finite() || kf.time_offset < 0.0 {
                return Err(MediaError::Validation(format!(
                    "Keyframe time offset must be finite and non-negative, got {}",
                    kf.time_offset
                )));
            }
            if !kf.value.is_finite() {
                return Err(MediaError::Validation(format!(
                    "Keyframe value must be finite, got {}",
                    kf.value
                )));
            }
        }

        for pair in keyframes.windows(2) {
            if pair[1].time_offset <= pair[0].time_offset {
                return Err(MediaError::Validation(format!(
                    "Keyframe timestamps must be strictly increasing: {} does not follow {}",
                    pair[1].time_offset, pair[0].time_offset
                )));
            }
        }

        Ok(Self { keyframes })
    }

    /// The validated keyframes, in time order
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Interpolated value at the given time offset.
    ///
    /// Clamps before the first and after the last keyframe; between
    /// neighbors the value is linearly interpolated, unless the earlier
    /// keyframe holds.
    pub fn value_at(&self, time_offset: TimeSec) -> f64 {
        let first = &self.keyframes[0];
        if time_offset <= first.time_offset {
            return first.value;
        }

        let last = self
            .keyframes
            .last()
            .unwrap_or(first);
        if time_offset >= last.time_offset {
            return last.value;
        }

        for pair in self.keyframes.windows(2) {
            let (kf1, kf2) = (&pair[0], &pair[1]);
            if time_offset < kf2.time_offset {
                if kf1.easing == Easing::Hold {
                    return kf1.value;
                }
                // Strictly increasing timestamps make the span positive.
                let span = kf2.time_offset - kf1.time_offset;
                let t = ((time_offset - kf1.time_offset) / span).clamp(0.0, 1.0);
                return kf1.value + (kf2.value - kf1.value) * t;
            }
        }

        last.value
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_empty_track_is_rejected() {
        assert!(matches!(
            KeyframeTrack::new(vec![]),
            Err(MediaError::Validation(_))
        ));
    }

    #[test]
    fn test_out_of_order_timestamps_are_rejected() {
        let result = KeyframeTrack::new(vec![Keyframe::new(2.0, 1.0), Keyframe::new(1.0, 0.0)]);
        assert!(matches!(result, Err(MediaError::Validation(_))));
    }

    #[test]
    fn test_duplicate_timestamps_are_rejected() {
        let result = KeyframeTrack::new(vec![Keyframe::new(1.0, 0.0), Keyframe::new(1.0, 5.0)]);
        assert!(matches!(result, Err(MediaError::Validation(_))));
    }

    #[test]
    fn test_non_finite_inputs_are_rejected() {
        assert!(KeyframeTrack::new(vec![Keyframe::new(f64::NAN, 0.0)]).is_err());
        assert!(KeyframeTrack::new(vec![Keyframe::new(-1.0, 0.0)]).is_err());
        assert!(KeyframeTrack::new(vec![Keyframe::new(0.0, f64::INFINITY)]).is_err());
    }

    // -------------------------------------------------------------------------
    // Interpolation Tests
    // -------------------------------------------------------------------------

    fn ramp() -> KeyframeTrack {
        KeyframeTrack::new(vec![
            Keyframe::new(0.0, 0.0),
            Keyframe::new(2.0, 10.0),
            Keyframe::new(4.0, 10.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_value_clamps_outside_the_track() {
        let track = ramp();
        assert_eq!(track.value_at(-5.0), 0.0);
        assert_eq!(track.value_at(99.0), 10.0);
    }

    #[test]
    fn test_value_at_keyframes_is_exact() {
        let track = ramp();
        assert_eq!(track.value_at(0.0), 0.0);
        assert_eq!(track.value_at(2.0), 10.0);
        assert_eq!(track.value_at(4.0), 10.0);
    }

    #[test]
    fn test_linear_interpolation_between_keyframes() {
        let track = ramp();
        assert_eq!(track.value_at(1.0), 5.0);
        assert_eq!(track.value_at(0.5), 2.5);
        assert_eq!(track.value_at(3.0), 10.0);
    }

    #[test]
    fn test_hold_easing_steps_at_the_next_keyframe() {
        let track = KeyframeTrack::new(vec![
            Keyframe::with_easing(0.0, 1.0, Easing::Hold),
            Keyframe::new(2.0, 9.0),
        ])
        .unwrap();

        assert_eq!(track.value_at(1.0), 1.0);
        assert_eq!(track.value_at(1.999), 1.0);
        assert_eq!(track.value_at(2.0), 9.0);
    }

    #[test]
    fn test_single_keyframe_track_is_constant() {
        let track = KeyframeTrack::new(vec![Keyframe::new(1.0, 7.0)]).unwrap();
        assert_eq!(track.value_at(0.0), 7.0);
        assert_eq!(track.value_at(1.0), 7.0);
        assert_eq!(track.value_at(2.0), 7.0);
    }
}
