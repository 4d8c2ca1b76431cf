//! Ray Marching Configuration
//!
//! Pure data holding the two tunables the ray-marching shader reads every
//! frame. Follows the same pattern as the other effect settings in the engine:
//! fields are private, setters clamp into the supported range, and getters are
//! cheap.
//!
//! Settings can also be loaded from JSON (e.g. an inspector preset). Values
//! coming from a file go through the same clamping as the setters.
//!
//! ```rust,ignore
//! let mut settings = RayMarchSettings::new();
//! settings.set_maximum_iteration_count(64);
//! settings.set_maximum_march_distance(25.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Allowed range of [`RayMarchSettings::maximum_iteration_count`].
pub const ITERATION_COUNT_RANGE: std::ops::RangeInclusive<u32> = 1..=1024;

/// Allowed range of [`RayMarchSettings::maximum_march_distance`].
pub const MARCH_DISTANCE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=100.0;

const DEFAULT_ITERATION_COUNT: u32 = 20;
const DEFAULT_MARCH_DISTANCE: f32 = 10.0;

/// Screen-space ray marching configuration.
///
/// Immutable during a frame: the compositor only reads it while binding
/// material parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RayMarchSettings {
    maximum_iteration_count: u32,
    maximum_march_distance: f32,
}

impl Default for RayMarchSettings {
    fn default() -> Self {
        Self {
            maximum_iteration_count: DEFAULT_ITERATION_COUNT,
            maximum_march_distance: DEFAULT_MARCH_DISTANCE,
        }
    }
}

impl RayMarchSettings {
    /// Creates settings with the default values (20 iterations, distance 10).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses settings from a JSON document.
    ///
    /// Missing fields take their default value; out-of-range values are
    /// clamped.
    pub fn from_json(json: &str) -> Result<Self> {
        let parsed: Self = serde_json::from_str(json)?;
        Ok(parsed.sanitized())
    }

    /// Serializes the settings to a JSON document.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns a copy with every field forced into its valid range.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.set_maximum_iteration_count(self.maximum_iteration_count);
        self.set_maximum_march_distance(self.maximum_march_distance);
        self
    }

    /// Sets the maximum number of march steps per pixel.
    ///
    /// Clamped to 1..=1024.
    pub fn set_maximum_iteration_count(&mut self, count: u32) {
        self.maximum_iteration_count =
            count.clamp(*ITERATION_COUNT_RANGE.start(), *ITERATION_COUNT_RANGE.end());
    }

    /// Returns the maximum number of march steps per pixel.
    #[inline]
    #[must_use]
    pub fn maximum_iteration_count(&self) -> u32 {
        self.maximum_iteration_count
    }

    /// Sets the maximum view-space distance a ray may travel.
    ///
    /// Clamped to 0..=100. NaN resets to the default distance.
    pub fn set_maximum_march_distance(&mut self, distance: f32) {
        self.maximum_march_distance = if distance.is_nan() {
            DEFAULT_MARCH_DISTANCE
        } else {
            distance.clamp(*MARCH_DISTANCE_RANGE.start(), *MARCH_DISTANCE_RANGE.end())
        };
    }

    /// Returns the maximum view-space distance a ray may travel.
    #[inline]
    #[must_use]
    pub fn maximum_march_distance(&self) -> f32 {
        self.maximum_march_distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = RayMarchSettings::new();
        assert_eq!(s.maximum_iteration_count(), 20);
        assert_eq!(s.maximum_march_distance(), 10.0);
    }

    #[test]
    fn setters_clamp() {
        let mut s = RayMarchSettings::new();
        s.set_maximum_iteration_count(0);
        assert_eq!(s.maximum_iteration_count(), 1);
        s.set_maximum_iteration_count(5000);
        assert_eq!(s.maximum_iteration_count(), 1024);

        s.set_maximum_march_distance(-3.0);
        assert_eq!(s.maximum_march_distance(), 0.0);
        s.set_maximum_march_distance(250.0);
        assert_eq!(s.maximum_march_distance(), 100.0);
        s.set_maximum_march_distance(f32::INFINITY);
        assert_eq!(s.maximum_march_distance(), 100.0);
        s.set_maximum_march_distance(f32::NAN);
        assert_eq!(s.maximum_march_distance(), 10.0);
    }

    #[test]
    fn json_is_clamped_and_defaults_missing_fields() {
        let s = RayMarchSettings::from_json(r#"{ "maximumIterationCount": 4096 }"#).unwrap();
        assert_eq!(s.maximum_iteration_count(), 1024);
        assert_eq!(s.maximum_march_distance(), 10.0);
    }

    #[test]
    fn json_rejects_garbage() {
        assert!(RayMarchSettings::from_json("not json").is_err());
    }

    #[test]
    fn json_round_trip_preserves_values() {
        let mut s = RayMarchSettings::new();
        s.set_maximum_iteration_count(64);
        s.set_maximum_march_distance(25.5);
        let back = RayMarchSettings::from_json(&s.to_json().unwrap()).unwrap();
        assert_eq!(back, s);
    }
}
