//! Landing-angle math and easing for the domain wheel.
//!
//! Angles are in degrees, measured clockwise from the positive x axis as on a
//! screen canvas, so the pointer at the top of the wheel sits at 270°.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Screen angle of the fixed pointer.
pub const POINTER_DEG: f64 = 270.0;
/// Full turns added to every spin before the landing offset.
pub const MIN_FULL_TURNS: u32 = 5;
/// Length of the spin animation.
pub const SPIN_DURATION: Duration = Duration::from_millis(4000);

/// One labelled slice of the wheel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WheelSegment {
    pub label: String,
    pub color: String,
    #[serde(default = "default_text_color")]
    pub text_color: String,
}

impl WheelSegment {
    pub fn new(label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            color: color.into(),
            text_color: default_text_color(),
        }
    }
}

fn default_text_color() -> String {
    "#ffffff".to_string()
}

/// Domains offered when the configuration does not list any.
pub fn default_segments() -> Vec<WheelSegment> {
    vec![
        WheelSegment::new("AI in Agriculture", "#10B981"),
        WheelSegment::new("AI in Healthcare", "#EF4444"),
        WheelSegment::new("AI in Finance", "#F59E0B"),
        WheelSegment::new("AI in Education", "#3B82F6"),
    ]
}

/// Uniformly pick a segment index in `[0, count)`.
pub fn draw_index<R: Rng + ?Sized>(count: usize, rng: &mut R) -> usize {
    rng.random_range(0..count)
}

fn slice_deg(count: usize) -> f64 {
    360.0 / count as f64
}

/// Angle of the middle of segment `index`, in wheel coordinates.
pub fn segment_center_deg(index: usize, count: usize) -> f64 {
    let slice = slice_deg(count);
    index as f64 * slice + slice / 2.0
}

/// Absolute rotation that brings the center of segment `index` under the pointer,
/// at least [`MIN_FULL_TURNS`] turns past `current_deg`.
pub fn target_rotation(current_deg: f64, index: usize, count: usize) -> f64 {
    let target = POINTER_DEG - segment_center_deg(index, count);
    let offset = (target - current_deg.rem_euclid(360.0)).rem_euclid(360.0);
    current_deg + f64::from(MIN_FULL_TURNS) * 360.0 + offset
}

/// Cubic ease-out on `t` clamped to `[0, 1]`.
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) - 1.0;
    t * t * t + 1.0
}

/// Index of the segment under the pointer for an absolute rotation.
pub fn segment_under_pointer(rotation_deg: f64, count: usize) -> usize {
    let local = (POINTER_DEG - rotation_deg).rem_euclid(360.0);
    ((local / slice_deg(count)) as usize).min(count - 1)
}

/// A planned spin from `start_deg` to `target_deg`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SpinPlan {
    pub index: usize,
    pub start_deg: f64,
    pub target_deg: f64,
    pub duration: Duration,
}

impl SpinPlan {
    pub fn new(start_deg: f64, index: usize, count: usize) -> Self {
        Self {
            index,
            start_deg,
            target_deg: target_rotation(start_deg, index, count),
            duration: SPIN_DURATION,
        }
    }

    /// Rotation after `elapsed` of animation; exactly `target_deg` once finished.
    pub fn rotation_at(&self, elapsed: Duration) -> f64 {
        if elapsed >= self.duration {
            return self.target_deg;
        }
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.start_deg + (self.target_deg - self.start_deg) * ease_out_cubic(t)
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }
}

/// Screen placement of one segment for a given rotation.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SegmentFrame {
    pub label: String,
    pub color: String,
    pub text_color: String,
    pub start_deg: f64,
    pub end_deg: f64,
    /// Direction the label is drawn along, toward the rim.
    pub label_deg: f64,
}

/// Describe where every segment is drawn at `rotation_deg`.
pub fn render_frame(rotation_deg: f64, segments: &[WheelSegment]) -> Vec<SegmentFrame> {
    if segments.is_empty() {
        return Vec::new();
    }
    let slice = slice_deg(segments.len());
    let base = rotation_deg.rem_euclid(360.0);

    segments
        .iter()
        .enumerate()
        .map(|(index, segment)| {
            let start = base + index as f64 * slice;
            SegmentFrame {
                label: segment.label.clone(),
                color: segment.color.clone(),
                text_color: segment.text_color.clone(),
                start_deg: start.rem_euclid(360.0),
                end_deg: (start + slice).rem_euclid(360.0),
                label_deg: (start + slice / 2.0).rem_euclid(360.0),
            }
        })
        .collect()
}
