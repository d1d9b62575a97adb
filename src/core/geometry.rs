//! Layout and axis helpers shared by the renderers.

use std::f64::consts::TAU;

/// Fraction of the data span added on both sides of 3D axes.
pub const AXIS_EXPANSION_FACTOR: f64 = 0.2;

/// Points evenly spaced on the unit circle, starting at angle 0 and going
/// counter-clockwise. A single node sits at the origin.
pub fn circular_layout(n: usize) -> Vec<(f64, f64)> {
    if n == 1 {
        return vec![(0.0, 0.0)];
    }
    (0..n)
        .map(|i| {
            let theta = TAU * i as f64 / n as f64;
            (theta.cos(), theta.sin())
        })
        .collect()
}

/// Widen `[min, max]` by `factor` of its span on each side.
pub fn expand_range(min: f64, max: f64, factor: f64) -> (f64, f64) {
    let span = max - min;
    (min - span * factor, max + span * factor)
}

/// Expanded range of `values`, widened to a unit span when all values are
/// equal so that axes stay drawable.
pub fn axis_range(values: impl IntoIterator<Item = f64>, factor: f64) -> (f64, f64) {
    let (min, max) = values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() || !max.is_finite() {
        return (-1.0, 1.0);
    }
    if max - min == 0.0 {
        return (min - 0.5, max + 0.5);
    }
    expand_range(min, max, factor)
}

pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}

/// Camera position relative to the scene center, in normalized scene units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraEye {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl CameraEye {
    pub const DEFAULT: CameraEye = CameraEye {
        x: 1.25,
        y: 1.25,
        z: 1.25,
    };

    /// Starting eye of the rotating GIF.
    pub const ORBIT_START: CameraEye = CameraEye {
        x: 1.2,
        y: 1.2,
        z: 0.5,
    };

    /// Rotate around the Z axis by `theta` radians.
    pub fn rotate_around_z(self, theta: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
            z: self.z,
        }
    }

    /// (yaw, pitch) in radians for the 3D projection.
    pub fn projection_angles(self) -> (f64, f64) {
        let yaw = self.y.atan2(self.x);
        let pitch = self.z.atan2(self.x.hypot(self.y));
        (yaw, pitch)
    }
}

/// Number of frames in one full turn at `speed_deg_s / fps` degrees per
/// frame: the length of the half-open range `[0, 360)`. Saturates for
/// vanishing steps.
pub fn orbit_frame_count(fps: u32, speed_deg_s: f64) -> usize {
    (360.0 * fps as f64 / speed_deg_s - 1e-9).ceil() as usize
}

/// Eyes for one full turn around Z, `speed_deg_s / fps` degrees apart.
pub fn orbit_frames(start: CameraEye, fps: u32, speed_deg_s: f64) -> Vec<CameraEye> {
    let step = (speed_deg_s / fps as f64).to_radians();
    let n = orbit_frame_count(fps, speed_deg_s);
    (0..n)
        .map(|k| start.rotate_around_z(-(k as f64 * step)))
        .collect()
}

/// Per-frame delay of an animation, rounded to whole milliseconds.
pub fn frame_delay_ms(fps: u32) -> u32 {
    (1000.0 / fps as f64).round() as u32
}
