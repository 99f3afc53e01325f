//! Physics tuning
//!
//! One struct holds every "feel" constant the simulation uses. Defaults
//! reproduce the reference high-risk 16-row board; hosts can override any
//! field from JSON (missing fields keep their defaults).
//!
//! Lengths and speeds are given at [`REFERENCE_SPACING`]. Each board scales
//! them by its own lattice spacing (see [`PhysicsConfig::scaled`]) so a drop
//! behaves the same on a small window as on a large one.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{PlinkoError, Result};

/// Simulation tuning shared by every board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    // === Motion ===
    /// Downward acceleration (px/s²)
    pub gravity: f32,
    /// Scales gravity; the host's "drop speed" slider
    pub speed_multiplier: f32,
    /// Hard speed cap after collision response (px/s)
    pub max_speed: f32,
    /// Horizontal air drag per second; keeps sideways bounces from carrying
    /// a ball across the whole board
    pub air_damping: f32,

    // === Collision response ===
    /// Fraction of normal velocity kept after a bounce (0.6 - 0.85)
    pub restitution: f32,
    /// Damping of the tangential velocity on contact (0 - 1)
    pub friction: f32,
    /// Share of penetration removed per contact (0.7 - 1.0)
    pub correction: f32,
    /// Max random velocity kick per axis on a bounce (px/s)
    pub bounce_jitter: f32,

    // === Geometry (relative to lattice spacing) ===
    /// Peg radius as a fraction of the smaller lattice spacing
    pub peg_radius_scale: f32,
    /// Ball radius as a fraction of the smaller lattice spacing
    pub ball_radius_scale: f32,
    /// Spatial grid cell size as a multiple of the ball radius
    pub cell_size_factor: f32,

    // === Trail ===
    /// Trail points kept per ball
    pub trail_length: usize,
    /// Record a trail point every N steps
    pub trail_sample_interval: u32,

    // === Lifecycle ===
    /// Force a landing after this much simulated time (ms)
    pub landing_timeout_ms: f32,
    /// Below this speed (px/s) a ball near the floor counts as resting
    pub sleep_speed: f32,
    /// Consecutive resting steps before a ball is settled
    pub sleep_ticks: u32,
    /// Distance below the board before a ball is discarded (px)
    pub out_of_bounds_margin: f32,
    /// Peg glow decay per second
    pub peg_glow_decay: f32,

    // === Stepping ===
    /// Fixed step length (ms)
    pub step_ms: f32,
    /// Maximum fixed steps per host frame
    pub max_substeps: u32,
    /// Host frame deltas are clamped to this (ms)
    pub max_frame_ms: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            speed_multiplier: 1.0,
            max_speed: MAX_SPEED,
            air_damping: 4.0,

            restitution: 0.7,
            friction: 0.1,
            correction: 0.8,
            bounce_jitter: 12.0,

            peg_radius_scale: 0.12,
            ball_radius_scale: 0.22,
            cell_size_factor: 6.0,

            trail_length: 20,
            trail_sample_interval: 2,

            landing_timeout_ms: LANDING_TIMEOUT_MS,
            sleep_speed: 8.0,
            sleep_ticks: 30,
            out_of_bounds_margin: 50.0,
            peg_glow_decay: 4.0,

            step_ms: STEP_MS,
            max_substeps: MAX_SUBSTEPS,
            max_frame_ms: 100.0,
        }
    }
}

impl PhysicsConfig {
    /// Parse from JSON and validate
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Copy with every length-based value multiplied by `factor`.
    ///
    /// Applied per board with `factor = lattice unit / REFERENCE_SPACING`.
    /// Restitution, friction, damping and timings are unitless or pure time
    /// and stay as they are.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            gravity: self.gravity * factor,
            max_speed: self.max_speed * factor,
            bounce_jitter: self.bounce_jitter * factor,
            sleep_speed: self.sleep_speed * factor,
            out_of_bounds_margin: self.out_of_bounds_margin * factor,
            ..self.clone()
        }
    }

    /// Fixed step length in seconds
    #[inline]
    pub fn step_secs(&self) -> f32 {
        self.step_ms / 1000.0
    }

    /// Effective gravity (gravity scaled by the speed multiplier)
    #[inline]
    pub fn effective_gravity(&self) -> f32 {
        self.gravity * self.speed_multiplier
    }

    /// Reject values the simulation cannot make progress with
    pub fn validate(&self) -> Result<()> {
        positive("gravity", self.gravity)?;
        positive("speed_multiplier", self.speed_multiplier)?;
        positive("max_speed", self.max_speed)?;
        // Damping over one step must not reverse the velocity
        let max_damping = 1000.0 / self.step_ms.max(1.0);
        in_range("air_damping", self.air_damping, 0.0, max_damping)?;
        in_range("restitution", self.restitution, 0.0, 1.0)?;
        in_range("friction", self.friction, 0.0, 1.0)?;
        in_range("correction", self.correction, 0.0, 1.0)?;
        if !self.bounce_jitter.is_finite() || self.bounce_jitter < 0.0 {
            return Err(PlinkoError::parameter(
                "bounce_jitter",
                "must be zero or positive",
            ));
        }
        positive("peg_radius_scale", self.peg_radius_scale)?;
        positive("ball_radius_scale", self.ball_radius_scale)?;
        // Pegs one spacing apart must leave a gap the ball fits through
        if self.peg_radius_scale + self.ball_radius_scale >= 0.5 {
            return Err(PlinkoError::parameter(
                "ball_radius_scale",
                "ball and peg radii leave no gap between pegs",
            ));
        }
        // Cells narrower than the ball diameter make queries expensive
        if !self.cell_size_factor.is_finite() || self.cell_size_factor < 2.0 {
            return Err(PlinkoError::parameter(
                "cell_size_factor",
                "must be at least 2 (one ball diameter)",
            ));
        }
        if self.trail_sample_interval == 0 {
            return Err(PlinkoError::parameter(
                "trail_sample_interval",
                "must be at least 1",
            ));
        }
        positive("landing_timeout_ms", self.landing_timeout_ms)?;
        positive("step_ms", self.step_ms)?;
        positive("max_frame_ms", self.max_frame_ms)?;
        if self.max_substeps == 0 {
            return Err(PlinkoError::parameter("max_substeps", "must be at least 1"));
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PlinkoError::parameter(
            name,
            format!("must be positive, got {value}"),
        ))
    }
}

fn in_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(PlinkoError::parameter(
            name,
            format!("must be within [{min}, {max}], got {value}"),
        ))
    }
}
