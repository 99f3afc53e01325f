//! Plinko - drop-game simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (board layout, collisions, landing, payouts)
//! - `config`: Physics tuning shared by every board
//! - `error`: Configuration errors
//!
//! Rendering, audio and persistence live in the host; it feeds board
//! dimensions and drop requests in and renders the balls and events that
//! come back out.

pub mod config;
pub mod error;
pub mod sim;

pub use config::PhysicsConfig;
pub use error::{PlinkoError, Result};
pub use sim::{
    Ball, BallState, Board, DiscardReason, LandingCause, MultiplierTable, RiskTier, SimEvent,
    Simulation,
};

/// Simulation defaults
pub mod consts {
    /// Fixed simulation timestep in milliseconds (120 Hz)
    pub const STEP_MS: f32 = 1000.0 / 120.0;
    /// Typical host frame length (60 Hz)
    pub const FRAME_MS: f32 = 1000.0 / 60.0;
    /// Maximum fixed steps per `tick` call to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Reference board
    pub const DEFAULT_ROWS: u32 = 16;
    pub const DEFAULT_WIDTH: f32 = 800.0;
    pub const DEFAULT_HEIGHT: f32 = 600.0;
    /// Largest supported row count
    pub const MAX_ROWS: u32 = 64;

    /// Lattice unit (smaller peg spacing) of the reference board. Motion
    /// constants are given at this spacing and scale with the board.
    pub const REFERENCE_SPACING: f32 = DEFAULT_HEIGHT / (DEFAULT_ROWS as f32 + 4.0);

    /// Gravity in px/s² at the reference spacing (≈0.25 px/frame² at 60 Hz)
    pub const GRAVITY: f32 = 900.0;
    /// Hard cap on ball speed in px/s at the reference spacing
    pub const MAX_SPEED: f32 = 1200.0;

    /// Balls that have not landed after this long are forced into a slot
    pub const LANDING_TIMEOUT_MS: f32 = 10_000.0;
}
