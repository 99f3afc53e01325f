//! Deterministic simulation module
//!
//! All board and ball logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by ball ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod layout;
pub mod multipliers;
pub mod spatial;
pub mod state;
pub mod tick;

pub use collision::{Bounds, Contact, circle_contact, resolve};
pub use layout::{Board, Layout, Spacing, layout};
pub use multipliers::{MultiplierTable, RiskTier, generate_curve, round_multiplier};
pub use spatial::SpatialIndex;
pub use state::{
    Ball, BallId, BallState, DiscardReason, LandingCause, Peg, SimEvent, Simulation, Slot,
    TrailPoint,
};
pub use tick::step;
