//! Simulation state and core types
//!
//! Everything the host needs to render a frame lives here: the current
//! board, the balls in flight and the events produced since the last tick.

use glam::Vec2;
use log::{info, warn};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::layout::Board;
use super::multipliers::RiskTier;
use crate::config::PhysicsConfig;
use crate::consts::*;
use crate::error::Result;

/// Handle returned by [`Simulation::spawn_ball`]
pub type BallId = u32;

/// A static peg
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Peg {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    /// Hit glow (0-1, decays over time). Visual only.
    #[serde(default)]
    pub glow: f32,
}

impl Peg {
    pub fn new(id: u32, pos: Vec2, radius: f32) -> Self {
        Self {
            id,
            pos,
            radius,
            glow: 0.0,
        }
    }

    /// Light the peg up after a ball touches it
    pub fn trigger_hit(&mut self) {
        self.glow = 1.0;
    }

    /// Decay the glow
    pub fn decay(&mut self, dt: f32, rate: f32) {
        if self.glow > 0.0 {
            self.glow = (self.glow - dt * rate).max(0.0);
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        self.glow > 0.0
    }
}

/// A payout bin along the bottom of the board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub index: usize,
    /// Left edge
    pub x: f32,
    pub width: f32,
    /// Balls at or below this y are in the slot
    pub top: f32,
    pub multiplier: f64,
}

impl Slot {
    /// Whether `x` lies in `[x, x + width)`
    #[inline]
    pub fn contains_x(&self, x: f32) -> bool {
        x >= self.x && x < self.x + self.width
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

/// Why a ball ended up in a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LandingCause {
    /// Fell into the slot
    Physics,
    /// Came to rest just above the slots; credited to the slot beneath it
    Settled,
    /// Did not land in time; a random slot was picked
    Timeout,
}

/// Why a ball was thrown away without a payout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscardReason {
    /// Left the board below the slots
    OutOfBounds,
    /// Position became NaN/infinite
    InvalidState,
}

/// Ball lifecycle. `Landed` and `Discarded` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BallState {
    Falling,
    Landed { slot: usize, cause: LandingCause },
    Discarded { reason: DiscardReason },
}

/// Trail point for ball rendering
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub speed: f32,
}

/// A ball entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: BallId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Spin angle for rendering (radians)
    pub rotation: f32,
    pub state: BallState,
    /// Amount staked on this drop
    pub wager: f64,
    /// Simulation clock when dropped (ms)
    pub spawned_at_ms: f64,
    /// Board version the ball was dropped on
    pub board_version: u64,
    /// Consecutive slow steps near the floor
    #[serde(default)]
    pub rest_ticks: u32,
    /// Trail history for rendering (newest first)
    #[serde(skip)]
    pub trail: Vec<TrailPoint>,
}

impl Ball {
    pub fn new(id: BallId, pos: Vec2, radius: f32) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            radius,
            rotation: 0.0,
            state: BallState::Falling,
            wager: 0.0,
            spawned_at_ms: 0.0,
            board_version: 0,
            rest_ticks: 0,
            trail: Vec::new(),
        }
    }

    #[inline]
    pub fn is_falling(&self) -> bool {
        matches!(self.state, BallState::Falling)
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        !self.is_falling()
    }

    /// Slot index if landed
    pub fn landed_slot(&self) -> Option<usize> {
        match self.state {
            BallState::Landed { slot, .. } => Some(slot),
            _ => None,
        }
    }

    /// Record current position to trail, keeping at most `max_len` points
    pub fn record_trail(&mut self, max_len: usize) {
        if max_len == 0 {
            return;
        }
        let speed = self.vel.length();
        self.trail.insert(0, TrailPoint { pos: self.pos, speed });
        self.trail.truncate(max_len);
    }

    /// Settle into a slot: stop, centre horizontally, remember the index
    pub fn land(&mut self, slot: &Slot, cause: LandingCause) {
        self.vel = Vec2::ZERO;
        self.pos.x = slot.center_x();
        self.state = BallState::Landed {
            slot: slot.index,
            cause,
        };
    }

    pub fn discard(&mut self, reason: DiscardReason) {
        self.vel = Vec2::ZERO;
        self.state = BallState::Discarded { reason };
    }
}

/// Events for the host to render or react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// A ball touched a peg (for glow/sound)
    PegHit { peg_id: u32, ball_id: BallId },
    /// A ball reached a slot; emitted once per ball
    BallLanded {
        ball_id: BallId,
        slot: usize,
        multiplier: f64,
        wager: f64,
        payout: f64,
        cause: LandingCause,
        board_version: u64,
    },
    /// A ball was dropped without payout; emitted once per ball
    BallDiscarded {
        ball_id: BallId,
        reason: DiscardReason,
    },
}

/// RNG seed wrapper so a run can be replayed
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

/// Complete simulation: board, balls, clock and seeded RNG
#[derive(Debug, Clone)]
pub struct Simulation {
    pub config: PhysicsConfig,
    /// Current board (pegs, slots, table and index, always in lockstep)
    pub board: Board,
    /// Balls sorted by id
    pub balls: Vec<Ball>,
    /// Run seed for reproducibility
    pub rng_state: RngState,
    /// Logical clock (ms), advanced by whole fixed steps
    pub clock_ms: f64,
    /// Fixed steps run so far
    pub time_ticks: u64,
    pub(crate) rng: Pcg32,
    /// Leftover frame time not yet stepped (ms)
    pub(crate) accumulator: f32,
    pub(crate) events: Vec<SimEvent>,
    next_id: BallId,
}

impl Simulation {
    /// Create a simulation on the reference board (16 rows, high risk)
    pub fn new(seed: u64, config: PhysicsConfig) -> Result<Self> {
        config.validate()?;
        let board = Board::build(
            1,
            DEFAULT_ROWS,
            DEFAULT_WIDTH,
            DEFAULT_HEIGHT,
            RiskTier::High,
            &config,
        )?;
        let rng_state = RngState::new(seed);
        Ok(Self {
            config,
            board,
            balls: Vec::new(),
            rng: rng_state.to_rng(),
            rng_state,
            clock_ms: 0.0,
            time_ticks: 0,
            accumulator: 0.0,
            events: Vec::new(),
            next_id: 1,
        })
    }

    /// Replace the board. Pegs, slots, table and index are rebuilt together
    /// and swapped in at once; on error the previous board stays.
    ///
    /// Balls still falling are rescaled onto the new dimensions, their
    /// speed into the new lattice units.
    pub fn configure_board(
        &mut self,
        row_count: u32,
        width: f32,
        height: f32,
        risk: RiskTier,
    ) -> Result<u64> {
        let version = self.board.version + 1;
        let board = match Board::build(version, row_count, width, height, risk, &self.config) {
            Ok(board) => board,
            Err(e) => {
                warn!("Rejected board {row_count} rows {width}x{height}: {e}");
                return Err(e);
            }
        };

        let scale = Vec2::new(width / self.board.width, height / self.board.height);
        let motion_ratio = board.motion_scale() / self.board.motion_scale();
        for ball in self.balls.iter_mut().filter(|b| b.is_falling()) {
            ball.pos *= scale;
            ball.vel *= motion_ratio;
            ball.radius = board.ball_radius;
            ball.rest_ticks = 0;
            ball.trail.clear();
        }

        info!(
            "Board v{}: {} rows, {}x{}, {} risk, {} pegs",
            version,
            row_count,
            width,
            height,
            risk,
            board.pegs.len()
        );
        self.board = board;
        Ok(version)
    }

    /// Switch risk tier, keeping rows and dimensions
    pub fn set_risk(&mut self, risk: RiskTier) -> Result<u64> {
        let (rows, width, height) = (self.board.row_count, self.board.width, self.board.height);
        self.configure_board(rows, width, height, risk)
    }

    /// Allocate a new ball ID
    fn next_ball_id(&mut self) -> BallId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Drop a ball above the lattice.
    ///
    /// `x` is clamped inside the walls, `x_jitter` adds a uniform offset in
    /// `±x_jitter`, `vy_bias` is the initial downward speed (px/s).
    pub fn spawn_ball(&mut self, x: f32, x_jitter: f32, vy_bias: f32, wager: f64) -> BallId {
        let id = self.next_ball_id();
        let radius = self.board.ball_radius;

        let mut x = x;
        if x_jitter > 0.0 {
            x += self.rng.random_range(-x_jitter..=x_jitter);
        }
        let x = x.clamp(radius, self.board.width - radius);

        let mut ball = Ball::new(id, Vec2::new(x, self.board.drop_y()), radius);
        ball.vel = Vec2::new(0.0, vy_bias);
        ball.wager = wager;
        ball.spawned_at_ms = self.clock_ms;
        ball.board_version = self.board.version;
        self.balls.push(ball);
        id
    }

    pub fn ball(&self, id: BallId) -> Option<&Ball> {
        self.balls.iter().find(|b| b.id == id)
    }

    /// Balls still in play
    pub fn active_count(&self) -> usize {
        self.balls.iter().filter(|b| b.is_falling()).count()
    }

    /// Remove and return every landed or discarded ball
    pub fn take_finished(&mut self) -> Vec<Ball> {
        let (finished, active): (Vec<Ball>, Vec<Ball>) = std::mem::take(&mut self.balls)
            .into_iter()
            .partition(|b| b.is_terminal());
        self.balls = active;
        finished
    }

    /// Drain events produced since the last call
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }
}
