//! Plinko headless runner
//!
//! Drops a batch of balls on one board with a fixed seed and reports where
//! they landed, the theoretical and measured return, and how each ball
//! finished. Useful for tuning `PhysicsConfig` without a renderer.
//!
//! Usage:
//!   cargo run --release -- --rows 16 --risk high --balls 5000
//!   RUST_LOG=debug cargo run -- --balls 10 --config tuning.json

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fs;

    use clap::Parser;
    use serde::Serialize;

    use plinko::consts::*;
    use plinko::{LandingCause, PhysicsConfig, RiskTier, SimEvent, Simulation};

    #[derive(Parser)]
    #[command(name = "plinko")]
    #[command(about = "Drop balls through a Plinko board and report the payout distribution")]
    struct Args {
        /// Peg rows (slots = rows + 1)
        #[arg(long, default_value_t = DEFAULT_ROWS)]
        rows: u32,
        /// Risk tier: low, medium or high
        #[arg(long, default_value = "high")]
        risk: RiskTier,
        /// Number of balls to drop
        #[arg(long, default_value_t = 1000)]
        balls: u32,
        /// RNG seed
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Board width (px)
        #[arg(long, default_value_t = DEFAULT_WIDTH)]
        width: f32,
        /// Board height (px)
        #[arg(long, default_value_t = DEFAULT_HEIGHT)]
        height: f32,
        /// Wager per ball
        #[arg(long, default_value_t = 1.0)]
        wager: f64,
        /// Horizontal spawn jitter around the centre (px)
        #[arg(long, default_value_t = 2.0)]
        jitter: f32,
        /// Milliseconds between drops
        #[arg(long, default_value_t = 100.0)]
        spawn_every_ms: f32,
        /// JSON file overriding physics tuning
        #[arg(long)]
        config: Option<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    }

    #[derive(Debug, Default, Serialize)]
    struct Report {
        rows: u32,
        risk: RiskTier,
        seed: u64,
        balls: u32,
        multipliers: Vec<f64>,
        slot_counts: Vec<u32>,
        physics_landings: u32,
        settled_landings: u32,
        timeout_landings: u32,
        discarded: u32,
        total_wagered: f64,
        total_paid: f64,
        theoretical_rtp: f64,
        measured_rtp: f64,
        simulated_secs: f64,
    }

    fn simulate(args: &Args, config: PhysicsConfig) -> plinko::Result<Report> {
        let mut sim = Simulation::new(args.seed, config)?;
        sim.configure_board(args.rows, args.width, args.height, args.risk)?;

        let mut report = Report {
            rows: args.rows,
            risk: args.risk,
            seed: args.seed,
            balls: args.balls,
            multipliers: sim.board.table.values().to_vec(),
            slot_counts: vec![0; sim.board.slot_count()],
            theoretical_rtp: sim.board.table.expected_value(),
            ..Default::default()
        };

        let center = sim.board.width / 2.0;
        let mut dropped = 0;
        let mut since_drop = args.spawn_every_ms;

        while dropped < args.balls || sim.active_count() > 0 {
            if dropped < args.balls && since_drop >= args.spawn_every_ms {
                sim.spawn_ball(center, args.jitter, 0.0, args.wager);
                report.total_wagered += args.wager;
                dropped += 1;
                since_drop = 0.0;
            }

            for event in sim.tick(FRAME_MS) {
                match event {
                    SimEvent::BallLanded {
                        slot, payout, cause, ..
                    } => {
                        report.slot_counts[slot] += 1;
                        report.total_paid += payout;
                        match cause {
                            LandingCause::Physics => report.physics_landings += 1,
                            LandingCause::Settled => report.settled_landings += 1,
                            LandingCause::Timeout => report.timeout_landings += 1,
                        }
                    }
                    SimEvent::BallDiscarded { .. } => report.discarded += 1,
                    SimEvent::PegHit { .. } => {}
                }
            }
            sim.take_finished();
            since_drop += FRAME_MS;
        }

        report.simulated_secs = sim.clock_ms / 1000.0;
        if report.total_wagered > 0.0 {
            report.measured_rtp = report.total_paid / report.total_wagered;
        }
        Ok(report)
    }

    fn print_report(report: &Report) {
        println!("=== PLINKO RUN ===");
        println!("  Board:      {} rows, {} risk", report.rows, report.risk);
        println!("  Seed:       {}", report.seed);
        println!("  Balls:      {}", report.balls);
        println!("  Simulated:  {:.1}s", report.simulated_secs);
        println!();
        println!("  slot  multiplier  count   share");
        let total = report.slot_counts.iter().sum::<u32>().max(1) as f64;
        for (i, (m, count)) in report
            .multipliers
            .iter()
            .zip(&report.slot_counts)
            .enumerate()
        {
            let share = *count as f64 / total;
            let bar = "#".repeat((share * 100.0).round() as usize);
            println!("  {i:>4}  {m:>10}  {count:>5}  {:>5.1}% {bar}", share * 100.0);
        }
        println!();
        println!(
            "  Landings:   {} physics, {} settled, {} timeout, {} discarded",
            report.physics_landings,
            report.settled_landings,
            report.timeout_landings,
            report.discarded
        );
        println!("  Wagered:    {:.2}", report.total_wagered);
        println!("  Paid:       {:.2}", report.total_paid);
        println!("  RTP:        {:.4} (binomial ideal {:.4})", report.measured_rtp, report.theoretical_rtp);
    }

    pub fn run() {
        env_logger::init();
        let args = Args::parse();

        let config = match &args.config {
            Some(path) => {
                let json = fs::read_to_string(path).unwrap_or_else(|e| {
                    log::error!("Failed to read {path}: {e}");
                    std::process::exit(2);
                });
                PhysicsConfig::from_json(&json).unwrap_or_else(|e| {
                    log::error!("Invalid config {path}: {e}");
                    std::process::exit(2);
                })
            }
            None => PhysicsConfig::default(),
        };

        log::info!(
            "Dropping {} balls on {} rows ({} risk), seed {}",
            args.balls,
            args.rows,
            args.risk,
            args.seed
        );

        match simulate(&args, config) {
            Ok(report) if args.json => match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    log::error!("Failed to serialize report: {e}");
                    std::process::exit(1);
                }
            },
            Ok(report) => print_report(&report),
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    native::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is embedded by the host; there is no wasm binary
}
