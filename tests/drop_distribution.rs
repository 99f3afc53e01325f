//! Landing distribution tests
//!
//! A ball dropped on the centre line of a symmetric lattice should land
//! roughly like a sequence of fair left/right choices: most balls in the
//! middle third of the slots, very few at the edges.

use plinko::consts::FRAME_MS;
use plinko::{LandingCause, PhysicsConfig, RiskTier, SimEvent, Simulation};

const ROWS: u32 = 8;
const DROPS: usize = 600;
const SEED: u64 = 0x5EED;

/// Binomial coefficients for 8 rows (9 slots)
const BINOMIAL_COEFFICIENTS: [u64; 9] = [1, 8, 28, 56, 70, 56, 28, 8, 1];
const TOTAL_PATHS: u64 = 256;

/// Drop `DROPS` balls from the centre and collect (slot, cause)
fn drop_from_centre(seed: u64) -> Vec<(usize, LandingCause)> {
    drop_on_board(seed, ROWS, 400.0, 400.0, DROPS)
}

fn drop_on_board(
    seed: u64,
    rows: u32,
    width: f32,
    height: f32,
    drops: usize,
) -> Vec<(usize, LandingCause)> {
    let mut sim = Simulation::new(seed, PhysicsConfig::default()).unwrap();
    sim.configure_board(rows, width, height, RiskTier::Low).unwrap();
    let center = sim.board.width / 2.0;

    for _ in 0..drops {
        sim.spawn_ball(center, 0.0, 0.0, 1.0);
    }

    let mut landings = Vec::new();
    for _ in 0..5_000 {
        for event in sim.tick(FRAME_MS) {
            if let SimEvent::BallLanded { slot, cause, .. } = event {
                landings.push((slot, cause));
            }
        }
        if sim.active_count() == 0 {
            break;
        }
    }
    landings
}

#[test]
fn test_every_drop_lands() {
    let landings = drop_from_centre(SEED);
    assert_eq!(landings.len(), DROPS);
    assert!(landings.iter().all(|(slot, _)| *slot <= ROWS as usize));
}

#[test]
fn test_centre_drops_concentrate_in_middle() {
    let landings = drop_from_centre(SEED);
    let mut counts = [0usize; ROWS as usize + 1];
    for (slot, _) in &landings {
        counts[*slot] += 1;
    }
    println!("Slot counts: {:?}", counts);

    // Ideal binary lattice puts (56 + 70 + 56) / 256 ≈ 71% in slots 3..=5
    let ideal_middle = BINOMIAL_COEFFICIENTS[3..=5].iter().sum::<u64>() as f64 / TOTAL_PATHS as f64;
    let middle = counts[3..=5].iter().sum::<usize>() as f64 / DROPS as f64;
    let edges = (counts[0] + counts[ROWS as usize]) as f64 / DROPS as f64;
    println!("Middle third: {:.3} (ideal {:.3}), edges: {:.3}", middle, ideal_middle, edges);

    assert!(middle > 0.4, "middle third only got {middle:.3}");
    assert!(edges < 0.1, "edges got {edges:.3}");

    // Symmetric board: mean slot near the centre
    let mean = landings.iter().map(|(s, _)| *s as f64).sum::<f64>() / DROPS as f64;
    assert!((mean - ROWS as f64 / 2.0).abs() < 0.75, "mean slot {mean:.2}");
}

#[test]
fn test_physics_decides_almost_every_drop() {
    let landings = drop_from_centre(SEED);
    let physics = landings
        .iter()
        .filter(|(_, cause)| *cause == LandingCause::Physics)
        .count();
    assert!(
        physics as f64 / DROPS as f64 > 0.95,
        "only {physics} of {DROPS} landed through physics"
    );
}

#[test]
fn test_seeded_replay_is_identical() {
    let a = drop_from_centre(42);
    let b = drop_from_centre(42);
    assert_eq!(a, b);

    // A different seed takes different paths
    let c = drop_from_centre(43);
    assert_ne!(a, c);
}

#[test]
fn test_edge_share_independent_of_board_size() {
    // 16 rows: the two outermost slots on each side hold (1 + 16) * 2 / 65536
    // of the binomial mass
    const DROPS_PER_SIZE: usize = 400;
    let ideal_edges = 34.0 / 65536.0;

    for (width, height) in [(800.0, 600.0), (480.0, 360.0), (200.0, 150.0)] {
        let landings = drop_on_board(SEED, 16, width, height, DROPS_PER_SIZE);
        assert_eq!(landings.len(), DROPS_PER_SIZE);

        let edges = landings
            .iter()
            .filter(|(slot, _)| matches!(slot, 0 | 1 | 15 | 16))
            .count() as f64
            / DROPS_PER_SIZE as f64;
        let mean = landings.iter().map(|(s, _)| *s as f64).sum::<f64>() / DROPS_PER_SIZE as f64;
        println!("{width}x{height}: edges {edges:.4} (ideal {ideal_edges:.4}), mean {mean:.2}");

        assert!(edges < 0.01, "{width}x{height}: edge share {edges:.4}");
        assert!((mean - 8.0).abs() < 1.0, "{width}x{height}: mean slot {mean:.2}");
    }
}
