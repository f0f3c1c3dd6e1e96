//! Integration tests for the survival path simulator and aggregator.
//!
//! # Test Coverage
//!
//! - Reference scenario regression (neutral levers, healthy baseline)
//! - Seeded determinism and prefix stability of per-path streams
//! - Absorbing failure and non-finite guards
//! - Aggregate invariants under arbitrary levers and stress (proptest)
//! - 1/sqrt(N) convergence of the survival estimate

use proptest::prelude::*;
use survival_core::{LeverId, LeverState, SimulationConfig};
use survival_engine::mc::{
    aggregate, run_monte_carlo, simulate, BaselineMetrics, ShockProfile, RUNWAY_CAP_MONTHS,
};

/// Healthy reference company: 4M cash, 4.8M ARR, 47k monthly burn.
fn reference_config(iterations: usize) -> SimulationConfig {
    SimulationConfig::builder()
        .iterations(iterations)
        .time_horizon_months(36)
        .starting_cash(4_000_000.0)
        .starting_arr(4_800_000.0)
        .monthly_burn(47_000.0)
        .build()
        .unwrap()
}

/// Weak demand and pricing: median path runs out of cash close to the horizon.
fn marginal_levers() -> LeverState {
    LeverState::neutral()
        .with(LeverId::DemandStrength, 20)
        .with(LeverId::PricingPower, 20)
}

fn std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

// ============================================================================
// Reference Scenario
// ============================================================================

#[test]
fn reference_scenario_survives() {
    let run = || {
        run_monte_carlo(
            &LeverState::neutral(),
            &reference_config(1_000),
            Some(42),
            &ShockProfile::none(),
        )
        .unwrap()
    };
    let result = run();
    let replay = run();
    assert_eq!(result.survival_rate, replay.survival_rate);
    assert_eq!(result.runway_percentiles, replay.runway_percentiles);

    assert_eq!(result.iteration_count, 1_000);
    assert!(!result.is_small_sample());
    assert!(
        result.survival_rate > 0.8,
        "survival should exceed 0.8: {}",
        result.survival_rate
    );
    assert!(result.arr_percentiles.is_monotonic());
    assert!(result.runway_percentiles.is_monotonic());
    assert!(result.burn_percentiles.is_monotonic());
    assert_eq!(result.survival_by_month.len(), 37);
    assert_eq!(result.survival_by_month[0], 1.0);
    assert_eq!(result.unstable_paths, 0);

    let metrics = BaselineMetrics::from_result(&result);
    assert!(metrics.median_arr > 4_800_000.0, "neutral levers grow ARR");
    assert!(metrics.churn_rate > 1.0 && metrics.churn_rate < 4.0);
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn seeded_runs_are_identical() {
    let config = reference_config(500);
    let levers = marginal_levers();

    let first = simulate(&levers, &config, Some(2024)).unwrap();
    let second = simulate(&levers, &config, Some(2024)).unwrap();
    assert_eq!(first, second);

    let json_first = serde_json::to_string(&aggregate(&first)).unwrap();
    let json_second = serde_json::to_string(&aggregate(&second)).unwrap();
    assert_eq!(json_first, json_second);
}

#[test]
fn different_seeds_differ() {
    let config = reference_config(200);
    let levers = marginal_levers();
    assert_ne!(
        simulate(&levers, &config, Some(1)).unwrap(),
        simulate(&levers, &config, Some(2)).unwrap()
    );
}

#[test]
fn prefix_of_larger_batch_matches_smaller_batch() {
    let levers = marginal_levers();
    let small = simulate(&levers, &reference_config(50), Some(9)).unwrap();
    // Large enough to take the parallel branch.
    let large = simulate(&levers, &reference_config(1_200), Some(9)).unwrap();
    assert_eq!(&large[..50], &small[..]);
}

// ============================================================================
// Edge Cases
// ============================================================================

#[test]
fn absorbing_failure_under_heavy_stress() {
    let levers = LeverState::neutral()
        .with(LeverId::MarketVolatility, 90)
        .with(LeverId::ExecutionRisk, 90);
    let result = run_monte_carlo(&levers, &reference_config(300), Some(5), &ShockProfile::new(3.0))
        .unwrap();

    let failed: Vec<_> = result.paths.iter().filter(|p| !p.survived).collect();
    assert!(!failed.is_empty());
    for path in failed {
        let month = path.failure_month.unwrap();
        let absorbed = path.snapshots[month - 1];
        assert!(path.snapshots[month - 1..].iter().all(|s| *s == absorbed));
        assert!(path.runway_months <= month as f64);
    }
}

#[test]
fn zero_burn_without_revenue_never_fails() {
    let config = SimulationConfig::builder()
        .iterations(20)
        .starting_cash(1_000.0)
        .starting_arr(0.0)
        .monthly_burn(0.0)
        .build()
        .unwrap();
    let result = run_monte_carlo(&LeverState::neutral(), &config, Some(3), &ShockProfile::none())
        .unwrap();

    assert_eq!(result.survival_rate, 1.0);
    assert_eq!(result.runway_percentiles.p50, RUNWAY_CAP_MONTHS);
    assert!(result.paths.iter().all(|p| p.snapshots.iter().all(|s| s.cash == 1_000.0)));
}

#[test]
fn one_month_horizon() {
    let config = SimulationConfig::builder()
        .iterations(10)
        .time_horizon_months(1)
        .starting_cash(100.0)
        .starting_arr(0.0)
        .monthly_burn(1_000.0)
        .build()
        .unwrap();
    let result = run_monte_carlo(&LeverState::neutral(), &config, Some(1), &ShockProfile::none())
        .unwrap();

    assert_eq!(result.survival_rate, 0.0);
    assert_eq!(result.survival_by_month, vec![1.0, 0.0]);
    assert!(result.runway_percentiles.p90 < 1.0);
}

// ============================================================================
// Convergence
// ============================================================================

#[test]
fn survival_estimate_converges_with_sample_size() {
    let levers = marginal_levers();
    let rates = |iterations: usize| -> Vec<f64> {
        (0..24u64)
            .map(|seed| {
                run_monte_carlo(
                    &levers,
                    &reference_config(iterations),
                    Some(1_000 + seed),
                    &ShockProfile::none(),
                )
                .unwrap()
                .survival_rate
            })
            .collect()
    };

    let small = std_dev(&rates(100));
    let large = std_dev(&rates(1_600));

    // Sixteen times the paths should shrink the spread about four-fold.
    assert!(small > 0.0);
    assert!(
        large < 0.6 * small,
        "spread did not shrink: N=100 {:.4}, N=1600 {:.4}",
        small,
        large
    );
}

// ============================================================================
// Property-Based Tests with Proptest
// ============================================================================

fn arb_levers() -> impl Strategy<Value = LeverState> {
    prop::array::uniform9(0i64..=100).prop_map(LeverState::from_values)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_aggregate_invariants(
        levers in arb_levers(),
        sigma in 0.0f64..3.0,
        horizon in 1usize..60,
        seed in any::<u64>(),
    ) {
        let config = SimulationConfig::builder()
            .iterations(40)
            .time_horizon_months(horizon)
            .starting_cash(2_000_000.0)
            .starting_arr(1_200_000.0)
            .monthly_burn(150_000.0)
            .build()
            .unwrap();
        let result = run_monte_carlo(&levers, &config, Some(seed), &ShockProfile::new(sigma)).unwrap();

        prop_assert!((0.0..=1.0).contains(&result.survival_rate));
        prop_assert!(result.arr_percentiles.is_monotonic());
        prop_assert!(result.runway_percentiles.is_monotonic());
        prop_assert!(result.burn_percentiles.is_monotonic());
        prop_assert_eq!(result.survival_by_month.len(), horizon + 1);
        prop_assert_eq!(result.survival_by_month[0], 1.0);
        for pair in result.survival_by_month.windows(2) {
            prop_assert!(pair[1] <= pair[0]);
        }
        prop_assert_eq!(*result.survival_by_month.last().unwrap(), result.survival_rate);

        for path in &result.paths {
            prop_assert_eq!(path.snapshots.len(), horizon);
            prop_assert!(path.runway_months.is_finite());
            prop_assert!(path.runway_months <= RUNWAY_CAP_MONTHS);
            prop_assert!(path.snapshots.iter().all(|s| s.arr >= 0.0 && s.cash.is_finite()));
        }
    }
}
