//! End-to-end tests for the optimization engine.
//!
//! Pattern: define market scenarios as data, then run every optimization
//! task and the frontier sweep against each, checking the invariants that
//! must hold for any valid input before pinning down analytically known
//! allocations.

use markowitz::prelude::*;
use nalgebra::{dmatrix, dvector, DMatrix, DVector};

/// Tolerance for comparing floating point results.
const TOL: f64 = 1e-4;

/// Slack allowed on the weight-vector invariants after a successful solve.
const WEIGHT_TOL: f64 = 1e-6;

/// A market scenario definition.
struct Scenario {
    name: &'static str,
    /// Function that builds (mean returns, covariance, risk-free rate).
    build: fn() -> (DVector<f64>, DMatrix<f64>, f64),
}

fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "two_independent_assets",
            build: || {
                // Asset 1 riskier but higher-return; no correlation.
                let mu = dvector![0.10, 0.04];
                let sigma = dmatrix![0.04, 0.0; 0.0, 0.01];
                (mu, sigma, 0.02)
            },
        },
        Scenario {
            name: "four_assets_mixed_correlation",
            build: || {
                let mu = dvector![0.12, 0.10, 0.07, 0.05];
                #[rustfmt::skip]
                let sigma = dmatrix![
                     0.04, 0.01, 0.00, -0.01;
                     0.01, 0.03, 0.00,  0.00;
                     0.00, 0.00, 0.02,  0.00;
                    -0.01, 0.00, 0.00,  0.01
                ];
                (mu, sigma, 0.02)
            },
        },
        Scenario {
            name: "three_identical_assets",
            build: || {
                let mu = dvector![0.08, 0.08, 0.08];
                let sigma = DMatrix::from_diagonal(&dvector![0.04, 0.04, 0.04]);
                (mu, sigma, 0.02)
            },
        },
        Scenario {
            name: "single_asset",
            build: || (dvector![0.08], dmatrix![0.04], 0.02),
        },
    ]
}

/// Every task on every scenario must return fully invested, long-only
/// weights.
fn assert_valid_weights(name: &str, task: &str, weights: &DVector<f64>) {
    let total: f64 = weights.sum();
    assert!(
        (total - 1.0).abs() < WEIGHT_TOL,
        "{name}/{task}: weights sum to {total}"
    );
    for (i, &w) in weights.iter().enumerate() {
        assert!(
            (-WEIGHT_TOL..=1.0 + WEIGHT_TOL).contains(&w),
            "{name}/{task}: weight {i} out of bounds: {w}"
        );
    }
}

// ============================================================================
// Invariants across all scenarios
// ============================================================================

#[test]
fn test_task_weight_invariants() {
    for scenario in scenarios() {
        let (mu, sigma, rf) = (scenario.build)();

        let solutions = [
            ("max_sharpe", max_sharpe(&mu, &sigma, rf)),
            ("min_volatility", min_volatility(&mu, &sigma)),
            ("naive_max_sharpe", naive_max_sharpe(&mu, &sigma, rf)),
        ];

        for (task, result) in solutions {
            let solution = result.unwrap_or_else(|e| {
                panic!("{}/{task} should solve: {e}", scenario.name)
            });
            assert!(solution.is_optimal());
            assert_valid_weights(scenario.name, task, &solution.weights);
        }
    }
}

#[test]
fn test_min_volatility_dominates_reference_portfolios() {
    for scenario in scenarios() {
        let (mu, sigma, _) = (scenario.build)();
        let n = mu.len();

        let best = min_volatility(&mu, &sigma).unwrap();
        let best_vol = portfolio_stats(&best.weights, &mu, &sigma).unwrap().volatility;

        let equal = DVector::from_element(n, 1.0 / n as f64);
        let equal_vol = portfolio_stats(&equal, &mu, &sigma).unwrap().volatility;
        assert!(
            best_vol <= equal_vol + TOL,
            "{}: min-vol {best_vol} above equal-weight {equal_vol}",
            scenario.name
        );

        for i in 0..n {
            let mut single = DVector::zeros(n);
            single[i] = 1.0;
            let single_vol = portfolio_stats(&single, &mu, &sigma).unwrap().volatility;
            assert!(
                best_vol <= single_vol + TOL,
                "{}: min-vol {best_vol} above single-asset {i} ({single_vol})",
                scenario.name
            );
        }
    }
}

#[test]
fn test_max_sharpe_dominates_reference_portfolios() {
    for scenario in scenarios() {
        let (mu, sigma, rf) = (scenario.build)();
        let n = mu.len();

        let best = max_sharpe(&mu, &sigma, rf).unwrap();
        let best_sharpe = portfolio_stats(&best.weights, &mu, &sigma)
            .unwrap()
            .sharpe(rf)
            .expect("positive-variance scenario");

        let equal = DVector::from_element(n, 1.0 / n as f64);
        let equal_sharpe = portfolio_stats(&equal, &mu, &sigma)
            .unwrap()
            .sharpe(rf)
            .unwrap();
        assert!(
            best_sharpe >= equal_sharpe - TOL,
            "{}: max-sharpe {best_sharpe} below equal-weight {equal_sharpe}",
            scenario.name
        );

        let min_vol = min_volatility(&mu, &sigma).unwrap();
        let min_vol_sharpe = portfolio_stats(&min_vol.weights, &mu, &sigma)
            .unwrap()
            .sharpe(rf)
            .unwrap();
        assert!(
            best_sharpe >= min_vol_sharpe - TOL,
            "{}: max-sharpe {best_sharpe} below min-vol {min_vol_sharpe}",
            scenario.name
        );
    }
}

#[test]
fn test_frontier_invariants() {
    for scenario in scenarios() {
        let (mu, sigma, _) = (scenario.build)();
        let num_points = 40;

        let frontier = efficient_frontier(&mu, &sigma, num_points).unwrap();
        assert_eq!(frontier.points.len(), num_points, "{}", scenario.name);
        assert!(
            frontier.points.iter().all(FrontierPoint::is_feasible),
            "{}: every target in the attainable range should solve",
            scenario.name
        );
        assert!(frontier.is_monotonic(), "{}", scenario.name);

        // Targets ascend and start at the min-vol return.
        let min_vol = min_volatility(&mu, &sigma).unwrap();
        let min_vol_stats = portfolio_stats(&min_vol.weights, &mu, &sigma).unwrap();
        assert!(
            (frontier.points[0].target_return - min_vol_stats.expected_return).abs() < TOL,
            "{}",
            scenario.name
        );
        assert_eq!(
            frontier.points[num_points - 1].target_return,
            mu.max(),
            "{}",
            scenario.name
        );

        // No frontier point beats the global volatility minimum.
        for point in &frontier.points {
            let vol = point.volatility.unwrap();
            assert!(
                vol >= min_vol_stats.volatility - TOL,
                "{}: frontier vol {vol} below global minimum {}",
                scenario.name,
                min_vol_stats.volatility
            );
        }
    }
}

// ============================================================================
// Analytically known allocations
// ============================================================================

#[test]
fn test_two_asset_allocations() {
    // Independent assets, variances 0.04 and 0.01: the minimum-variance
    // split is sigma2^2/(sigma1^2 + sigma2^2) = 0.2 on asset 1. The
    // tangency portfolio at rf = 0.02 is proportional to
    // inv(Sigma)(mu - rf) = (2, 2), i.e. an even split.
    let mu = dvector![0.10, 0.04];
    let sigma = dmatrix![0.04, 0.0; 0.0, 0.01];
    let rf = 0.02;

    let min_vol = min_volatility(&mu, &sigma).unwrap();
    assert!((min_vol.weights[0] - 0.2).abs() < 0.01);
    assert!((min_vol.weights[1] - 0.8).abs() < 0.01);

    let best = max_sharpe(&mu, &sigma, rf).unwrap();
    assert!((best.weights[0] - 0.5).abs() < 0.01);

    // Sharpe maximization shifts weight toward the higher-return asset.
    assert!(best.weights[0] > min_vol.weights[0]);
}

#[test]
fn test_naive_sharpe_goes_all_in_on_the_best_ratio() {
    // Excess-return / volatility ratios are 0.4 vs 0.2; the linear risk
    // proxy makes the objective ratio-monotone, so the naive optimizer
    // concentrates in asset 1.
    let mu = dvector![0.10, 0.04];
    let sigma = dmatrix![0.04, 0.0; 0.0, 0.01];

    let naive = naive_max_sharpe(&mu, &sigma, 0.02).unwrap();
    assert!(
        naive.weights[0] > 0.95,
        "expected concentration, got {}",
        naive.weights[0]
    );
}

#[test]
fn test_three_identical_assets_split_evenly() {
    let mu = dvector![0.08, 0.08, 0.08];
    let sigma = DMatrix::from_diagonal(&dvector![0.04, 0.04, 0.04]);

    for solution in [
        min_volatility(&mu, &sigma).unwrap(),
        max_sharpe(&mu, &sigma, 0.02).unwrap(),
    ] {
        for &w in solution.weights.iter() {
            assert!((w - 1.0 / 3.0).abs() < 1e-3, "got weight {w}");
        }
    }
}

#[test]
fn test_single_asset_universe() {
    let mu = dvector![0.08];
    let sigma = dmatrix![0.04];

    for solution in [
        max_sharpe(&mu, &sigma, 0.02).unwrap(),
        min_volatility(&mu, &sigma).unwrap(),
        naive_max_sharpe(&mu, &sigma, 0.02).unwrap(),
    ] {
        assert!((solution.weights[0] - 1.0).abs() < WEIGHT_TOL);
    }

    let stats = portfolio_stats(&dvector![1.0], &mu, &sigma).unwrap();
    assert!((stats.expected_return - 0.08).abs() < TOL);
    assert!((stats.volatility - 0.2).abs() < TOL);
}

#[test]
fn test_single_point_frontier_is_the_min_vol_portfolio() {
    let mu = dvector![0.10, 0.04];
    let sigma = dmatrix![0.04, 0.0; 0.0, 0.01];

    let min_vol = min_volatility(&mu, &sigma).unwrap();
    let min_vol_stats = portfolio_stats(&min_vol.weights, &mu, &sigma).unwrap();

    let frontier = efficient_frontier(&mu, &sigma, 1).unwrap();
    assert_eq!(frontier.points.len(), 1);

    let point = &frontier.points[0];
    assert!((point.target_return - min_vol_stats.expected_return).abs() < TOL);
    assert!((point.volatility.unwrap() - min_vol_stats.volatility).abs() < TOL);
}

#[test]
fn test_frontier_endpoint_is_the_best_single_asset() {
    // The top of the frontier is 100% in the highest-return asset, so its
    // volatility is that asset's own standard deviation.
    let mu = dvector![0.10, 0.04];
    let sigma = dmatrix![0.04, 0.0; 0.0, 0.01];

    let frontier = efficient_frontier(&mu, &sigma, 25).unwrap();
    let last = frontier.points.last().unwrap();
    assert_eq!(last.target_return, 0.10);
    assert!((last.volatility.unwrap() - 0.2).abs() < TOL);
}

// ============================================================================
// Failure semantics
// ============================================================================

#[test]
fn test_shape_mismatch_is_fatal() {
    let mu = dvector![0.1, 0.2];
    let sigma = DMatrix::<f64>::identity(3, 3);

    let err = max_sharpe(&mu, &sigma, 0.02).unwrap_err();
    assert!(matches!(err, MarkowitzError::ShapeMismatch { .. }));
}

#[test]
fn test_exhausted_iteration_budget_carries_context() {
    let mu = dvector![0.10, 0.04];
    let sigma = dmatrix![0.04, 0.0; 0.0, 0.01];
    let starved = Settings {
        max_iter: 0,
        ..Settings::default()
    };

    match min_volatility_with(&mu, &sigma, &starved) {
        Err(MarkowitzError::OptimizationFailure {
            iterations,
            last_objective,
        }) => {
            assert_eq!(iterations, 0);
            assert!(last_objective.is_finite());
        }
        other => panic!("expected OptimizationFailure, got {other:?}"),
    }
}
