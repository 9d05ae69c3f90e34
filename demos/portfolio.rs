//! Portfolio Optimization Demo
//!
//! Runs the full engine on a small fixed universe:
//!
//! - Max-Sharpe weights (tangency portfolio)
//! - Min-Volatility weights
//! - Naive-Max-Sharpe baseline (correlation-ignorant risk proxy)
//! - Efficient frontier sweep

use markowitz::prelude::*;
use nalgebra::{dmatrix, dvector};

fn main() -> Result<()> {
    println!("=== Portfolio Optimization ===\n");

    // 4 assets with different risk/return profiles
    let mu = dvector![0.12, 0.10, 0.07, 0.05];

    #[rustfmt::skip]
    let sigma = dmatrix![
         0.04, 0.01, 0.00, -0.01;
         0.01, 0.03, 0.00,  0.00;
         0.00, 0.00, 0.02,  0.00;
        -0.01, 0.00, 0.00,  0.01
    ];

    let risk_free_rate = 0.02;
    let assets = ["A", "B", "C", "D"];

    println!("Assets: A, B, C, D");
    println!("Expected returns: [12%, 10%, 7%, 5%]");
    println!("Risk-free rate: 2%\n");

    let tasks = [
        ("Max Sharpe", max_sharpe(&mu, &sigma, risk_free_rate)?),
        ("Min Volatility", min_volatility(&mu, &sigma)?),
        ("Naive Max Sharpe", naive_max_sharpe(&mu, &sigma, risk_free_rate)?),
    ];

    for (label, solution) in &tasks {
        let stats = portfolio_stats(&solution.weights, &mu, &sigma)?;

        println!("{label} Portfolio:");
        for (asset, weight) in assets.iter().zip(solution.weights.iter()) {
            println!("  Asset {}: {:>6.2}%", asset, weight * 100.0);
        }
        println!("  Expected return: {:.2}%", stats.expected_return * 100.0);
        println!("  Risk (std dev):  {:.2}%", stats.volatility * 100.0);
        match stats.sharpe(risk_free_rate) {
            Some(sharpe) => println!("  Sharpe ratio:    {sharpe:.4}\n"),
            None => println!("  Sharpe ratio:    undefined (zero volatility)\n"),
        }
    }

    // Efficient frontier
    println!("--- Efficient Frontier ---\n");

    let frontier = efficient_frontier(&mu, &sigma, 9)?;
    for point in &frontier.points {
        match point.volatility {
            Some(vol) => println!(
                "  Return: {:>5.2}%  ->  Risk: {:>5.2}%",
                point.target_return * 100.0,
                vol * 100.0
            ),
            None => println!(
                "  Return: {:>5.2}%  ->  infeasible",
                point.target_return * 100.0
            ),
        }
    }

    println!("\nHigher returns require accepting higher risk!");
    Ok(())
}
