// Copyright (c) 2025 Lithomarket
// SPDX-License-Identifier: BUSL-1.1
//! Job cost estimation.
//!
//! The formula is a compatibility contract with existing clients and must
//! not drift:
//!
//! ```text
//! resolution_factor = (5 / resolution) * 0.5
//! iteration_factor  = (iterations / 1000) * 0.5
//! cost = base_price * (1 + resolution_factor + iteration_factor)
//! ```
//!
//! Finer resolution (a smaller number) raises the cost; more iterations
//! raise it too. Callers validate `resolution > 0` before reaching this
//! function.

/// Pure cost estimate. Deterministic: identical inputs always produce the
/// identical output, and nothing is mutated.
pub fn estimate(base_price: f64, resolution: f64, iterations: u32) -> f64 {
    debug_assert!(resolution > 0.0, "resolution is validated upstream");
    let resolution_factor = (5.0 / resolution) * 0.5;
    let iteration_factor = (iterations as f64 / 1000.0) * 0.5;
    base_price * (1.0 + resolution_factor + iteration_factor)
}

/// User-facing cost string, rounded to three decimals. Stored amounts keep
/// full precision.
pub fn format_cost(cost: f64, currency: &str) -> String {
    format!("{:.3} {}", cost, currency)
}
