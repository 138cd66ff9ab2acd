//! Swap command implementation.

use anyhow::Result;
use console::style;

use qroute_map::{CancellationToken, SwapMethod, SwapObjective, TokenSwapProblem};

use super::common::{load_device, parse_placement};

/// Parse the solver name and objective flag.
pub fn parse_swap_method(method: &str, depth: bool) -> Result<SwapMethod> {
    match method.to_lowercase().as_str() {
        "astar" if depth => anyhow::bail!("--depth is only supported by the sat solver"),
        "astar" => Ok(SwapMethod::AStar),
        "sat" if depth => Ok(SwapMethod::Sat(SwapObjective::Depth)),
        "sat" => Ok(SwapMethod::Sat(SwapObjective::SwapCount)),
        other => anyhow::bail!("Unknown swap method: '{other}'. Available: astar, sat"),
    }
}

/// Execute the swap command.
pub fn execute(device: &str, from: &str, to: &str, method: &str, depth: bool) -> Result<()> {
    let method = parse_swap_method(method, depth)?;
    let device = load_device(device)?;
    let from = parse_placement(from, &device)?;
    let to = parse_placement(to, &device)?;

    let problem = TokenSwapProblem::from_placements(&device, &from, &to)?;
    let solver = method.solver();

    println!(
        "{} Solving token swapping on {} with {}",
        style("→").cyan().bold(),
        style(device.name()).yellow(),
        style(solver.name()).yellow()
    );

    let swaps = solver.solve(&device, &problem, &CancellationToken::new())?;

    println!(
        "{} {} SWAPs",
        style("✓").green().bold(),
        style(swaps.len()).yellow()
    );
    for (a, b) in &swaps {
        println!("  swap {a} {b}");
    }

    Ok(())
}
