//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - qubit mapping and routing",
        style("qroute").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qroute-ir    Circuit DAG and gate set");
    println!("  qroute-sat   SAT encodings on top of varisat");
    println!("  qroute-map   Placement, routing, token swapping and verification");
    println!("  qroute-cli   Command-line interface");
    println!();
    println!("Methods:    {}", methods());
    println!("License:    {}", style("Apache-2.0").dim());
}

fn methods() -> String {
    qroute_map::MapMethod::ALL
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
