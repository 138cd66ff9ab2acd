//! Device command implementation.

use anyhow::Result;
use console::style;

use super::common::load_device;

/// Execute the device command.
pub fn execute(spec: &str) -> Result<()> {
    let device = load_device(spec)?;

    println!("{}", style(device.name()).cyan().bold());
    println!("  Qubits:    {}", device.num_qubits());
    println!("  Edges:     {}", device.num_edges());
    match device.diameter() {
        Some(d) => println!("  Diameter:  {d}"),
        None => println!("  Diameter:  {}", style("disconnected").red()),
    }
    println!();
    println!("{}", style("Coupling map:").bold());
    for q in 0..device.num_qubits() {
        let neighbors: Vec<String> = device.neighbors(q).iter().map(u32::to_string).collect();
        println!("  {q:>3} -> {}", neighbors.join(", "));
    }

    Ok(())
}
