//! Map command implementation.

use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::debug;

use qroute_ir::Circuit;
use qroute_map::{CancellationToken, MapMethod, MapOptions, Placement, RoutingResult, map};

use super::common::{load_circuit, load_device, load_options, save_json};

/// Arguments of the map command.
pub struct MapArgs<'a> {
    pub input: &'a str,
    pub device: &'a str,
    pub method: Option<&'a str>,
    pub config: Option<&'a str>,
    pub verify: bool,
    pub decompose_bridges: bool,
    pub timeout: Option<u64>,
    pub output: Option<&'a str>,
}

/// What the map command writes to its output file.
#[derive(Serialize)]
struct MappedOutput<'a> {
    method: MapMethod,
    device: &'a str,
    circuit: Circuit,
    init_placement: &'a Placement,
    final_placement: &'a Placement,
    swaps: &'a [(u32, u32)],
}

/// Execute the map command.
pub fn execute(args: &MapArgs<'_>) -> Result<()> {
    let mut options = match args.config {
        Some(path) => load_options(path)?,
        None => MapOptions::default(),
    };
    if let Some(method) = args.method {
        options.method = method.parse()?;
    }
    options.verify |= args.verify;
    options.decompose_bridges |= args.decompose_bridges;
    debug!(
        method = %options.method,
        verify = options.verify,
        decompose_bridges = options.decompose_bridges,
        "resolved mapping options"
    );

    let circuit = load_circuit(args.input)?;
    let device = load_device(args.device)?;

    println!(
        "{} Mapping {} onto {} with {}",
        style("→").cyan().bold(),
        style(args.input).green(),
        style(device.name()).yellow(),
        style(options.method).yellow()
    );
    println!(
        "  Loaded: {} qubits, {} ops, depth {}",
        circuit.num_qubits(),
        circuit.dag().num_ops(),
        circuit.depth()
    );
    println!(
        "  Device: {} qubits, {} edges",
        device.num_qubits(),
        device.num_edges()
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message("Routing...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = run_with_timeout(&circuit, &device, &options, args.timeout);
    spinner.finish_and_clear();
    let result = result?;

    println!("{} Mapping complete", style("✓").green().bold());
    println!(
        "  Result: {} SWAPs, depth {}, {} ops",
        style(result.num_swaps()).yellow(),
        result.circuit.depth(),
        result.circuit.num_ops()
    );
    if options.verify {
        println!("  Verified: {}", style("equivalent").green());
    }

    let output_path = match args.output {
        Some(path) => path.to_string(),
        None => {
            let stem = Path::new(args.input)
                .file_stem()
                .unwrap_or_default()
                .to_string_lossy();
            format!("{stem}_mapped.json")
        }
    };

    let output = MappedOutput {
        method: options.method,
        device: device.name(),
        circuit: Circuit::from_dag(format!("{}_mapped", circuit.name()), result.circuit.clone()),
        init_placement: &result.init_placement,
        final_placement: &result.final_placement,
        swaps: &result.swaps,
    };
    save_json(&output, &output_path)?;
    println!("  Output: {}", style(&output_path).green());

    Ok(())
}

/// Map on a worker thread, cancelling it once `timeout` seconds pass.
fn run_with_timeout(
    circuit: &Circuit,
    device: &qroute_map::Device,
    options: &MapOptions,
    timeout: Option<u64>,
) -> Result<RoutingResult> {
    let cancel = CancellationToken::new();
    let (tx, rx) = mpsc::channel();

    thread::scope(|scope| {
        let worker_cancel = cancel.clone();
        scope.spawn(move || {
            let _ = tx.send(map(circuit.dag(), device, options, &worker_cancel));
        });

        let received = match timeout {
            Some(secs) => match rx.recv_timeout(Duration::from_secs(secs)) {
                Ok(result) => result,
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    cancel.cancel();
                    rx.recv().context("Mapping worker stopped unexpectedly")?
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    anyhow::bail!("Mapping worker stopped unexpectedly")
                }
            },
            None => rx.recv().context("Mapping worker stopped unexpectedly")?,
        };

        received.with_context(|| match timeout {
            Some(secs) if cancel.is_cancelled() => format!("Mapping timed out after {secs}s"),
            _ => "Mapping failed".to_string(),
        })
    })
}
