//! qroute command-line interface
//!
//! Maps circuits onto device coupling graphs and solves token swapping
//! problems from the shell.
//!
//! ```text
//! qroute map -i bell.json -d grid:3x3 --method sabre --verify
//! qroute swap -d ring:5 --from 0,1,2,3,4 --to 4,3,2,1,0 --method sat
//! qroute device random:8:12:42
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{device, map, swap, version};

/// qroute - qubit mapping and routing for constrained quantum devices
#[derive(Parser)]
#[command(name = "qroute")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map a circuit onto a device
    Map {
        /// Input circuit (JSON)
        #[arg(short, long)]
        input: String,

        /// Device preset (path:N, ring:N, star:N, complete:N, grid:WxH,
        /// random:N:EDGES[:SEED]) or a device JSON file
        #[arg(short, long)]
        device: String,

        /// Mapping method (sabre, jit, bridge, sat, astar)
        #[arg(short, long)]
        method: Option<String>,

        /// Mapping options file (YAML or JSON)
        #[arg(short, long)]
        config: Option<String>,

        /// Check the mapped circuit against the input
        #[arg(long)]
        verify: bool,

        /// Expand BRIDGE gates into CX sequences
        #[arg(long)]
        decompose_bridges: bool,

        /// Give up after this many seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Output file (defaults to <input>_mapped.json)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Find SWAPs that move qubits from one placement to another
    Swap {
        /// Device preset or device JSON file
        #[arg(short, long)]
        device: String,

        /// Starting placement, one physical qubit per virtual qubit (e.g. 0,1,2)
        #[arg(long)]
        from: String,

        /// Target placement in the same format
        #[arg(long)]
        to: String,

        /// Token swapping solver (astar, sat)
        #[arg(short, long, default_value = "astar")]
        method: String,

        /// Minimise SWAP layers instead of SWAP count (sat only)
        #[arg(long)]
        depth: bool,
    },

    /// Describe a device
    Device {
        /// Device preset or device JSON file
        spec: String,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Map {
            input,
            device,
            method,
            config,
            verify,
            decompose_bridges,
            timeout,
            output,
        } => map::execute(&map::MapArgs {
            input: &input,
            device: &device,
            method: method.as_deref(),
            config: config.as_deref(),
            verify,
            decompose_bridges,
            timeout,
            output: output.as_deref(),
        }),

        Commands::Swap {
            device,
            from,
            to,
            method,
            depth,
        } => swap::execute(&device, &from, &to, &method, depth),

        Commands::Device { spec } => device::execute(&spec),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
