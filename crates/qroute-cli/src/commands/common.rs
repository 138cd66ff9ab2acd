//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use qroute_ir::Circuit;
use qroute_map::{Device, MapOptions, Placement};

/// Load a circuit from a JSON file.
pub fn load_circuit(path: &str) -> Result<Circuit> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        anyhow::bail!("File not found: {path}");
    }

    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;

    let ext = path_obj.extension().and_then(|e| e.to_str()).unwrap_or("");

    match ext.to_lowercase().as_str() {
        "json" | "" => serde_json::from_str(&source)
            .with_context(|| format!("Failed to parse circuit JSON: {path}")),
        other => anyhow::bail!("Unsupported circuit format '.{other}' (expected .json)"),
    }
}

/// Build a device from a preset spec or load it from a JSON file.
///
/// Presets: `path:N`, `ring:N`, `star:N`, `complete:N`, `grid:WxH` and
/// `random:N:EDGES[:SEED]`.
pub fn load_device(spec: &str) -> Result<Device> {
    if Path::new(spec).is_file() {
        let source =
            fs::read_to_string(spec).with_context(|| format!("Failed to read file: {spec}"))?;
        let device: Device = serde_json::from_str(&source)
            .with_context(|| format!("Failed to parse device JSON: {spec}"))?;
        return Ok(device);
    }
    parse_device_spec(spec)
}

/// Parse a device preset spec.
pub fn parse_device_spec(spec: &str) -> Result<Device> {
    let mut parts = spec.split(':');
    let kind = parts.next().unwrap_or_default().to_lowercase();
    let args: Vec<&str> = parts.collect();

    let number = |i: usize, what: &str| -> Result<u32> {
        let raw = args
            .get(i)
            .ok_or_else(|| anyhow::anyhow!("Device spec '{spec}' is missing {what}"))?;
        raw.parse()
            .with_context(|| format!("Invalid {what} '{raw}' in device spec '{spec}'"))
    };

    let device = match kind.as_str() {
        "path" | "line" => Device::path(number(0, "qubit count")?),
        "ring" => Device::ring(number(0, "qubit count")?),
        "star" => Device::star(number(0, "qubit count")?),
        "complete" | "full" => Device::complete(number(0, "qubit count")?),
        "grid" => {
            let dims = args
                .first()
                .ok_or_else(|| anyhow::anyhow!("Device spec '{spec}' is missing WxH"))?;
            let (w, h) = dims
                .split_once(['x', 'X'])
                .ok_or_else(|| anyhow::anyhow!("Grid size must look like 3x4, got '{dims}'"))?;
            Device::grid(
                w.parse().with_context(|| format!("Invalid grid width '{w}'"))?,
                h.parse().with_context(|| format!("Invalid grid height '{h}'"))?,
            )
        }
        "random" => {
            let n = number(0, "qubit count")?;
            let edges = number(1, "edge count")? as usize;
            let seed = match args.get(2) {
                Some(raw) => raw
                    .parse()
                    .with_context(|| format!("Invalid seed '{raw}' in device spec '{spec}'"))?,
                None => 0,
            };
            Device::random(n, edges, seed)
        }
        other => {
            anyhow::bail!(
                "Unknown device: '{other}'. Available: path:N, ring:N, star:N, complete:N, grid:WxH, random:N:EDGES[:SEED], or a JSON file"
            );
        }
    };
    Ok(device)
}

/// Load mapping options from a YAML or JSON file.
pub fn load_options(path: &str) -> Result<MapOptions> {
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read config: {path}"))?;
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    match ext.to_lowercase().as_str() {
        "json" => serde_json::from_str(&source)
            .with_context(|| format!("Failed to parse JSON config: {path}")),
        _ => serde_yaml_ng::from_str(&source)
            .with_context(|| format!("Failed to parse YAML config: {path}")),
    }
}

/// Parse a comma-separated list of physical qubits, one per virtual qubit.
pub fn parse_qubit_list(list: &str) -> Result<Vec<u32>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .with_context(|| format!("Invalid qubit '{s}' in list '{list}'"))
        })
        .collect()
}

/// A placement from a comma-separated physical qubit list.
pub fn parse_placement(list: &str, device: &Device) -> Result<Placement> {
    let v_to_phy = parse_qubit_list(list)?;
    Placement::from_v_to_phy(&v_to_phy, device.num_qubits())
        .with_context(|| format!("Invalid placement '{list}'"))
}

/// Write `value` as pretty JSON.
pub fn save_json(value: &impl Serialize, path: &str) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).with_context(|| format!("Failed to write file: {path}"))?;
    Ok(())
}
