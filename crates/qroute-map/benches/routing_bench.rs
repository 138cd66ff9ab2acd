//! Benchmarks for routing and token swapping
//!
//! Run with: cargo bench -p qroute-map

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qroute_ir::{Circuit, QubitId};
use qroute_map::{
    AStarTokenSwap, CancellationToken, Device, Placement, RouterConfig, SatTokenSwap,
    SwapObjective, TokenSwapProblem, TokenSwapper, jit_map, sabre_map,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Random CX circuit with a fixed seed.
fn random_cx_circuit(num_qubits: u32, num_gates: usize, seed: u64) -> Circuit {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut circuit = Circuit::with_size("bench", num_qubits, 0);
    for _ in 0..num_gates {
        let a = rng.gen_range(0..num_qubits);
        let b = (a + rng.gen_range(1..num_qubits)) % num_qubits;
        circuit.cx(QubitId(a), QubitId(b)).unwrap();
    }
    circuit
}

/// Benchmark SABRE routing on square grids
fn bench_sabre_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("sabre_routing");
    let config = RouterConfig::default();
    let cancel = CancellationToken::new();

    for side in &[3u32, 4, 5] {
        let device = Device::grid(*side, *side);
        let circuit = random_cx_circuit(side * side, 100, 7);

        group.bench_with_input(BenchmarkId::new("sabre_map", side), &circuit, |b, circ| {
            b.iter(|| sabre_map(black_box(circ.dag()), &device, &config, &cancel).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("jit_map", side), &circuit, |b, circ| {
            b.iter(|| jit_map(black_box(circ.dag()), &device, &config, &cancel).unwrap());
        });
    }

    group.finish();
}

/// Benchmark token swapping on rings
fn bench_token_swap(c: &mut Criterion) {
    let mut group = c.benchmark_group("token_swap");
    let cancel = CancellationToken::new();

    for n in &[5u32, 6, 7] {
        let device = Device::ring(*n);
        let mut target: Vec<u32> = (0..*n).collect();
        target.shuffle(&mut StdRng::seed_from_u64(u64::from(*n)));
        let from = Placement::identity(*n);
        let to = Placement::from_v_to_phy(&target, *n).unwrap();
        let problem = TokenSwapProblem::from_placements(&device, &from, &to).unwrap();

        group.bench_with_input(BenchmarkId::new("astar", n), &problem, |b, p| {
            b.iter(|| AStarTokenSwap::new().solve(&device, black_box(p), &cancel).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("sat", n), &problem, |b, p| {
            b.iter(|| {
                SatTokenSwap::new(SwapObjective::SwapCount)
                    .solve(&device, black_box(p), &cancel)
                    .unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sabre_routing, bench_token_swap);
criterion_main!(benches);
