use std::hint::black_box;
use std::process::ExitCode;
use std::time::Instant;

use arb_detector_core::detect_cycle;
use perf_bench::*;

fn main() -> ExitCode {
    let graph = match ring_graph() {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("Failed to build ring graph: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let start_time = Instant::now();
    let result = detect_cycle(black_box(&graph), &asset(0));
    let elapsed_time = start_time.elapsed();

    println!("--- Ring Benchmark Results ({} Assets) ---", RING_ASSETS);
    match result {
        Ok(result) => println!("Detected: {} ({} hops)", result.detected, result.cycle.len()),
        Err(e) => println!("Error: {}", e),
    }
    println!("Elapsed Time: {:?}", elapsed_time);
    ExitCode::SUCCESS
}
