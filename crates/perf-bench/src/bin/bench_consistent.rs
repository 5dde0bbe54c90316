use std::hint::black_box;
use std::process::ExitCode;
use std::time::Instant;

use arb_detector_core::detect_cycle;
use perf_bench::*;

fn main() -> ExitCode {
    let graph = match consistent_graph() {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("Failed to build consistent graph: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Every asset is tried as the source; none of them should find a loop.
    let start_time = Instant::now();
    let mut detected = 0usize;
    for source in graph.nodes() {
        if let Ok(result) = detect_cycle(black_box(&graph), source) {
            detected += usize::from(result.detected);
        }
    }
    let elapsed_time = start_time.elapsed();

    println!(
        "--- Consistent Benchmark Results ({} Assets, {} Edges) ---",
        graph.num_nodes(),
        graph.num_edges()
    );
    println!("Sources with a cycle: {}", black_box(detected));
    println!("Elapsed Time: {:?}", elapsed_time);
    ExitCode::SUCCESS
}
