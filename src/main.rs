use std::io::Write;

use clap::Parser;
use env_logger::Builder;
use log::info;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use mwpm::{minimum_weight_perfect_matching, MatrixGraph};

/// Runs the matcher over seeded random instances.
#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Number of vertices per instance
    #[arg(short = 'n', long, default_value_t = 12)]
    vertices: usize,

    /// Probability that any given pair of vertices is joined by an edge
    #[arg(short, long, default_value_t = 0.8)]
    density: f64,

    /// Upper bound for the uniform edge weights
    #[arg(short = 'w', long, default_value_t = 100.0)]
    max_weight: f64,

    /// RNG seed
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Number of instances to run
    #[arg(short, long, default_value_t = 1)]
    runs: usize,
}

fn main() {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
    let args = Args::parse();

    let mut rng = Pcg64::seed_from_u64(args.seed);
    for run in 0..args.runs {
        let graph = MatrixGraph::random(args.vertices, args.density, args.max_weight, &mut rng);
        match minimum_weight_perfect_matching(&graph) {
            Ok(matching) => {
                info!("run {}: matched {} pairs", run, matching.pairs.len());
                println!("run {}: {:?} weight {:.3}", run, matching.pairs, matching.weight);
            }
            Err(err) => println!("run {}: {}", run, err),
        }
    }
}
