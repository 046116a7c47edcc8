use std::env;

use erosion::generate::Generator;
use erosion::params::Params;
use erosion::timing::Tick;
use erosion::topology::TwoD;
use erosion::Simulation;

fn main() {
    let args: Vec<String> = env::args().collect();
    let seed: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(42);
    let width: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(128);
    let height: usize = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(128);
    let ticks: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(500);

    let mut params = Params::default();
    params.seed = seed;
    eprintln!(
        "Eroding {}x{} grid, seed={}, dt={}, rainfall={}",
        width, height, seed, params.dt, params.rainfall
    );

    let mut sim = Simulation::<TwoD>::new(width, height, params).expect("invalid simulation configuration");
    sim.generate(&Generator::Island {
        amplitude: 12.0,
        octaves: 5,
    });

    let t = Tick::start();
    for _ in 0..ticks {
        sim.step();
    }
    let timing = t.finish("erosion");
    eprintln!(
        "\nTimings:\n  {:20} {:8.1} ms ({} threads)",
        timing.name,
        timing.ms,
        sim.thread_count()
    );

    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut sum = 0.0f64;
    let mut count = 0usize;
    for y in 0..sim.height() {
        for x in 0..sim.width() {
            let h = sim.combined_height(x, y);
            min = min.min(h);
            max = max.max(h);
            sum += h as f64;
            count += 1;
        }
    }
    eprintln!(
        "combined height: min={:.3} max={:.3} mean={:.3}",
        min,
        max,
        sum / count as f64
    );

    match sim.check_finite() {
        Ok(()) => eprintln!("Done."),
        Err(e) => eprintln!("WARNING: {e}"),
    }
}
