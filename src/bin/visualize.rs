//! ASCII demo visualizer: drives a simulation through public snapshot
//! accessors only, the way a real embedder would, and prints periodic
//! frames of combined height as a character ramp. Not part of the library
//! surface — a standalone binary grounded in `main.rs`'s `eprintln!`
//! diagnostics convention, rendered to `stdout` as text instead of PNGs
//! since there is no `image` dependency left to draw with.

use erosion::generate::Generator;
use erosion::params::Params;
use erosion::topology::TwoD;
use erosion::Simulation;

const RAMP: &[u8] = b" .:-=+*#%@";
const WIDTH: usize = 60;
const HEIGHT: usize = 30;
const TICKS: u64 = 300;
const FRAME_EVERY: u64 = 50;

fn main() {
    let mut params = Params::default();
    params.seed = 7;
    let mut sim = Simulation::<TwoD>::new(WIDTH, HEIGHT, params).expect("invalid simulation configuration");
    sim.generate(&Generator::Bowl { amplitude: 8.0 });

    for tick in 0..TICKS {
        sim.step();
        if tick % FRAME_EVERY == 0 {
            print_frame(&sim, tick);
        }
    }
    print_frame(&sim, TICKS);
}

fn print_frame(sim: &Simulation<TwoD>, tick: u64) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for y in 0..sim.height() {
        for x in 0..sim.width() {
            let h = sim.combined_height(x, y);
            min = min.min(h);
            max = max.max(h);
        }
    }

    println!("--- tick {tick} (min={min:.2} max={max:.2}) ---");
    for y in 0..sim.height() {
        let mut line = String::with_capacity(sim.width());
        for x in 0..sim.width() {
            let h = sim.combined_height(x, y);
            let t = if max > min { (h - min) / (max - min) } else { 0.0 };
            let idx = ((t * (RAMP.len() - 1) as f32).round() as usize).min(RAMP.len() - 1);
            line.push(RAMP[idx] as char);
        }
        println!("{line}");
    }
}
