//! Print today's puzzle and play one greedy attempt against an in-memory store

use grid_core::{day, GameEngine, MemoryStore, Operation};

fn main() {
    let today = day::today();
    let mut engine = GameEngine::new(MemoryStore::new(), today);

    let level = engine.level().clone();
    println!("Day {} (level {})", today + 1, level.level_index);
    println!("Start {}  Target {}\n", level.start_value, level.target);
    for row in level.grid.chunks(6) {
        let cells: Vec<String> = row.iter().map(|v| format!("{v:>3}")).collect();
        println!("{}", cells.join(" "));
    }

    // Each move: pick the cell/operation that lands closest to the target
    println!();
    loop {
        let running = engine.attempt().running_value();
        let best = (0..level.grid.len())
            .filter(|i| !engine.attempt().used().contains(i))
            .flat_map(|i| Operation::ALL.into_iter().map(move |op| (i, op)))
            .filter_map(|(i, op)| op.apply(running, level.grid[i]).map(|v| (i, op, v)))
            .min_by_key(|&(_, _, v)| (v - level.target).abs());
        let Some((cell, op, value)) = best else {
            break;
        };

        engine.select_cell(cell);
        println!("{running} {op} {} = {value}", level.grid[cell]);
        if engine.apply_operation(op) != grid_core::AttemptResult::Continue {
            break;
        }
    }

    println!("\n{}", engine.share_text());
    println!("Tries left: {}", engine.progress().tries_remaining);
}
