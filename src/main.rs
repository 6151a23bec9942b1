use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

use divine_racing::{run_headless, GameConfig, HeadlessOptions};

#[derive(Parser, Debug)]
#[command(name = "divine-racing")]
struct Args {
    /// Number of players: 1 or 2
    #[arg(long, default_value_t = 1)]
    players: u8,

    /// Lane length in tiles: 2 | 8 | 16 | 32 (defaults to the config value)
    #[arg(long)]
    length: Option<usize>,

    /// RNG seed (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many frames
    #[arg(long, default_value_t = 10_000)]
    frames: u64,

    /// Frames to keep simulating after the winner crosses the line
    #[arg(long, default_value_t = 60)]
    coast: u64,

    /// JSON file overriding any subset of the tunables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pace frames to the configured frame rate
    #[arg(long)]
    realtime: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let options = HeadlessOptions {
        players: args.players,
        lane_length: args.length.unwrap_or(config.default_lane_length),
        max_frames: args.frames,
        coast_frames: args.coast,
        realtime: args.realtime,
    };
    let summary = run_headless(config, options)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    match (summary.winner, summary.finished_frame) {
        (Some(winner), Some(frame)) => println!("Winner: {:?} (frame {})", winner, frame),
        _ => println!("No winner after {} frames", summary.stats.frames),
    }
    if let Some(race) = &summary.race {
        for lane in &race.lanes {
            println!(
                "  {:?}: tile {}/{} offset {:.1} finished={}",
                lane.player, lane.step, race.lane_length, lane.road_offset, lane.finished
            );
        }
    }
    println!("Average tick: {:.3} ms", summary.stats.avg_tick_time_ms);

    Ok(())
}
