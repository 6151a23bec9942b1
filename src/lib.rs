//! Divine Racing - Race simulation engine
//!
//! Procedural lanes, scrolling tile windows, pixel-mask collisions and the
//! Intro/Menu/Race state machine. Rendering, input polling and asset loading
//! are left to a front end, which drives [`GameStateMachine::tick`] once per
//! frame and draws through [`presentation::Renderer`].

pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod presentation;

use serde::{Deserialize, Serialize};

pub use config::GameConfig;
pub use engine::lane::PlayerId;
pub use engine::race::{RaceSnapshot, RaceStatus};
pub use engine::simulation::{FrameClock, FrameStats, GameStateMachine, StateKind};
pub use error::{ConfigError, RaceError};
pub use input::{Autopilot, InputFrame, InputSource};

/// How a headless run is driven
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessOptions {
    pub players: u8,
    pub lane_length: usize,
    /// Hard stop
    pub max_frames: u64,
    /// Frames to keep simulating after someone finishes
    pub coast_frames: u64,
    /// Pace to the configured frame rate instead of running flat out
    pub realtime: bool,
}

impl Default for HeadlessOptions {
    fn default() -> Self {
        Self {
            players: 1,
            lane_length: 2,
            max_frames: 10_000,
            coast_frames: 60,
            realtime: false,
        }
    }
}

/// Outcome of a headless run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessSummary {
    pub winner: Option<PlayerId>,
    /// Frame on which the winner crossed the line
    pub finished_frame: Option<u64>,
    pub stats: FrameStats,
    pub race: Option<RaceSnapshot>,
}

/// Play one race with the [`Autopilot`] and no window
pub fn run_headless(config: GameConfig, options: HeadlessOptions) -> Result<HeadlessSummary, RaceError> {
    let start_button = match options.players {
        1 => input::buttons::ONE_PLAYER.center,
        2 => input::buttons::TWO_PLAYERS.center,
        other => return Err(RaceError::InvalidPlayerCount(other)),
    };

    let mut clock = FrameClock::new(config.frame_rate);
    let frame_ms = clock.frame_ms();
    let mut game = GameStateMachine::new(config);
    game.set_lane_length(options.lane_length)?;

    // Frame 0 leaves the intro, frame 1 lands in the menu
    let mut pilot = Autopilot::new(start_button, 2);
    let mut race = None;
    let mut finished_frame = None;

    log::info!(
        "Headless run: {} player(s), {} tiles, up to {} frames",
        options.players,
        options.lane_length,
        options.max_frames
    );

    for frame in 0..options.max_frames {
        let input = pilot.next_frame(frame, race.as_ref());
        let delta_ms = if options.realtime { clock.tick() } else { frame_ms };
        if !game.tick(&input, delta_ms) {
            break;
        }

        race = game.snapshot();
        let winner_now = race.as_ref().and_then(|snapshot| snapshot.winner);
        match (finished_frame, winner_now) {
            (None, Some(_)) => finished_frame = Some(frame),
            (Some(at), _) if frame >= at + options.coast_frames => break,
            _ => {}
        }
    }

    let stats = game.stats();
    log::info!(
        "Headless run done after {} frames ({:.3} ms/tick)",
        stats.frames,
        stats.avg_tick_time_ms
    );

    Ok(HeadlessSummary {
        winner: race.as_ref().and_then(|snapshot| snapshot.winner),
        finished_frame,
        stats,
        race,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> GameConfig {
        GameConfig {
            seed: Some(2024),
            ..GameConfig::default()
        }
    }

    #[test]
    fn headless_run_reaches_the_race() {
        let summary = run_headless(
            seeded(),
            HeadlessOptions {
                players: 2,
                lane_length: 8,
                max_frames: 300,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(summary.stats.frames, 300);
        assert_eq!(summary.stats.state, StateKind::Racing);
        let race = summary.race.expect("race snapshot");
        assert_eq!(race.lanes.len(), 2);
        assert_eq!(race.lane_length, 8);
        assert_eq!(race.status, RaceStatus::Racing);
    }

    #[test]
    fn headless_run_is_reproducible() {
        let options = HeadlessOptions {
            max_frames: 400,
            ..Default::default()
        };
        let a = run_headless(seeded(), options).unwrap().race.unwrap();
        let b = run_headless(seeded(), options).unwrap().race.unwrap();
        assert_eq!(a.lanes[0].visible, b.lanes[0].visible);
        assert_eq!(a.lanes[0].road_offset, b.lanes[0].road_offset);
        assert_eq!(a.lanes[0].step, b.lanes[0].step);
    }

    #[test]
    fn headless_rejects_bad_options() {
        let three = HeadlessOptions {
            players: 3,
            ..Default::default()
        };
        assert_eq!(run_headless(seeded(), three).unwrap_err(), RaceError::InvalidPlayerCount(3));

        let odd = HeadlessOptions {
            lane_length: 7,
            ..Default::default()
        };
        assert_eq!(run_headless(seeded(), odd).unwrap_err(), RaceError::InvalidLaneLength(7));
    }
}
