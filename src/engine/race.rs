//! Race - One race from countdown to finish
//!
//! Owns the lanes, the countdown and the hold-to-quit/restart gestures.
//! Lanes only report finishes; the session alone decides the winner.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::{GameConfig, SessionTimings};
use crate::engine::collision::CollisionModel;
use crate::engine::lane::{Lane, LaneContext, LaneSnapshot, PlayerId};
use crate::engine::tiles::TileSequence;
use crate::error::RaceError;
use crate::input::{buttons, InputFrame, Key};

/// Race setup chosen in the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceConfig {
    /// 1 or 2
    pub players: u8,
    /// Interior tiles per lane
    pub lane_length: usize,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            players: 1,
            lane_length: 2,
        }
    }
}

/// Race status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceStatus {
    Countdown,
    Racing,
    Finished,
}

/// Where the session wants the game to go next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRequest {
    /// Back to the menu
    Menu,
    /// Fresh race with the same player count and a new lane
    Restart,
}

/// Frame counter for a held gesture; drops to zero on release
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoldTimer {
    ticks: u32,
}

impl HoldTimer {
    pub fn update(&mut self, held: bool) {
        self.ticks = if held { self.ticks + 1 } else { 0 };
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn reached(&self, threshold: u32) -> bool {
        self.ticks >= threshold
    }
}

/// Complete race state
#[derive(Debug, Clone)]
pub struct RaceSession {
    config: RaceConfig,
    timings: SessionTimings,
    game: GameConfig,
    sequence: TileSequence,
    lanes: Vec<Lane>,
    starting_ticks: u32,
    winner: Option<PlayerId>,
    quit_hold: HoldTimer,
    restart_hold: HoldTimer,
    frame: u64,
    rng: StdRng,
}

impl RaceSession {
    /// Create a race on a freshly generated lane
    pub fn new(config: RaceConfig, game: &GameConfig, mut rng: StdRng) -> Result<Self, RaceError> {
        let sequence = TileSequence::generate(config.lane_length, &mut rng);
        Self::with_sequence(config, sequence, game, rng)
    }

    /// Create a race on a given lane; both players race the same layout
    pub fn with_sequence(
        config: RaceConfig,
        sequence: TileSequence,
        game: &GameConfig,
        mut rng: StdRng,
    ) -> Result<Self, RaceError> {
        let players: &[PlayerId] = match config.players {
            1 => &[PlayerId::Solo],
            2 => &[PlayerId::A, PlayerId::B],
            other => return Err(RaceError::InvalidPlayerCount(other)),
        };

        let lanes = players
            .iter()
            .map(|&player| Lane::new(player, sequence.clone(), game, &mut rng))
            .collect();

        log::info!(
            "Race created: {} player(s), {} tiles",
            config.players,
            sequence.lane_length()
        );
        log::debug!("Lane layout: {:?}", sequence.codes());

        Ok(Self {
            config,
            timings: game.timings.clone(),
            game: game.clone(),
            starting_ticks: game.timings.countdown_ticks,
            sequence,
            lanes,
            winner: None,
            quit_hold: HoldTimer::default(),
            restart_hold: HoldTimer::default(),
            frame: 0,
            rng,
        })
    }

    /// Same players on a brand-new lane
    pub fn restart_new_map(&mut self) -> Result<RaceSession, RaceError> {
        let rng = StdRng::seed_from_u64(self.rng.gen());
        Self::new(self.config, &self.game, rng)
    }

    /// Same players on the identical lane
    pub fn restart_same_map(&mut self) -> Result<RaceSession, RaceError> {
        let rng = StdRng::seed_from_u64(self.rng.gen());
        Self::with_sequence(self.config, self.sequence.clone(), &self.game, rng)
    }

    pub fn config(&self) -> RaceConfig {
        self.config
    }

    pub fn sequence(&self) -> &TileSequence {
        &self.sequence
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn lanes_mut(&mut self) -> &mut [Lane] {
        &mut self.lanes
    }

    pub fn starting_ticks(&self) -> u32 {
        self.starting_ticks
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }

    pub fn quit_hold(&self) -> HoldTimer {
        self.quit_hold
    }

    pub fn restart_hold(&self) -> HoldTimer {
        self.restart_hold
    }

    pub fn timings(&self) -> &SessionTimings {
        &self.timings
    }

    pub fn status(&self) -> RaceStatus {
        if self.winner.is_some() {
            RaceStatus::Finished
        } else if self.starting_ticks > 0 {
            RaceStatus::Countdown
        } else {
            RaceStatus::Racing
        }
    }

    /// Run one frame: gestures, every lane, winner arbitration, countdown
    pub fn update<C>(&mut self, input: &InputFrame, collision: &C) -> Option<SessionRequest>
    where
        C: CollisionModel + ?Sized,
    {
        let held = &input.held;
        if self.starting_ticks == 0 {
            self.quit_hold
                .update(held.is_held(Key::Escape) || held.is_held(Key::Enter));
            self.restart_hold
                .update(held.is_held(Key::Space) && held.is_held(Key::Delete));
        }

        // Every lane sees the state as it was at the start of the frame
        let finished = self.is_finished();
        let ctx = LaneContext {
            control_enabled: self.starting_ticks == 0 && !finished,
            race_finished: finished,
        };

        let mut first_finisher = None;
        for lane in &mut self.lanes {
            let report = lane.update(held, ctx, collision, &mut self.rng);
            if report.finished && first_finisher.is_none() {
                first_finisher = Some(lane.player());
            }
        }

        if let (None, Some(player)) = (self.winner, first_finisher) {
            self.winner = Some(player);
            log::info!("Race finished: {:?} wins after {} frames", player, self.frame);
        }

        let wants_menu = self.quit_hold.reached(self.timings.race_quit_hold)
            || (finished && buttons::MENU.is_clicked(&input.mouse));
        let wants_restart = self.restart_hold.reached(self.timings.restart_hold)
            || (finished && buttons::RESTART.is_clicked(&input.mouse));

        self.starting_ticks = self.starting_ticks.saturating_sub(1);
        self.frame += 1;

        if wants_restart {
            Some(SessionRequest::Restart)
        } else if wants_menu {
            Some(SessionRequest::Menu)
        } else {
            None
        }
    }

    pub fn snapshot(&self) -> RaceSnapshot {
        RaceSnapshot {
            status: self.status(),
            frame: self.frame,
            starting_ticks: self.starting_ticks,
            winner: self.winner,
            lane_length: self.sequence.lane_length(),
            lanes: self.lanes.iter().map(Lane::snapshot).collect(),
        }
    }
}

/// Compact race snapshot for front ends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub status: RaceStatus,
    pub frame: u64,
    pub starting_ticks: u32,
    pub winner: Option<PlayerId>,
    pub lane_length: usize,
    pub lanes: Vec<LaneSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::collision::{Offset, TileMask};
    use std::cell::Cell;

    fn session(players: u8, draws: &[u8]) -> RaceSession {
        RaceSession::with_sequence(
            RaceConfig {
                players,
                lane_length: draws.len(),
            },
            TileSequence::from_draws(draws).unwrap(),
            &GameConfig::default(),
            StdRng::seed_from_u64(4),
        )
        .unwrap()
    }

    fn nothing(_: TileMask, _: Offset) -> bool {
        false
    }

    fn skip_countdown(race: &mut RaceSession) {
        while race.starting_ticks() > 0 {
            race.update(&InputFrame::default(), &nothing);
        }
    }

    #[test]
    fn rejects_bad_player_count() {
        for players in [0, 3] {
            let err = RaceSession::new(
                RaceConfig {
                    players,
                    lane_length: 8,
                },
                &GameConfig::default(),
                StdRng::seed_from_u64(0),
            )
            .unwrap_err();
            assert_eq!(err, RaceError::InvalidPlayerCount(players));
        }
    }

    #[test]
    fn lanes_share_one_layout() {
        let race = session(2, &[1, 2, 3]);
        assert_eq!(race.lanes().len(), 2);
        assert_eq!(race.lanes()[0].player(), PlayerId::A);
        assert_eq!(race.lanes()[1].player(), PlayerId::B);
        assert_eq!(race.lanes()[0].window().sequence(), race.lanes()[1].window().sequence());
        assert_eq!(session(1, &[0]).lanes()[0].player(), PlayerId::Solo);
    }

    #[test]
    fn countdown_blocks_control() {
        let mut race = session(1, &[0, 0]);
        assert_eq!(race.status(), RaceStatus::Countdown);
        let gas = InputFrame::holding([Key::W, Key::D]);
        for _ in 0..210 {
            race.update(&gas, &nothing);
            assert!(race.lanes()[0].car().is_at_rest());
        }
        assert_eq!(race.starting_ticks(), 0);
        assert_eq!(race.status(), RaceStatus::Racing);
        race.update(&gas, &nothing);
        assert!(race.lanes()[0].car().dev_y > 0.0);
    }

    #[test]
    fn gestures_wait_for_the_countdown() {
        let mut race = session(1, &[0]);
        let quit = InputFrame::holding([Key::Escape]);
        for _ in 0..150 {
            assert_eq!(race.update(&quit, &nothing), None);
        }
        assert_eq!(race.quit_hold().ticks(), 0);
    }

    #[test]
    fn holding_escape_returns_to_menu() {
        let mut race = session(1, &[0]);
        skip_countdown(&mut race);
        let quit = InputFrame::holding([Key::Enter]);
        for _ in 0..99 {
            assert_eq!(race.update(&quit, &nothing), None);
        }
        assert_eq!(race.update(&quit, &nothing), Some(SessionRequest::Menu));
    }

    #[test]
    fn releasing_resets_the_hold() {
        let mut race = session(1, &[0]);
        skip_countdown(&mut race);
        let restart = InputFrame::holding([Key::Space, Key::Delete]);
        for _ in 0..59 {
            race.update(&restart, &nothing);
        }
        race.update(&InputFrame::holding([Key::Space]), &nothing);
        assert_eq!(race.restart_hold().ticks(), 0);
        for _ in 0..59 {
            assert_eq!(race.update(&restart, &nothing), None);
        }
        assert_eq!(race.update(&restart, &nothing), Some(SessionRequest::Restart));
    }

    #[test]
    fn restart_beats_menu() {
        let mut race = session(1, &[0]);
        skip_countdown(&mut race);
        let both = InputFrame::holding([Key::Escape, Key::Space, Key::Delete]);
        let mut last = None;
        for _ in 0..100 {
            last = race.update(&both, &nothing).or(last);
        }
        assert_eq!(last, Some(SessionRequest::Restart));
    }

    #[test]
    fn first_finisher_wins_and_loser_coasts() {
        let mut race = session(2, &[]);
        skip_countdown(&mut race);

        // Lanes update in order, so only lane A's finish probe succeeds
        let probes = Cell::new(0);
        let lane_a_only = |tile: TileMask, _: Offset| {
            if tile != TileMask::Finish {
                return false;
            }
            probes.set(probes.get() + 1);
            probes.get() == 1
        };

        race.lanes_mut()[1].car_mut().dev_y = 6.0;
        race.update(&InputFrame::default(), &lane_a_only);
        assert_eq!(race.winner(), Some(PlayerId::A));
        assert_eq!(race.status(), RaceStatus::Finished);
        assert!(!race.lanes()[1].has_finished());

        let before = race.lanes()[1].car().dev_y;
        race.update(&InputFrame::holding([Key::Up]), &nothing);
        let after = race.lanes()[1].car().dev_y;
        assert!(after < before, "lane B should coast down, {} -> {}", before, after);
        assert!((after - (before - before / 20.0)).abs() < 1e-5);
    }

    #[test]
    fn simultaneous_finish_goes_to_lane_order() {
        let mut race = session(2, &[]);
        skip_countdown(&mut race);
        let finish = |tile: TileMask, _: Offset| tile == TileMask::Finish;
        race.update(&InputFrame::default(), &finish);
        assert_eq!(race.winner(), Some(PlayerId::A));
        race.update(&InputFrame::default(), &finish);
        assert_eq!(race.winner(), Some(PlayerId::A));
        assert!(race.lanes()[1].has_finished());
    }

    #[test]
    fn result_buttons_only_after_finish() {
        let mut race = session(1, &[]);
        skip_countdown(&mut race);
        let click = InputFrame::clicking(buttons::MENU.center);
        assert_eq!(race.update(&click, &nothing), None);

        let finish = |tile: TileMask, _: Offset| tile == TileMask::Finish;
        race.update(&InputFrame::default(), &finish);
        assert_eq!(race.update(&click, &nothing), Some(SessionRequest::Menu));
        let restart = InputFrame::clicking(buttons::RESTART.center);
        assert_eq!(race.update(&restart, &nothing), Some(SessionRequest::Restart));
    }

    #[test]
    fn restarts_keep_players() {
        let mut race = session(2, &[1, 2, 3, 4, 5, 6, 7, 8]);
        let same = race.restart_same_map().unwrap();
        assert_eq!(same.sequence(), race.sequence());
        assert_eq!(same.config().players, 2);
        assert_eq!(same.starting_ticks(), 210);

        let fresh = race.restart_new_map().unwrap();
        assert_eq!(fresh.config(), race.config());
        assert_eq!(fresh.sequence().lane_length(), 8);
    }

    #[test]
    fn snapshot_serializes() {
        let race = session(2, &[3]);
        let json = serde_json::to_string(&race.snapshot()).unwrap();
        assert!(json.contains("\"status\":\"Countdown\""));
        assert!(json.contains("\"lanes\""));
    }
}
