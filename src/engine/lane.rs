//! Lane - One player's track, car and finish detection
//!
//! Lanes never touch session state. They run one frame against a read-only
//! [`LaneContext`] and report what happened.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{GameConfig, Geometry};
use crate::engine::car::{Bump, CarController, CarSnapshot};
use crate::engine::collision::{CollisionModel, Offset, TileMask};
use crate::engine::scroll::ScrollWindow;
use crate::engine::tiles::TileSequence;
use crate::input::{Controls, KeySet};

/// Lane owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerId {
    /// Left lane, WASD
    A,
    /// Right lane, arrow keys
    B,
    /// Single-player lane, either binding
    Solo,
}

impl PlayerId {
    pub fn index(self) -> usize {
        match self {
            PlayerId::A => 0,
            PlayerId::B => 1,
            PlayerId::Solo => 2,
        }
    }

    pub fn controls(self) -> Controls {
        match self {
            PlayerId::A => Controls::Wasd,
            PlayerId::B => Controls::Arrows,
            PlayerId::Solo => Controls::Both,
        }
    }
}

/// Session state a lane may read during its frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaneContext {
    /// Countdown over and nobody has finished
    pub control_enabled: bool,
    pub race_finished: bool,
}

/// What happened in a lane this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaneReport {
    /// First frame the car crossed the finish line
    pub finished: bool,
    pub bump: Option<Bump>,
}

/// A player's full race state
#[derive(Debug, Clone)]
pub struct Lane {
    player: PlayerId,
    controls: Controls,
    window: ScrollWindow,
    car: CarController,
    geometry: Geometry,
    finish_reported: bool,
}

impl Lane {
    pub fn new<R: Rng + ?Sized>(
        player: PlayerId,
        sequence: TileSequence,
        config: &GameConfig,
        rng: &mut R,
    ) -> Self {
        Self {
            player,
            controls: player.controls(),
            window: ScrollWindow::initial(sequence, config.scroll.clone()),
            car: CarController::new(config.car.clone(), &config.geometry, rng),
            geometry: config.geometry.clone(),
            finish_reported: false,
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn window(&self) -> &ScrollWindow {
        &self.window
    }

    pub fn car(&self) -> &CarController {
        &self.car
    }

    pub fn car_mut(&mut self) -> &mut CarController {
        &mut self.car
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn has_finished(&self) -> bool {
        self.finish_reported
    }

    /// Offset of the car mask against the finish mask, once the End tile is visible
    pub fn finish_offset(&self) -> Option<Offset> {
        let index = self.window.end_index()?;
        let end_y = self.geometry.tile_y(index, self.window.road_offset());
        Some((
            self.geometry.road_x().floor() as i32,
            (end_y - self.geometry.tile_height as f32).floor() as i32,
        ))
    }

    /// Run one frame
    pub fn update<C, R>(
        &mut self,
        held: &KeySet,
        ctx: LaneContext,
        collision: &C,
        rng: &mut R,
    ) -> LaneReport
    where
        C: CollisionModel + ?Sized,
        R: Rng + ?Sized,
    {
        let mut report = LaneReport::default();

        self.car.apply_input(self.controls.read(held), ctx.control_enabled);
        self.car.clamp();
        report.bump = self.car.collide(&self.window, &self.geometry, collision, rng);

        if !self.finish_reported {
            if let Some(offset) = self.finish_offset() {
                if collision.overlaps(TileMask::Finish, offset) {
                    self.finish_reported = true;
                    report.finished = true;
                    log::debug!("Lane {:?} crossed the finish line", self.player);
                }
            }
        }

        let scroll = self.car.integrate();
        if self.window.advance_by(scroll).clamped {
            self.car.nudge_forward();
        }

        self.car.decay(ctx.race_finished);
        self.car.snap_to_rest();

        report
    }

    pub fn snapshot(&self) -> LaneSnapshot {
        LaneSnapshot {
            player: self.player,
            step: self.window.step(),
            road_offset: self.window.road_offset(),
            visible: self.window.visible().iter().map(|tile| tile.code()).collect(),
            car: CarSnapshot::from(&self.car),
            finished: self.finish_reported,
        }
    }
}

/// Compact lane state for snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneSnapshot {
    pub player: PlayerId,
    pub step: usize,
    pub road_offset: f32,
    pub visible: Vec<u8>,
    pub car: CarSnapshot,
    pub finished: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::collision::MaskSet;
    use crate::input::Key;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const RACING: LaneContext = LaneContext {
        control_enabled: true,
        race_finished: false,
    };

    fn lane(draws: &[u8]) -> Lane {
        let seq = TileSequence::from_draws(draws).unwrap();
        Lane::new(PlayerId::Solo, seq, &GameConfig::default(), &mut StdRng::seed_from_u64(3))
    }

    fn nothing(_: TileMask, _: Offset) -> bool {
        false
    }

    #[test]
    fn player_bindings() {
        assert_eq!(PlayerId::A.controls(), Controls::Wasd);
        assert_eq!(PlayerId::B.controls(), Controls::Arrows);
        assert_eq!(PlayerId::Solo.controls(), Controls::Both);
        assert_eq!(PlayerId::B.index(), 1);
    }

    #[test]
    fn holding_forward_scrolls_the_road() {
        let mut lane = lane(&[0, 0, 0, 0, 0, 0]);
        let held: KeySet = [Key::W].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..60 {
            lane.update(&held, RACING, &nothing, &mut rng);
        }
        assert!(lane.window().road_offset() > 0.0);
        assert!(lane.car().dev_y > 0.0);
    }

    #[test]
    fn backward_limit_nudges_forward() {
        let mut lane = lane(&[0, 0]);
        let held: KeySet = [Key::Down].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(0);
        let mut nudged = false;
        for _ in 0..200 {
            lane.update(&held, RACING, &nothing, &mut rng);
            assert!(lane.window().road_offset() >= -56.0);
            nudged |= lane.window().road_offset() == -56.0;
        }
        assert!(nudged);
    }

    #[test]
    fn finish_reported_once() {
        let mut lane = lane(&[]);
        let always = |tile: TileMask, _: Offset| tile == TileMask::Finish;
        let mut rng = StdRng::seed_from_u64(0);
        let first = lane.update(&KeySet::new(), RACING, &always, &mut rng);
        let second = lane.update(&KeySet::new(), RACING, &always, &mut rng);
        assert!(first.finished);
        assert!(!second.finished);
        assert!(lane.has_finished());
    }

    #[test]
    fn finish_needs_end_in_view() {
        let long = lane(&[0, 0, 0, 0]);
        assert_eq!(long.finish_offset(), None);
        let short = lane(&[0]);
        // End at window index 2: y = 1280 - 512 * 3.5 = -512
        assert_eq!(short.finish_offset(), Some((120, -1024)));
    }

    #[test]
    fn procedural_lane_reaches_the_finish() {
        let config = GameConfig::default();
        let seq = TileSequence::from_draws(&[0, 0]).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let mut lane = Lane::new(PlayerId::A, seq, &config, &mut rng);
        let masks = MaskSet::procedural(&config.geometry);
        let held: KeySet = [Key::W].into_iter().collect();

        let mut finished_at = None;
        for frame in 0..2000 {
            if lane.update(&held, RACING, &masks, &mut rng).finished {
                finished_at = Some(frame);
                break;
            }
        }
        assert!(finished_at.is_some(), "never finished: {:?}", lane.snapshot());
    }

    #[test]
    fn snapshot_reflects_window() {
        let lane = lane(&[3, 0, 7, 2, 9, 0, 1, 5]);
        let snap = lane.snapshot();
        assert_eq!(snap.step, 4);
        assert_eq!(snap.visible, vec![11, 3, 0, 7]);
        assert!(!snap.finished);
    }
}
