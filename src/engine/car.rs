//! Car - Deviation-based car kinematics
//!
//! The car never moves on screen vertically. Its vertical deviation scrolls
//! the road instead, and its horizontal deviation slides it across the lane.
//! One frame runs the phases in order: input, clamp, collision,
//! integration, decay, snap-to-rest.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{CarTuning, Geometry};
use crate::engine::collision::{CollisionModel, Offset, TileMask};
use crate::engine::scroll::ScrollWindow;
use crate::engine::tiles::Tile;
use crate::input::Steering;

/// What the car bumped into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bump {
    Wall,
    Obstacle(u8),
}

/// Motion state of one car
#[derive(Debug, Clone)]
pub struct CarController {
    tuning: CarTuning,
    /// Horizontal deviation from rest
    pub dev_x: f32,
    /// Vertical deviation from rest (positive scrolls forward)
    pub dev_y: f32,
    /// Frames remaining with input disabled
    pub stun: u32,
    /// Frames remaining of the recoil rotation
    pub bump_anim_len: u32,
    /// Recoil direction, `1` or `-1`
    pub bump_anim_dir: i8,
    pub x_active: bool,
    pub y_active: bool,
    /// Car top-left inside the lane surface
    pub left: f32,
    pub top: f32,
}

fn roll_direction<R: Rng + ?Sized>(rng: &mut R) -> i8 {
    if rng.gen_bool(0.5) {
        1
    } else {
        -1
    }
}

impl CarController {
    /// Car at rest on its lane anchor
    pub fn new<R: Rng + ?Sized>(tuning: CarTuning, geometry: &Geometry, rng: &mut R) -> Self {
        let (left, top) = geometry.car_origin();
        Self {
            tuning,
            dev_x: 0.0,
            dev_y: 0.0,
            stun: 0,
            bump_anim_len: 0,
            bump_anim_dir: roll_direction(rng),
            x_active: false,
            y_active: false,
            left,
            top,
        }
    }

    pub fn tuning(&self) -> &CarTuning {
        &self.tuning
    }

    /// Accumulate held input; contributes nothing while stunned or without control
    pub fn apply_input(&mut self, steering: Steering, control: bool) {
        let enabled = if self.stun == 0 && control { 1.0 } else { 0.0 };
        self.dev_x += self.tuning.x_speed * steering.x_axis() * enabled;
        self.dev_y += self.tuning.y_speed * steering.y_axis() * enabled;

        self.x_active = steering.x_active();
        self.y_active = steering.y_active();
    }

    pub fn clamp(&mut self) {
        self.dev_y = self.dev_y.clamp(self.tuning.min_dev_y, self.tuning.max_dev_y);
        self.dev_x = self.dev_x.clamp(self.tuning.min_dev_x, self.tuning.max_dev_x);
    }

    fn start_bump<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.bump_anim_len = self.tuning.bump_anim_frames;
        self.bump_anim_dir = roll_direction(rng);
        self.stun = self.tuning.stun_frames;
    }

    /// Bounce off a curb
    pub fn wall_bump<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.dev_x *= self.tuning.wall_bump_x;
        self.dev_y /= self.tuning.wall_bump_y_divisor;
        self.start_bump(rng);
    }

    /// Bounce off an obstacle
    pub fn obstacle_bump<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.dev_x *= self.tuning.obstacle_bump_x;
        self.dev_y *= self.tuning.obstacle_bump_y;
        self.start_bump(rng);
    }

    /// Offset of the car mask against a tile drawn at `tile_y`
    fn offset_against(&self, road_x: f32, tile_y: f32) -> Offset {
        ((self.left - road_x).floor() as i32, (self.top - tile_y).floor() as i32)
    }

    /// Test the curbs and every visible obstacle, bumping on contact
    ///
    /// Overlapping obstacles each apply their multiplier in turn. Returns the
    /// last bump applied this frame.
    pub fn collide<C, R>(
        &mut self,
        window: &ScrollWindow,
        geometry: &Geometry,
        collision: &C,
        rng: &mut R,
    ) -> Option<Bump>
    where
        C: CollisionModel + ?Sized,
        R: Rng + ?Sized,
    {
        let road_x = geometry.road_x();
        let mut last = None;

        let (curb_x, _) = self.offset_against(road_x, 0.0);
        if collision.overlaps(TileMask::Forward, (curb_x, 0)) && self.dev_x != 0.0 {
            self.wall_bump(rng);
            log::debug!("Wall bump at x={:.1}", self.left);
            last = Some(Bump::Wall);
        }

        for (index, tile) in window.visible_indexed() {
            let Tile::Obstacle(kind) = tile else {
                continue;
            };
            let offset = self.offset_against(road_x, geometry.tile_y(index, window.road_offset()));
            if collision.overlaps(TileMask::Obstacle(kind), offset)
                && (self.dev_x != 0.0 || self.dev_y != 0.0)
            {
                self.obstacle_bump(rng);
                log::debug!("Obstacle {} bump at window index {}", kind, index);
                last = Some(Bump::Obstacle(kind));
            }
        }

        last
    }

    /// Slide sideways; returns how far the road should scroll
    pub fn integrate(&mut self) -> f32 {
        self.left += self.dev_x;
        self.dev_y
    }

    /// Force forward motion after the road hit its backward limit
    pub fn nudge_forward(&mut self) {
        self.dev_y = self.tuning.backward_nudge;
    }

    /// Friction and timer countdown; cars coast to a stop faster once the race is over
    pub fn decay(&mut self, race_finished: bool) {
        let friction_y = if race_finished {
            self.tuning.friction_y_finished
        } else {
            self.tuning.friction_y_racing
        };
        self.dev_x -= self.dev_x / self.tuning.friction_x;
        self.dev_y -= self.dev_y / friction_y;
        self.stun = self.stun.saturating_sub(1);
        self.bump_anim_len = self.bump_anim_len.saturating_sub(1);
    }

    /// Zero out sub-threshold drift on axes without input
    pub fn snap_to_rest(&mut self) {
        let threshold = self.tuning.snap_threshold;
        if !self.y_active && self.dev_y.abs() < threshold {
            self.dev_y = 0.0;
        }
        if !self.x_active && self.dev_x.abs() < threshold {
            self.dev_x = 0.0;
        }
    }

    pub fn is_at_rest(&self) -> bool {
        self.dev_x == 0.0 && self.dev_y == 0.0
    }
}

/// Compact car state for snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarSnapshot {
    pub dev_x: f32,
    pub dev_y: f32,
    pub left: f32,
    pub top: f32,
    pub stun: u32,
    pub bump_anim_len: u32,
    pub bump_anim_dir: i8,
}

impl From<&CarController> for CarSnapshot {
    fn from(car: &CarController) -> Self {
        Self {
            dev_x: car.dev_x,
            dev_y: car.dev_y,
            left: car.left,
            top: car.top,
            stun: car.stun,
            bump_anim_len: car.bump_anim_len,
            bump_anim_dir: car.bump_anim_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrollTuning;
    use crate::engine::tiles::TileSequence;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn car() -> CarController {
        CarController::new(CarTuning::default(), &Geometry::default(), &mut StdRng::seed_from_u64(0))
    }

    fn window(draws: &[u8]) -> ScrollWindow {
        ScrollWindow::initial(TileSequence::from_draws(draws).unwrap(), ScrollTuning::default())
    }

    const UP_RIGHT: Steering = Steering {
        right: true,
        left: false,
        up: true,
        down: false,
    };

    #[test]
    fn input_accumulates_when_controlled() {
        let mut car = car();
        car.apply_input(UP_RIGHT, true);
        car.apply_input(UP_RIGHT, true);
        assert!((car.dev_x - 0.4).abs() < 1e-6);
        assert!((car.dev_y - 0.4).abs() < 1e-6);
        assert!(car.x_active && car.y_active);
    }

    #[test]
    fn input_ignored_while_stunned_or_without_control() {
        let mut car = car();
        car.apply_input(UP_RIGHT, false);
        assert!(car.is_at_rest());
        assert!(car.x_active, "activity tracks keys even without control");

        car.stun = 3;
        car.apply_input(UP_RIGHT, true);
        assert!(car.is_at_rest());
    }

    #[test]
    fn clamp_bounds() {
        let mut car = car();
        car.dev_x = 9.0;
        car.dev_y = -5.0;
        car.clamp();
        assert_eq!((car.dev_x, car.dev_y), (3.0, -2.0));
        car.dev_x = -4.0;
        car.dev_y = 12.0;
        car.clamp();
        assert_eq!((car.dev_x, car.dev_y), (-3.0, 8.0));
    }

    #[test]
    fn wall_bump_scenario() {
        let mut car = car();
        car.dev_x = 2.0;
        car.dev_y = 4.0;
        let walls = |tile: TileMask, _: Offset| tile == TileMask::Forward;
        let bump = car.collide(&window(&[0, 0]), &Geometry::default(), &walls, &mut StdRng::seed_from_u64(1));
        assert_eq!(bump, Some(Bump::Wall));
        assert_eq!(car.dev_x, -6.0);
        assert_eq!(car.dev_y, 2.0);
        assert_eq!(car.stun, 40);
        assert_eq!(car.bump_anim_len, 30);
        assert!(car.bump_anim_dir == 1 || car.bump_anim_dir == -1);
    }

    #[test]
    fn wall_contact_without_sideways_motion_is_ignored() {
        let mut car = car();
        car.dev_y = 4.0;
        let walls = |tile: TileMask, _: Offset| tile == TileMask::Forward;
        let bump = car.collide(&window(&[0, 0]), &Geometry::default(), &walls, &mut StdRng::seed_from_u64(1));
        assert_eq!(bump, None);
        assert_eq!(car.stun, 0);
    }

    #[test]
    fn obstacle_bump_reverses_both_axes() {
        let mut car = car();
        car.dev_x = 1.0;
        car.dev_y = 3.0;
        let obstacles = |tile: TileMask, _: Offset| matches!(tile, TileMask::Obstacle(_));
        let bump = car.collide(&window(&[0, 4, 0]), &Geometry::default(), &obstacles, &mut StdRng::seed_from_u64(1));
        assert_eq!(bump, Some(Bump::Obstacle(4)));
        assert_eq!((car.dev_x, car.dev_y), (-2.0, -6.0));
        assert_eq!(car.stun, 40);
    }

    #[test]
    fn overlapping_obstacles_compound() {
        let mut car = car();
        car.dev_x = 1.0;
        car.dev_y = 1.0;
        let obstacles = |tile: TileMask, _: Offset| matches!(tile, TileMask::Obstacle(_));
        let bump = car.collide(&window(&[2, 7]), &Geometry::default(), &obstacles, &mut StdRng::seed_from_u64(1));
        assert_eq!(bump, Some(Bump::Obstacle(7)));
        assert_eq!((car.dev_x, car.dev_y), (4.0, 4.0));
    }

    #[test]
    fn obstacle_offset_tracks_scroll() {
        let mut car = car();
        car.dev_y = 1.0;
        let mut w = window(&[5, 0]);
        w.advance_by(100.0);
        let geo = Geometry::default();
        // Obstacle 5 sits at window index 1, drawn at y = 100
        let expected = (344 - 120, 872 - 100);
        let probe = move |tile: TileMask, offset: Offset| tile == TileMask::Obstacle(5) && offset == expected;
        assert_eq!(car.collide(&w, &geo, &probe, &mut StdRng::seed_from_u64(1)), Some(Bump::Obstacle(5)));
    }

    #[test]
    fn decay_and_timers() {
        let mut car = car();
        car.dev_x = 5.0;
        car.dev_y = 9.0;
        car.stun = 1;
        car.decay(false);
        assert!((car.dev_x - 4.9).abs() < 1e-6);
        assert!((car.dev_y - 8.9).abs() < 1e-6);
        assert_eq!(car.stun, 0);
        car.decay(false);
        assert_eq!(car.stun, 0);
        assert_eq!(car.bump_anim_len, 0);
    }

    #[test]
    fn finished_race_brakes_harder() {
        let mut racing = car();
        let mut finished = car();
        racing.dev_y = 4.0;
        finished.dev_y = 4.0;
        racing.decay(false);
        finished.decay(true);
        assert!(finished.dev_y < racing.dev_y);
        assert!((finished.dev_y - 3.8).abs() < 1e-6);
    }

    #[test]
    fn snap_only_inactive_axes() {
        let mut car = car();
        car.dev_x = 0.9;
        car.dev_y = -0.5;
        car.x_active = true;
        car.y_active = false;
        car.snap_to_rest();
        assert_eq!(car.dev_x, 0.9);
        assert_eq!(car.dev_y, 0.0);
    }

    #[test]
    fn integrate_moves_sideways() {
        let mut car = car();
        car.dev_x = -2.5;
        car.dev_y = 6.0;
        assert_eq!(car.integrate(), 6.0);
        assert_eq!(car.left, 341.5);
    }
}
