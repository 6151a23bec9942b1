//! Config - Tunables for the race engine
//!
//! Every constant the simulation depends on lives here with its default,
//! so a JSON file can override any subset of them.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Lane lengths offered by the menu
pub const SELECTABLE_LENGTHS: [usize; 4] = [2, 8, 16, 32];

/// Car motion and collision response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CarTuning {
    /// Horizontal deviation added per frame of held input
    pub x_speed: f32,
    /// Vertical deviation added per frame of held input
    pub y_speed: f32,
    pub min_dev_x: f32,
    pub max_dev_x: f32,
    pub min_dev_y: f32,
    pub max_dev_y: f32,
    /// Wall bump: `dev_x *= wall_bump_x`, `dev_y /= wall_bump_y_divisor`
    pub wall_bump_x: f32,
    pub wall_bump_y_divisor: f32,
    /// Obstacle bump: `dev_x *= obstacle_bump_x`, `dev_y *= obstacle_bump_y`
    pub obstacle_bump_x: f32,
    pub obstacle_bump_y: f32,
    /// Frames of disabled input after a bump
    pub stun_frames: u32,
    /// Frames of recoil rotation after a bump
    pub bump_anim_frames: u32,
    pub friction_x: f32,
    pub friction_y_racing: f32,
    pub friction_y_finished: f32,
    /// Residual deviation below this magnitude snaps to zero without input
    pub snap_threshold: f32,
    /// Vertical deviation forced when the scroll offset hits its lower clamp
    pub backward_nudge: f32,
}

impl Default for CarTuning {
    fn default() -> Self {
        Self {
            x_speed: 0.2,
            y_speed: 0.2,
            min_dev_x: -3.0,
            max_dev_x: 3.0,
            min_dev_y: -2.0,
            max_dev_y: 8.0,
            wall_bump_x: -3.0,
            wall_bump_y_divisor: 2.0,
            obstacle_bump_x: -2.0,
            obstacle_bump_y: -2.0,
            stun_frames: 40,
            bump_anim_frames: 30,
            friction_x: 50.0,
            friction_y_racing: 90.0,
            friction_y_finished: 20.0,
            snap_threshold: 1.0,
            backward_nudge: 1.0,
        }
    }
}

/// Scroll window sizing and thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollTuning {
    /// Tiles visible at once
    pub window_len: usize,
    /// Offset above which the window shifts one tile forward
    pub shift_threshold: f32,
    /// Offset restored after a shift
    pub carry_over: f32,
    /// Lowest offset before the car is nudged forward
    pub min_offset: f32,
}

impl Default for ScrollTuning {
    fn default() -> Self {
        Self {
            window_len: 4,
            shift_threshold: 1024.0,
            carry_over: 512.0,
            min_offset: -56.0,
        }
    }
}

/// Pixel geometry of a lane surface
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    pub screen_width: i32,
    pub screen_height: i32,
    /// Horizontal center of the car inside its lane surface
    pub car_anchor_x: i32,
    pub tile_width: i32,
    pub tile_height: i32,
    pub car_width: i32,
    pub car_height: i32,
    /// Width of the solid curb on each side of a forward tile
    pub wall_width: i32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            screen_width: 1536,
            screen_height: 1280,
            car_anchor_x: 1536 / 4 - 8,
            tile_width: 512,
            tile_height: 512,
            car_width: 64,
            car_height: 96,
            wall_width: 48,
        }
    }
}

impl Geometry {
    /// Left edge of the road tiles inside the lane surface
    pub fn road_x(&self) -> f32 {
        (self.car_anchor_x - self.tile_width / 2) as f32
    }

    /// Initial top-left corner of the car inside the lane surface
    pub fn car_origin(&self) -> (f32, f32) {
        let half = self.car_width / 2;
        (
            (self.car_anchor_x - half) as f32,
            (self.screen_height - self.car_anchor_x - half) as f32,
        )
    }

    /// Screen y of the tile at `index` within the visible window
    pub fn tile_y(&self, index: usize, road_offset: f32) -> f32 {
        self.screen_height as f32 - self.tile_height as f32 * (index as f32 + 1.5) + road_offset
    }
}

/// Frame-counted timers of a race session and the menu
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTimings {
    pub countdown_ticks: u32,
    pub ready_tick: u32,
    pub set_tick: u32,
    pub go_tick: u32,
    /// Frames Escape/Enter must be held to leave a race
    pub race_quit_hold: u32,
    /// Frames Space+Delete must be held to restart a race
    pub restart_hold: u32,
    /// Frames the quit gesture must be held in the menu to exit
    pub menu_quit_hold: u32,
    pub menu_quit_fade: u32,
    pub race_quit_fade: u32,
    pub restart_fade: u32,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            countdown_ticks: 210,
            ready_tick: 180,
            set_tick: 120,
            go_tick: 60,
            race_quit_hold: 100,
            restart_hold: 60,
            menu_quit_hold: 60,
            menu_quit_fade: 30,
            race_quit_fade: 60,
            restart_fade: 30,
        }
    }
}

/// Top-level game configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub frame_rate: u32,
    /// Lane length preselected in the menu on startup
    pub default_lane_length: usize,
    /// Seed for lane generation and bump directions; entropy when absent
    pub seed: Option<u64>,
    pub car: CarTuning,
    pub scroll: ScrollTuning,
    pub geometry: Geometry,
    pub timings: SessionTimings,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            default_lane_length: 2,
            seed: None,
            car: CarTuning::default(),
            scroll: ScrollTuning::default(),
            geometry: Geometry::default(),
            timings: SessionTimings::default(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON config; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Reject values that would break the simulation's arithmetic
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.frame_rate == 0 {
            return invalid("frame_rate must be positive");
        }
        if !SELECTABLE_LENGTHS.contains(&self.default_lane_length) {
            return invalid("default_lane_length must be one of 2, 8, 16, 32");
        }

        let car = &self.car;
        if car.min_dev_x > car.max_dev_x || car.min_dev_y > car.max_dev_y {
            return invalid("deviation clamp bounds are inverted");
        }
        if car.wall_bump_y_divisor == 0.0
            || car.friction_x == 0.0
            || car.friction_y_racing == 0.0
            || car.friction_y_finished == 0.0
        {
            return invalid("divisors must be nonzero");
        }

        let scroll = &self.scroll;
        if scroll.window_len == 0 {
            return invalid("scroll.window_len must be positive");
        }
        if scroll.carry_over >= scroll.shift_threshold {
            return invalid("scroll.carry_over must be below scroll.shift_threshold");
        }
        if scroll.min_offset >= scroll.carry_over {
            return invalid("scroll.min_offset must be below scroll.carry_over");
        }

        let geo = &self.geometry;
        if geo.tile_width <= 0 || geo.tile_height <= 0 || geo.car_width <= 0 || geo.car_height <= 0 {
            return invalid("geometry sizes must be positive");
        }
        if geo.wall_width * 2 >= geo.tile_width {
            return invalid("geometry.wall_width leaves no road between the curbs");
        }

        let t = &self.timings;
        if !(t.countdown_ticks >= t.ready_tick && t.ready_tick >= t.set_tick && t.set_tick >= t.go_tick) {
            return invalid("countdown ticks must be ordered countdown >= ready >= set >= go");
        }
        if t.menu_quit_fade == 0 || t.race_quit_fade == 0 || t.restart_fade == 0 {
            return invalid("fade lengths must be positive");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = GameConfig::from_json_str(r#"{ "seed": 7, "car": { "stun_frames": 12 } }"#).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.car.stun_frames, 12);
        assert_eq!(config.car.bump_anim_frames, 30);
        assert_eq!(config.scroll.shift_threshold, 1024.0);
        assert_eq!(config.timings.countdown_ticks, 210);
    }

    #[test]
    fn rejects_unselectable_length() {
        let err = GameConfig::from_json_str(r#"{ "default_lane_length": 5 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_friction() {
        let err = GameConfig::from_json_str(r#"{ "car": { "friction_x": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_garbage() {
        let err = GameConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn geometry_positions() {
        let geo = Geometry::default();
        assert_eq!(geo.car_anchor_x, 376);
        assert_eq!(geo.road_x(), 120.0);
        assert_eq!(geo.car_origin(), (344.0, 872.0));
        assert_eq!(geo.tile_y(0, 0.0), 512.0);
        assert_eq!(geo.tile_y(1, 100.0), 100.0);
    }
}
