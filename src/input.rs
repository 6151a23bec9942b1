//! Input - Per-frame input snapshots and control bindings
//!
//! Raw keyboard/mouse polling lives outside the engine. A front end hands
//! the engine one [`InputFrame`] per tick.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::engine::lane::PlayerId;
use crate::engine::race::RaceSnapshot;

/// Keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    W,
    A,
    S,
    D,
    Up,
    Down,
    Left,
    Right,
    Escape,
    Enter,
    Space,
    Delete,
    Num0,
    Num1,
    Num2,
    Num3,
    Other,
}

/// Set of currently held keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet(HashSet<Key>);

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: Key) {
        self.0.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.0.remove(&key);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.0.contains(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Key> for KeySet {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Mouse state sampled once per frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MouseState {
    pub position: (f32, f32),
    pub left_down: bool,
}

/// Everything the engine reads from the outside world in one frame
#[derive(Debug, Clone, Default)]
pub struct InputFrame {
    /// Keys currently held
    pub held: KeySet,
    /// Key-down events that arrived since the previous frame
    pub pressed: Vec<Key>,
    pub mouse: MouseState,
    /// Window close requested
    pub close_requested: bool,
}

impl InputFrame {
    pub fn holding(keys: impl IntoIterator<Item = Key>) -> Self {
        Self {
            held: keys.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn pressing(keys: impl IntoIterator<Item = Key>) -> Self {
        Self {
            pressed: keys.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn clicking(position: (f32, f32)) -> Self {
        Self {
            mouse: MouseState {
                position,
                left_down: true,
            },
            ..Default::default()
        }
    }
}

/// Steering intent decoded from a lane's key bindings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Steering {
    pub right: bool,
    pub left: bool,
    pub up: bool,
    pub down: bool,
}

impl Steering {
    /// `+1`, `0` or `-1` along x
    pub fn x_axis(&self) -> f32 {
        self.right as i32 as f32 - self.left as i32 as f32
    }

    /// `+1`, `0` or `-1` along y (up is forward)
    pub fn y_axis(&self) -> f32 {
        self.up as i32 as f32 - self.down as i32 as f32
    }

    pub fn x_active(&self) -> bool {
        self.right || self.left
    }

    pub fn y_active(&self) -> bool {
        self.up || self.down
    }
}

/// One key per direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bindings {
    pub up: Key,
    pub down: Key,
    pub left: Key,
    pub right: Key,
}

/// Key bindings of a lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Controls {
    Wasd,
    Arrows,
    Both,
}

impl Controls {
    fn wasd(self) -> bool {
        matches!(self, Controls::Wasd | Controls::Both)
    }

    fn arrows(self) -> bool {
        matches!(self, Controls::Arrows | Controls::Both)
    }

    /// Keys for up, down, left and right; WASD when both are bound
    pub fn bindings(self) -> Bindings {
        match self {
            Controls::Arrows => Bindings {
                up: Key::Up,
                down: Key::Down,
                left: Key::Left,
                right: Key::Right,
            },
            Controls::Wasd | Controls::Both => Bindings {
                up: Key::W,
                down: Key::S,
                left: Key::A,
                right: Key::D,
            },
        }
    }

    /// Decode steering from the held keys
    pub fn read(self, held: &KeySet) -> Steering {
        let bound = |wasd: Key, arrow: Key| {
            (self.wasd() && held.is_held(wasd)) || (self.arrows() && held.is_held(arrow))
        };

        Steering {
            right: bound(Key::D, Key::Right),
            left: bound(Key::A, Key::Left),
            up: bound(Key::W, Key::Up),
            down: bound(Key::S, Key::Down),
        }
    }
}

/// Clickable screen rectangle, given by center and half extents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hotspot {
    pub center: (f32, f32),
    pub half_extent: (f32, f32),
}

impl Hotspot {
    pub const fn new(center: (f32, f32), half_extent: (f32, f32)) -> Self {
        Self { center, half_extent }
    }

    pub fn contains(&self, point: (f32, f32)) -> bool {
        (point.0 - self.center.0).abs() <= self.half_extent.0
            && (point.1 - self.center.1).abs() <= self.half_extent.1
    }

    /// Left button held over this spot
    pub fn is_clicked(&self, mouse: &MouseState) -> bool {
        mouse.left_down && self.contains(mouse.position)
    }
}

/// Button placement on the 1536x1280 screen
pub mod buttons {
    use super::Hotspot;

    const PLAYER_HALF: (f32, f32) = (160.0, 96.0);
    const SMALL_HALF: (f32, f32) = (128.0, 48.0);
    const RESULT_HALF: (f32, f32) = (160.0, 80.0);

    pub const ONE_PLAYER: Hotspot = Hotspot::new((418.0, 420.0), PLAYER_HALF);
    pub const TWO_PLAYERS: Hotspot = Hotspot::new((1118.0, 420.0), PLAYER_HALF);
    pub const QUIT: Hotspot = Hotspot::new((768.0, 768.0), SMALL_HALF);
    pub const SHORT_GAME: Hotspot = Hotspot::new((484.0, 1152.0), SMALL_HALF);
    pub const MEDIUM_GAME: Hotspot = Hotspot::new((768.0, 1152.0), SMALL_HALF);
    pub const LONG_GAME: Hotspot = Hotspot::new((1052.0, 1152.0), SMALL_HALF);
    pub const RESTART: Hotspot = Hotspot::new((384.0, 1000.0), RESULT_HALF);
    pub const MENU: Hotspot = Hotspot::new((1152.0, 1000.0), RESULT_HALF);
}

/// Supplies one input frame per tick
pub trait InputSource {
    /// `race` is the state after the previous tick, when a race is running
    fn next_frame(&mut self, frame: u64, race: Option<&RaceSnapshot>) -> InputFrame;
}

/// Sidestep in progress for one lane
#[derive(Debug, Clone, Copy, Default)]
struct Dodge {
    frames: u32,
    right: bool,
}

/// Scripted driver for headless runs
///
/// Leaves the intro, clicks the player-count button, then floors it. After
/// every bump it steers to one side for a while, alternating sides.
#[derive(Debug, Clone)]
pub struct Autopilot {
    start_button: (f32, f32),
    click_frame: u64,
    dodges: HashMap<PlayerId, Dodge>,
}

impl Autopilot {
    /// Frames of steering once the stun from a bump wears off
    const DODGE_FRAMES: u32 = 30;

    pub fn new(start_button: (f32, f32), click_frame: u64) -> Self {
        Self {
            start_button,
            click_frame,
            dodges: HashMap::new(),
        }
    }

    fn drive(&mut self, race: &RaceSnapshot) -> KeySet {
        let mut held = KeySet::new();
        for lane in &race.lanes {
            let keys = lane.player.controls().bindings();
            held.press(keys.up);

            let dodge = self.dodges.entry(lane.player).or_default();
            if lane.car.stun > 0 && dodge.frames == 0 {
                dodge.frames = lane.car.stun + Self::DODGE_FRAMES;
                dodge.right = !dodge.right;
            }
            if dodge.frames > 0 {
                dodge.frames -= 1;
                if lane.car.stun == 0 {
                    held.press(if dodge.right { keys.right } else { keys.left });
                }
            }
        }
        held
    }
}

impl InputSource for Autopilot {
    fn next_frame(&mut self, frame: u64, race: Option<&RaceSnapshot>) -> InputFrame {
        if frame == 0 {
            return InputFrame::pressing([Key::Space]);
        }
        if frame == self.click_frame {
            return InputFrame::clicking(self.start_button);
        }
        match race {
            Some(race) if frame > self.click_frame => InputFrame {
                held: self.drive(race),
                ..Default::default()
            },
            _ => InputFrame::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wasd_ignores_arrows() {
        let held: KeySet = [Key::Up, Key::Right, Key::A].into_iter().collect();
        let steer = Controls::Wasd.read(&held);
        assert_eq!(
            steer,
            Steering {
                right: false,
                left: true,
                up: false,
                down: false
            }
        );
        assert_eq!(steer.x_axis(), -1.0);
        assert!(!steer.y_active());
    }

    #[test]
    fn both_reads_either_binding() {
        let held: KeySet = [Key::Up, Key::D].into_iter().collect();
        let steer = Controls::Both.read(&held);
        assert!(steer.up && steer.right);
        assert_eq!(steer.y_axis(), 1.0);
    }

    #[test]
    fn opposite_keys_cancel() {
        let held: KeySet = [Key::Left, Key::Right].into_iter().collect();
        let steer = Controls::Arrows.read(&held);
        assert_eq!(steer.x_axis(), 0.0);
        assert!(steer.x_active());
    }

    #[test]
    fn hotspot_needs_button_and_position() {
        let spot = buttons::RESTART;
        assert!(spot.contains((384.0, 1000.0)));
        assert!(spot.contains((544.0, 1080.0)));
        assert!(!spot.contains((545.0, 1000.0)));
        let hover = MouseState {
            position: (400.0, 990.0),
            left_down: false,
        };
        assert!(!spot.is_clicked(&hover));
        assert!(spot.is_clicked(&MouseState {
            left_down: true,
            ..hover
        }));
    }

    #[test]
    fn menu_buttons_do_not_overlap() {
        let all = [
            buttons::ONE_PLAYER,
            buttons::TWO_PLAYERS,
            buttons::QUIT,
            buttons::SHORT_GAME,
            buttons::MEDIUM_GAME,
            buttons::LONG_GAME,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert!(!a.contains(b.center), "{:?} covers {:?}", a, b);
            }
        }
    }

    #[test]
    fn autopilot_script() {
        let mut pilot = Autopilot::new((10.0, 20.0), 3);
        assert_eq!(pilot.next_frame(0, None).pressed, vec![Key::Space]);
        assert!(!pilot.next_frame(1, None).mouse.left_down);
        assert!(pilot.next_frame(3, None).mouse.left_down);
        assert!(pilot.next_frame(9, None).held.is_empty());
    }

    #[test]
    fn arrow_bindings() {
        let keys = Controls::Arrows.bindings();
        assert_eq!((keys.up, keys.right), (Key::Up, Key::Right));
        assert_eq!(Controls::Both.bindings().left, Key::A);
    }
}
