//! Simulation - Top-level game state machine and frame loop
//!
//! States are a tagged enum. Handlers return a [`Transition`] which is
//! parked in `pending` and applied at the start of the next tick, so a
//! state never replaces itself mid-frame.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::{GameConfig, SessionTimings, SELECTABLE_LENGTHS};
use crate::engine::collision::{CollisionModel, MaskSet};
use crate::engine::race::{HoldTimer, RaceConfig, RaceSession, RaceSnapshot, SessionRequest};
use crate::error::RaceError;
use crate::input::{buttons, InputFrame, Key};

/// Title screen with a pulsing background
#[derive(Debug, Clone)]
pub struct IntroScreen {
    brightness: f32,
    direction: f32,
}

impl IntroScreen {
    const MIN_BRIGHTNESS: f32 = 191.0;
    const MAX_BRIGHTNESS: f32 = 255.0;

    pub fn new() -> Self {
        Self {
            brightness: Self::MAX_BRIGHTNESS,
            direction: -1.0,
        }
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    /// Ping-pong the background; any key press opens the menu
    pub fn update(&mut self, input: &InputFrame, delta_ms: f32) -> Option<Transition> {
        self.brightness += self.direction * delta_ms / 60.0;
        if !(Self::MIN_BRIGHTNESS < self.brightness && self.brightness < Self::MAX_BRIGHTNESS) {
            self.brightness = self.brightness.clamp(Self::MIN_BRIGHTNESS, Self::MAX_BRIGHTNESS);
            self.direction = -self.direction;
        }

        (!input.pressed.is_empty()).then_some(Transition::ToMenu)
    }
}

impl Default for IntroScreen {
    fn default() -> Self {
        Self::new()
    }
}

/// Player-count and lane-length selection
#[derive(Debug, Clone)]
pub struct MenuScreen {
    lane_length: usize,
    quit_hold: HoldTimer,
}

impl MenuScreen {
    pub fn new(lane_length: usize) -> Self {
        Self {
            lane_length,
            quit_hold: HoldTimer::default(),
        }
    }

    pub fn lane_length(&self) -> usize {
        self.lane_length
    }

    pub fn quit_hold(&self) -> HoldTimer {
        self.quit_hold
    }

    pub fn update(&mut self, input: &InputFrame, timings: &SessionTimings) -> Option<Transition> {
        for key in &input.pressed {
            match key {
                Key::Num1 => self.lane_length = 8,
                Key::Num2 => self.lane_length = 16,
                Key::Num3 => self.lane_length = 32,
                Key::Num0 => self.lane_length = 2,
                _ => {}
            }
        }

        let mouse = &input.mouse;
        self.quit_hold
            .update(input.held.is_held(Key::Escape) || buttons::QUIT.is_clicked(mouse));
        if self.quit_hold.reached(timings.menu_quit_hold) {
            return Some(Transition::Quit);
        }

        let players = if buttons::ONE_PLAYER.is_clicked(mouse) {
            Some(1)
        } else if buttons::TWO_PLAYERS.is_clicked(mouse) {
            Some(2)
        } else {
            None
        };

        if buttons::SHORT_GAME.is_clicked(mouse) {
            self.lane_length = 8;
        } else if buttons::MEDIUM_GAME.is_clicked(mouse) {
            self.lane_length = 16;
        } else if buttons::LONG_GAME.is_clicked(mouse) {
            self.lane_length = 32;
        }

        players.map(|players| {
            Transition::StartRace(RaceConfig {
                players,
                lane_length: self.lane_length,
            })
        })
    }
}

/// Active state
#[derive(Debug)]
pub enum GameState {
    Intro(IntroScreen),
    Menu(MenuScreen),
    Racing(Box<RaceSession>),
}

/// State name for stats and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateKind {
    Intro,
    Menu,
    Racing,
    Quitting,
}

/// Requested state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    ToMenu,
    StartRace(RaceConfig),
    /// New race, same players, fresh lane
    RestartRace,
    Quit,
}

/// Frame loop statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameStats {
    pub frame_rate: u32,
    pub frames: u64,
    pub avg_tick_time_ms: f32,
    pub state: StateKind,
}

/// Main game state machine
pub struct GameStateMachine {
    config: GameConfig,
    state: GameState,
    /// Applied at the start of the next tick
    pending: Option<Transition>,
    /// Lane length carried from the menu into each race
    lane_length: usize,
    running: bool,
    collision: Box<dyn CollisionModel>,
    rng: StdRng,
    frame: u64,
    /// Recent tick durations for averaging
    tick_times: Vec<f32>,
}

impl GameStateMachine {
    /// Machine in the intro state with procedural collision masks
    pub fn new(config: GameConfig) -> Self {
        let masks = MaskSet::procedural(&config.geometry);
        Self::with_collision(config, Box::new(masks))
    }

    pub fn with_collision(config: GameConfig, collision: Box<dyn CollisionModel>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            lane_length: config.default_lane_length,
            config,
            state: GameState::Intro(IntroScreen::new()),
            pending: None,
            running: true,
            collision,
            rng,
            frame: 0,
            tick_times: Vec::with_capacity(60),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_kind(&self) -> StateKind {
        if !self.running {
            return StateKind::Quitting;
        }
        match self.state {
            GameState::Intro(_) => StateKind::Intro,
            GameState::Menu(_) => StateKind::Menu,
            GameState::Racing(_) => StateKind::Racing,
        }
    }

    pub fn pending(&self) -> Option<Transition> {
        self.pending
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Lane length the next race will use
    pub fn lane_length(&self) -> usize {
        match &self.state {
            GameState::Menu(menu) => menu.lane_length(),
            _ => self.lane_length,
        }
    }

    pub fn set_lane_length(&mut self, lane_length: usize) -> Result<(), RaceError> {
        if !SELECTABLE_LENGTHS.contains(&lane_length) {
            return Err(RaceError::InvalidLaneLength(lane_length));
        }
        self.lane_length = lane_length;
        if let GameState::Menu(menu) = &mut self.state {
            menu.lane_length = lane_length;
        }
        Ok(())
    }

    pub fn race(&self) -> Option<&RaceSession> {
        match &self.state {
            GameState::Racing(race) => Some(race),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> Option<RaceSnapshot> {
        self.race().map(RaceSession::snapshot)
    }

    /// Queue a transition for the next tick
    pub fn request(&mut self, transition: Transition) {
        self.pending = Some(transition);
    }

    fn new_race(&mut self, config: RaceConfig) -> GameState {
        let rng = StdRng::seed_from_u64(self.rng.gen());
        match RaceSession::new(config, &self.config, rng) {
            Ok(race) => GameState::Racing(Box::new(race)),
            Err(e) => {
                log::error!("Could not start race: {}", e);
                GameState::Menu(MenuScreen::new(self.lane_length))
            }
        }
    }

    fn apply(&mut self, transition: Transition) {
        let next = match transition {
            Transition::ToMenu => GameState::Menu(MenuScreen::new(self.lane_length)),
            Transition::StartRace(config) => {
                self.lane_length = config.lane_length;
                self.new_race(config)
            }
            Transition::RestartRace => match &mut self.state {
                GameState::Racing(race) => match race.restart_new_map() {
                    Ok(fresh) => GameState::Racing(Box::new(fresh)),
                    Err(e) => {
                        log::error!("Could not restart race: {}", e);
                        GameState::Menu(MenuScreen::new(self.lane_length))
                    }
                },
                _ => return,
            },
            Transition::Quit => {
                self.running = false;
                return;
            }
        };
        self.state = next;
        log::info!("Entered {:?} state", self.state_kind());
    }

    /// Advance one frame
    ///
    /// Returns whether the game is still running.
    pub fn tick(&mut self, input: &InputFrame, delta_ms: f32) -> bool {
        if !self.running {
            return false;
        }
        let tick_start = Instant::now();

        if let Some(transition) = self.pending.take() {
            self.apply(transition);
        }

        if input.close_requested {
            log::info!("Close requested");
            self.running = false;
            return false;
        }

        let timings = &self.config.timings;
        let transition = match &mut self.state {
            GameState::Intro(intro) => intro.update(input, delta_ms),
            GameState::Menu(menu) => menu.update(input, timings),
            GameState::Racing(race) => {
                race.update(input, &*self.collision).map(|request| match request {
                    SessionRequest::Menu => Transition::ToMenu,
                    SessionRequest::Restart => Transition::RestartRace,
                })
            }
        };

        match transition {
            Some(Transition::Quit) => {
                log::info!("Quit gesture held, shutting down");
                self.running = false;
            }
            Some(other) => self.pending = Some(other),
            None => {}
        }

        self.frame += 1;
        self.tick_times.push(tick_start.elapsed().as_secs_f32() * 1000.0);
        if self.tick_times.len() > 60 {
            self.tick_times.remove(0);
        }

        self.running
    }

    pub fn stats(&self) -> FrameStats {
        let avg_tick_time = if self.tick_times.is_empty() {
            0.0
        } else {
            self.tick_times.iter().sum::<f32>() / self.tick_times.len() as f32
        };

        FrameStats {
            frame_rate: self.config.frame_rate,
            frames: self.frame,
            avg_tick_time_ms: avg_tick_time,
            state: self.state_kind(),
        }
    }
}

/// Fixed-rate frame pacing
pub struct FrameClock {
    frame_duration: Duration,
    last_tick: Instant,
}

impl FrameClock {
    pub fn new(frame_rate: u32) -> Self {
        Self {
            frame_duration: Duration::from_secs(1) / frame_rate.max(1),
            last_tick: Instant::now(),
        }
    }

    /// Sleep out the rest of the frame; returns milliseconds since the previous tick
    pub fn tick(&mut self) -> f32 {
        let elapsed = self.last_tick.elapsed();
        if elapsed < self.frame_duration {
            std::thread::sleep(self.frame_duration - elapsed);
        }
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick);
        self.last_tick = now;
        delta.as_secs_f32() * 1000.0
    }

    pub fn frame_ms(&self) -> f32 {
        self.frame_duration.as_secs_f32() * 1000.0
    }
}
