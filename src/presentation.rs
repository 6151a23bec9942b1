//! Presentation - What to draw, derived from engine state
//!
//! Image loading and blitting belong to the front end, reached through
//! [`Renderer`]. Every visual quantity here (alphas, tints, rotation) is a
//! pure function of simulation state, recomputed each frame.

use crate::config::{Geometry, SessionTimings};
use crate::engine::car::CarController;
use crate::engine::lane::{Lane, PlayerId};
use crate::engine::race::RaceSession;
use crate::engine::simulation::{GameState, GameStateMachine, IntroScreen, MenuScreen};
use crate::engine::tiles::Tile;
use crate::input::{buttons, Hotspot};

/// Images the engine asks for by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sprite {
    Header,
    PressAny,
    GameLength,
    Quitting,
    Restarting,
    Ready,
    Set,
    Go,
    RoadStart,
    RoadEnd,
    RoadForward,
    FinishLine,
    Obstacle(u8),
    Car,
    DoNotTurnBack,
    /// Finisher screen for player index 0, 1 or 2
    Finisher(usize),
    OnePlayerButton,
    TwoPlayersButton,
    QuitButton,
    ShortGameButton,
    MediumGameButton,
    LongGameButton,
    RestartButton,
    MenuButton,
}

/// HSL shift applied to an image
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tint {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl Tint {
    pub fn hue(hue: f32) -> Self {
        Self {
            hue,
            ..Default::default()
        }
    }

    pub fn lightness(lightness: f32) -> Self {
        Self {
            lightness,
            ..Default::default()
        }
    }
}

/// Pixel bounds of an image
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub width: f32,
    pub height: f32,
}

/// Drawing backend supplied by the front end
pub trait Renderer {
    type Image: Clone;

    fn image(&mut self, sprite: Sprite) -> Self::Image;
    fn fill(&mut self, gray: u8);
    /// Draw with the image's top-left at `position`
    fn blit(&mut self, image: &Self::Image, position: (f32, f32), alpha: u8);
    fn rotate(&mut self, image: &Self::Image, degrees: f32) -> Self::Image;
    fn tint(&mut self, image: &Self::Image, tint: Tint) -> Self::Image;
    fn bounds(&self, image: &Self::Image) -> Rect;
}

/// Countdown caption
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banner {
    Ready,
    Set,
    Go,
}

/// Caption for the current countdown tick; nothing before Ready or once racing
pub fn countdown_banner(starting_ticks: u32, timings: &SessionTimings) -> Option<Banner> {
    match starting_ticks {
        0 => None,
        t if t >= timings.ready_tick => None,
        t if t >= timings.set_tick => Some(Banner::Ready),
        t if t >= timings.go_tick => Some(Banner::Set),
        _ => Some(Banner::Go),
    }
}

/// Opacity of a hold-gesture overlay, fully opaque after `fade` frames
pub fn overlay_alpha(ticks: u32, fade: u32) -> u8 {
    (ticks as f32 / fade.max(1) as f32 * 255.0).min(255.0) as u8
}

/// Restart button hue for the winning player
pub fn restart_hue(player: PlayerId) -> f32 {
    -120.0 * player.index() as f32
}

/// Car body hue per lane
pub fn car_hue(player: PlayerId) -> f32 {
    -102.0 * player.index() as f32
}

/// Car rotation: recoil spin plus a lean from the current deviation
pub fn car_rotation(car: &CarController) -> f32 {
    car.bump_anim_len as f32 * 9.0 * car.bump_anim_dir as f32 - car.dev_x * 8.0 * car.dev_y / 6.0
}

/// Darken the length button matching the current selection
pub fn length_button_lightness(selected: usize, button_length: usize) -> f32 {
    if selected == button_length {
        -0.4
    } else {
        0.0
    }
}

/// Screen position of a lane surface
pub fn lane_origin(players: u8, lane_index: usize, geo: &Geometry) -> (f32, f32) {
    let quarter = (geo.screen_width / 4) as f32;
    match players {
        1 => (quarter + 8.0, 0.0),
        _ => (lane_index as f32 * quarter * 2.0 + 8.0, 0.0),
    }
}

fn centered<R: Renderer>(r: &mut R, image: &R::Image, center_x: f32, y: f32, alpha: u8) {
    let bounds = r.bounds(image);
    r.blit(image, (center_x - bounds.width / 2.0, y), alpha);
}

fn button<R: Renderer>(r: &mut R, sprite: Sprite, spot: Hotspot, tint: Tint) {
    let plain = r.image(sprite);
    let image = r.tint(&plain, tint);
    let bounds = r.bounds(&image);
    r.blit(
        &image,
        (spot.center.0 - bounds.width / 2.0, spot.center.1 - bounds.height / 2.0),
        255,
    );
}

/// Issue the draw calls for the current frame
pub fn draw_frame<R: Renderer>(game: &GameStateMachine, r: &mut R) {
    let geo = &game.config().geometry;
    let timings = &game.config().timings;
    match game.state() {
        GameState::Intro(intro) => draw_intro(intro, geo, r),
        GameState::Menu(menu) => draw_menu(menu, geo, timings, r),
        GameState::Racing(race) => draw_race(race, geo, r),
    }
}

fn draw_intro<R: Renderer>(intro: &IntroScreen, geo: &Geometry, r: &mut R) {
    let mid = (geo.screen_width / 2) as f32;
    r.fill(intro.brightness() as u8);
    let header = r.image(Sprite::Header);
    centered(r, &header, mid, 50.0, 255);
    let press_any = r.image(Sprite::PressAny);
    centered(r, &press_any, mid, 900.0, 255);
}

fn draw_menu<R: Renderer>(menu: &MenuScreen, geo: &Geometry, timings: &SessionTimings, r: &mut R) {
    let mid = (geo.screen_width / 2) as f32;
    let height = geo.screen_height as f32;
    r.fill(191);

    let caption = r.image(Sprite::GameLength);
    centered(r, &caption, mid, height / 2.0 + height / 4.0, 255);
    let quitting = r.image(Sprite::Quitting);
    let alpha = overlay_alpha(menu.quit_hold().ticks(), timings.menu_quit_fade);
    centered(r, &quitting, mid, 8.0, alpha);

    button(r, Sprite::OnePlayerButton, buttons::ONE_PLAYER, Tint::default());
    button(r, Sprite::TwoPlayersButton, buttons::TWO_PLAYERS, Tint::default());
    button(r, Sprite::QuitButton, buttons::QUIT, Tint::default());

    let selected = menu.lane_length();
    for (sprite, spot, length) in [
        (Sprite::ShortGameButton, buttons::SHORT_GAME, 8),
        (Sprite::MediumGameButton, buttons::MEDIUM_GAME, 16),
        (Sprite::LongGameButton, buttons::LONG_GAME, 32),
    ] {
        button(r, sprite, spot, Tint::lightness(length_button_lightness(selected, length)));
    }
}

fn draw_lane<R: Renderer>(lane: &Lane, origin: (f32, f32), r: &mut R) {
    let geo = lane.geometry();
    let window = lane.window();
    let road_x = origin.0 + geo.road_x();
    let offset = window.road_offset();

    if window.step() > 4 {
        let sign = r.image(Sprite::DoNotTurnBack);
        let y = geo.screen_height as f32 - geo.tile_height as f32 / 2.0 + offset;
        r.blit(&sign, (road_x, origin.1 + y), 255);
    }

    for (index, tile) in window.visible_indexed() {
        let pos = (road_x, origin.1 + geo.tile_y(index, offset));
        let base = match tile {
            Tile::Start => Sprite::RoadStart,
            Tile::End => Sprite::RoadEnd,
            Tile::Forward | Tile::Obstacle(_) => Sprite::RoadForward,
        };
        let image = r.image(base);
        r.blit(&image, pos, 255);

        match tile {
            Tile::Start | Tile::End => {
                let line = r.image(Sprite::FinishLine);
                r.blit(&line, pos, 255);
            }
            Tile::Obstacle(kind) => {
                let block = r.image(Sprite::Obstacle(kind));
                r.blit(&block, pos, 255);
            }
            Tile::Forward => {}
        }
    }

    let car = lane.car();
    let body = r.image(Sprite::Car);
    let painted = r.tint(&body, Tint::hue(car_hue(lane.player())));
    let plain_bounds = r.bounds(&painted);
    let rotated = r.rotate(&painted, car_rotation(car));
    let bounds = r.bounds(&rotated);
    let center = (
        car.left + plain_bounds.width / 2.0,
        car.top + plain_bounds.height / 2.0,
    );
    r.blit(
        &rotated,
        (
            origin.0 + center.0 - bounds.width / 2.0,
            origin.1 + center.1 - bounds.height / 2.0,
        ),
        255,
    );
}

fn draw_race<R: Renderer>(race: &RaceSession, geo: &Geometry, r: &mut R) {
    let mid = (geo.screen_width / 2) as f32;
    let height = geo.screen_height as f32;
    let timings = race.timings();
    r.fill(64);

    for (index, lane) in race.lanes().iter().enumerate() {
        draw_lane(lane, lane_origin(race.config().players, index, geo), r);
    }

    if let Some(banner) = countdown_banner(race.starting_ticks(), timings) {
        let image = r.image(match banner {
            Banner::Ready => Sprite::Ready,
            Banner::Set => Sprite::Set,
            Banner::Go => Sprite::Go,
        });
        let bounds = r.bounds(&image);
        centered(r, &image, mid, height / 2.0 - bounds.height / 2.0, 255);
    }

    if let Some(winner) = race.winner() {
        let screen = r.image(Sprite::Finisher(winner.index()));
        centered(r, &screen, mid, 300.0, 255);
        button(r, Sprite::RestartButton, buttons::RESTART, Tint::hue(restart_hue(winner)));
        button(r, Sprite::MenuButton, buttons::MENU, Tint::default());
    }

    let quitting = r.image(Sprite::Quitting);
    let quit_alpha = overlay_alpha(race.quit_hold().ticks(), timings.race_quit_fade);
    centered(r, &quitting, mid, 8.0, quit_alpha);
    let below = 8.0 + r.bounds(&quitting).height + 16.0;
    let restarting = r.image(Sprite::Restarting);
    let restart_alpha = overlay_alpha(race.restart_hold().ticks(), timings.restart_fade);
    centered(r, &restarting, mid, below, restart_alpha);
}
