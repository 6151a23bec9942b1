//! Collision - Pixel-mask overlap tests
//!
//! The race engine only consumes [`CollisionModel`]. [`MaskSet`] is the
//! bitmap implementation; a front end that loads sprite alpha can build one
//! from its images, and headless runs use [`MaskSet::procedural`].

use crate::config::Geometry;
use crate::engine::tiles::Tile;

/// Position of the car mask's top-left corner relative to a tile mask's
pub type Offset = (i32, i32);

/// Which tile mask a test runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileMask {
    /// Curbs of the plain road tile
    Forward,
    /// Obstacle kind `1..=10`
    Obstacle(u8),
    /// Finish line on the End tile
    Finish,
}

/// Car-versus-tile overlap capability injected into each lane
pub trait CollisionModel {
    fn overlaps(&self, tile: TileMask, offset: Offset) -> bool;
}

impl<F> CollisionModel for F
where
    F: Fn(TileMask, Offset) -> bool,
{
    fn overlaps(&self, tile: TileMask, offset: Offset) -> bool {
        self(tile, offset)
    }
}

/// 1-bit pixel mask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: i32,
    height: i32,
    bits: Vec<bool>,
}

impl Mask {
    /// Empty mask
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            bits: vec![false; (width * height) as usize],
        }
    }

    /// Fully set mask
    pub fn filled(width: i32, height: i32) -> Self {
        let mut mask = Self::new(width, height);
        mask.bits.fill(true);
        mask
    }

    /// Build from rows of `#` (set) and any other char (clear)
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as i32;
        let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0) as i32;
        let mut mask = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '#' {
                    mask.set(x as i32, y as i32, true);
                }
            }
        }
        mask
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        (0..self.width).contains(&x) && (0..self.height).contains(&y)
    }

    pub fn get(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y) && self.bits[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: i32, y: i32, value: bool) {
        if self.in_bounds(x, y) {
            self.bits[(y * self.width + x) as usize] = value;
        }
    }

    /// Set every pixel of a rectangle, clipped to the mask
    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32) {
        for py in y.max(0)..(y + height).min(self.height) {
            for px in x.max(0)..(x + width).min(self.width) {
                self.bits[(py * self.width + px) as usize] = true;
            }
        }
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&bit| bit).count()
    }

    /// First pixel (in this mask's coordinates) set in both masks, with
    /// `other` placed at `offset`
    pub fn overlap(&self, other: &Mask, offset: Offset) -> Option<(i32, i32)> {
        let (ox, oy) = offset;
        let x_range = ox.max(0)..(ox + other.width).min(self.width);
        for y in oy.max(0)..(oy + other.height).min(self.height) {
            for x in x_range.clone() {
                if self.get(x, y) && other.get(x - ox, y - oy) {
                    return Some((x, y));
                }
            }
        }
        None
    }
}

/// Car mask plus one mask per tile kind
#[derive(Debug, Clone)]
pub struct MaskSet {
    car: Mask,
    forward: Mask,
    obstacles: Vec<Mask>,
    finish: Mask,
}

impl MaskSet {
    /// `obstacles[k - 1]` is the mask for obstacle kind `k`
    pub fn new(car: Mask, forward: Mask, obstacles: Vec<Mask>, finish: Mask) -> Self {
        Self {
            car,
            forward,
            obstacles,
            finish,
        }
    }

    /// Masks synthesized from the lane geometry
    ///
    /// Forward tiles have solid curbs on both sides, obstacles are blocks
    /// laid out across two rows, and the finish is a band across the middle
    /// of the End tile.
    pub fn procedural(geo: &Geometry) -> Self {
        let (tw, th) = (geo.tile_width, geo.tile_height);

        let mut forward = Mask::new(tw, th);
        forward.fill_rect(0, 0, geo.wall_width, th);
        forward.fill_rect(tw - geo.wall_width, 0, geo.wall_width, th);

        let road = tw - 2 * geo.wall_width;
        let block_w = road * 3 / 13;
        let block_h = th / 8;
        let stride = (road - block_w) / 4;
        let obstacles = (1..=Tile::OBSTACLE_KINDS as i32)
            .map(|kind| {
                let slot = (kind - 1) % 5;
                let row = (kind - 1) / 5;
                let mut mask = Mask::new(tw, th);
                mask.fill_rect(
                    geo.wall_width + slot * stride,
                    th / 4 + row * th * 3 / 8,
                    block_w,
                    block_h,
                );
                mask
            })
            .collect();

        let mut finish = Mask::new(tw, th);
        finish.fill_rect(0, th / 2 - th / 16, tw, th / 8);

        Self::new(Mask::filled(geo.car_width, geo.car_height), forward, obstacles, finish)
    }

    pub fn car(&self) -> &Mask {
        &self.car
    }

    pub fn tile(&self, tile: TileMask) -> Option<&Mask> {
        match tile {
            TileMask::Forward => Some(&self.forward),
            TileMask::Obstacle(kind) => self.obstacles.get(usize::from(kind).checked_sub(1)?),
            TileMask::Finish => Some(&self.finish),
        }
    }
}

impl CollisionModel for MaskSet {
    fn overlaps(&self, tile: TileMask, offset: Offset) -> bool {
        self.tile(tile)
            .map_or(false, |mask| mask.overlap(&self.car, offset).is_some())
    }
}
