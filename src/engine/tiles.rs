//! Tiles - Procedural lane layouts
//!
//! A lane is `[Start, t_1 .. t_N, End]` where every interior tile is drawn
//! uniformly from plain road and the ten obstacle kinds.

use std::ops::Index;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::RaceError;

/// One segment of a lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    Start,
    Forward,
    /// Obstacle kind `1..=10`
    Obstacle(u8),
    End,
}

impl Tile {
    pub const START_CODE: u8 = 11;
    pub const END_CODE: u8 = 12;
    /// Number of distinct interior draws (`Forward` plus ten obstacles)
    pub const INTERIOR_KINDS: u8 = 11;
    pub const OBSTACLE_KINDS: u8 = 10;

    /// Decode the integer form (`0` forward, `1..=10` obstacles, `11`/`12` sentinels)
    pub fn from_code(code: u8) -> Result<Self, RaceError> {
        match code {
            0 => Ok(Tile::Forward),
            1..=10 => Ok(Tile::Obstacle(code)),
            Self::START_CODE => Ok(Tile::Start),
            Self::END_CODE => Ok(Tile::End),
            other => Err(RaceError::InvalidTileCode(other)),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Tile::Forward => 0,
            Tile::Obstacle(kind) => kind,
            Tile::Start => Self::START_CODE,
            Tile::End => Self::END_CODE,
        }
    }

    pub fn is_interior(self) -> bool {
        matches!(self, Tile::Forward | Tile::Obstacle(_))
    }
}

/// Immutable tile layout shared by every lane of a race
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSequence {
    tiles: Arc<[Tile]>,
}

impl TileSequence {
    /// Draw `length` interior tiles and wrap them in the Start/End sentinels
    pub fn generate<R: Rng + ?Sized>(length: usize, rng: &mut R) -> Self {
        let draws: Vec<u8> = (0..length)
            .map(|_| rng.gen_range(0..Tile::INTERIOR_KINDS))
            .collect();
        log::debug!("Generated lane of {} tiles", length);
        Self::wrap(draws.into_iter().map(|code| match code {
            0 => Tile::Forward,
            kind => Tile::Obstacle(kind),
        }))
    }

    /// Build from explicit interior draws (`0..=10`)
    pub fn from_draws(draws: &[u8]) -> Result<Self, RaceError> {
        let interior = draws
            .iter()
            .map(|&code| match Tile::from_code(code)? {
                tile if tile.is_interior() => Ok(tile),
                _ => Err(RaceError::MalformedSequence(format!(
                    "sentinel code {} among interior draws",
                    code
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::wrap(interior))
    }

    /// Validate a complete sequence including its sentinels
    pub fn from_tiles(tiles: Vec<Tile>) -> Result<Self, RaceError> {
        let (first, last) = match (tiles.first(), tiles.last()) {
            (Some(first), Some(last)) if tiles.len() >= 2 => (*first, *last),
            _ => {
                return Err(RaceError::MalformedSequence(
                    "needs at least the Start and End tiles".to_string(),
                ))
            }
        };
        if first != Tile::Start || last != Tile::End {
            return Err(RaceError::MalformedSequence(
                "must begin with Start and end with End".to_string(),
            ));
        }
        let interior = &tiles[1..tiles.len() - 1];
        if let Some(bad) = interior.iter().find(|tile| !tile.is_interior()) {
            return Err(RaceError::MalformedSequence(format!("{:?} inside the lane", bad)));
        }
        if let Some(Tile::Obstacle(kind)) = interior
            .iter()
            .find(|tile| matches!(tile, Tile::Obstacle(k) if !(1..=Tile::OBSTACLE_KINDS).contains(k)))
        {
            return Err(RaceError::InvalidTileCode(*kind));
        }
        Ok(Self { tiles: tiles.into() })
    }

    fn wrap(interior: impl IntoIterator<Item = Tile>) -> Self {
        let tiles: Vec<Tile> = std::iter::once(Tile::Start)
            .chain(interior)
            .chain(std::iter::once(Tile::End))
            .collect();
        Self { tiles: tiles.into() }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Never true: a sequence always holds its two sentinels
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Number of interior tiles
    pub fn lane_length(&self) -> usize {
        self.tiles.len() - 2
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn codes(&self) -> Vec<u8> {
        self.tiles.iter().map(|tile| tile.code()).collect()
    }
}

impl Index<usize> for TileSequence {
    type Output = Tile;

    fn index(&self, index: usize) -> &Tile {
        &self.tiles[index]
    }
}
