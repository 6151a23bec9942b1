//! Scroll - The visible slice of a lane
//!
//! Only `window_len` tiles are ever on screen, so drawing and collision
//! work per frame stays constant whatever the lane length.

use crate::config::ScrollTuning;
use crate::engine::tiles::{Tile, TileSequence};

/// What a call to [`ScrollWindow::advance_by`] did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollOutcome {
    /// The window moved one tile forward
    pub shifted: bool,
    /// The offset hit its lower bound; the car must be nudged forward
    pub clamped: bool,
}

/// Window over a [`TileSequence`] plus the sub-tile scroll offset
#[derive(Debug, Clone)]
pub struct ScrollWindow {
    sequence: TileSequence,
    tuning: ScrollTuning,
    /// One past the last visible tile
    step: usize,
    /// Pixels scrolled inside the current window
    road_offset: f32,
}

impl ScrollWindow {
    /// Window over the first `window_len` tiles
    pub fn initial(sequence: TileSequence, tuning: ScrollTuning) -> Self {
        Self {
            step: tuning.window_len,
            sequence,
            tuning,
            road_offset: 0.0,
        }
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn road_offset(&self) -> f32 {
        self.road_offset
    }

    pub fn sequence(&self) -> &TileSequence {
        &self.sequence
    }

    /// `sequence[step - window_len .. step]`, truncated at the tail
    pub fn visible(&self) -> &[Tile] {
        let tiles = self.sequence.tiles();
        let start = self.step.saturating_sub(self.tuning.window_len);
        let end = self.step.min(tiles.len());
        &tiles[start.min(end)..end]
    }

    /// Visible tiles with their window index, nearest first
    pub fn visible_indexed(&self) -> impl Iterator<Item = (usize, Tile)> + '_ {
        self.visible().iter().copied().enumerate()
    }

    /// Window index of the End tile, once it has scrolled into view
    pub fn end_index(&self) -> Option<usize> {
        self.visible().iter().position(|tile| *tile == Tile::End)
    }

    /// Whether another shift would still keep the End tile in view
    fn can_shift(&self) -> bool {
        self.step < self.sequence.len() - 1 + self.tuning.window_len
    }

    /// Move the window one tile forward
    ///
    /// Once the window reaches the tail it shrinks from the front, and it
    /// stops moving when only the End tile is left.
    pub fn shift(&mut self) {
        if !self.can_shift() {
            return;
        }
        self.step += 1;
        log::trace!("Scroll window shifted to step {}", self.step);
    }

    /// Scroll by `delta` pixels, shifting or clamping at the thresholds
    pub fn advance_by(&mut self, delta: f32) -> ScrollOutcome {
        let mut outcome = ScrollOutcome::default();
        self.road_offset += delta;

        if self.road_offset < self.tuning.min_offset {
            self.road_offset = self.tuning.min_offset;
            outcome.clamped = true;
        }
        if self.road_offset > self.tuning.shift_threshold {
            self.shift();
            self.road_offset = self.tuning.carry_over;
            outcome.shifted = true;
        }

        outcome
    }
}
