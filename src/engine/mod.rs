//! Race Engine Module
//!
//! Fixed-timestep simulation of a one- or two-lane race: lane generation,
//! scrolling, pixel-mask collisions, car motion and the game state machine.

pub mod car;
pub mod collision;
pub mod lane;
pub mod race;
pub mod scroll;
pub mod simulation;
pub mod tiles;

pub use car::{Bump, CarController};
pub use collision::{CollisionModel, Mask, MaskSet, TileMask};
pub use lane::{Lane, LaneContext, LaneReport, PlayerId};
pub use race::{RaceConfig, RaceSession, RaceSnapshot, RaceStatus};
pub use scroll::ScrollWindow;
pub use simulation::{FrameClock, GameState, GameStateMachine, StateKind, Transition};
pub use tiles::{Tile, TileSequence};
