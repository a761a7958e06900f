//! A maze that rearranges itself around the memories the player refuses to
//! face.
//!
//! The library holds the game core: maze generation ([`maze`]), breadth-first
//! queries ([`path`]), connectivity-preserving mutation ([`mutate`]), the
//! fragment catalog and ending rules ([`narrative`]) and the session that ties
//! them together ([`session`]). Rendering, input and sound live in the
//! `memory-maze` binary.

pub mod audio;
pub mod config;
pub mod error;
pub mod grid;
pub mod maze;
pub mod mutate;
pub mod narrative;
pub mod path;
pub mod session;

pub use error::SessionError;
pub use grid::{Dir, Grid, GridDims, Pos, Tile};
pub use narrative::{Choice, Ending, Fragment, NarrativeState, Outcome, Resolution};
pub use session::{FrameReport, GameSession, Heading, Interaction, PendingDecision, Player};
