//! One play session: the maze, the player, the story so far, and the RNG
//! that drives generation and mutation.

use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::SessionError;
use crate::grid::{Dir, Grid, GridDims, Pos, Tile, START};
use crate::maze;
use crate::narrative::{fragment_at, Choice, Ending, Fragment, NarrativeState, Resolution};

/// Longest simulated step per frame, in seconds.
pub const MAX_FRAME_DT: f32 = 0.05;
/// Player speed in cells per second.
pub const PLAYER_SPEED: f32 = 140.0 / 32.0;
const DIAGONAL_SCALE: f32 = 0.707;

/// Continuous player position in cell units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Player {
    pub x: f32,
    pub y: f32,
}

impl Player {
    fn spawn() -> Self {
        Self {
            x: START.x as f32 + 0.5,
            y: START.y as f32 + 0.5,
        }
    }

    /// The cell the player occupies, `None` if somehow off the map.
    pub fn cell(&self) -> Option<Pos> {
        if self.x < 0.0 || self.y < 0.0 {
            return None;
        }
        Some(Pos::new(self.x.floor() as usize, self.y.floor() as usize))
    }
}

/// Requested movement direction for one frame. Each axis is -1, 0 or 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Heading {
    pub dx: i8,
    pub dy: i8,
}

impl Heading {
    pub const STILL: Heading = Heading { dx: 0, dy: 0 };

    pub fn new(dx: i8, dy: i8) -> Self {
        Self {
            dx: dx.signum(),
            dy: dy.signum(),
        }
    }

    pub fn is_still(self) -> bool {
        self == Heading::STILL
    }
}

impl From<Dir> for Heading {
    fn from(dir: Dir) -> Self {
        let (dx, dy) = dir.delta();
        Heading::new(dx as i8, dy as i8)
    }
}

/// A fragment waiting on the player's choice. Frames do not advance until
/// it is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDecision {
    pub cell: Pos,
    pub fragment: Fragment,
}

impl PendingDecision {
    pub fn text(&self) -> &'static str {
        self.fragment.text()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    NothingHere,
    AlreadyResolved,
    Decision(PendingDecision),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub moved: bool,
    /// Set on the frame the player steps onto an unresolved node.
    pub struck_fragment: Option<Pos>,
    pub ending: Option<Ending>,
}

/// Everything that is rebuilt from scratch when the player starts over.
#[derive(Debug, Clone)]
struct Round {
    grid: Grid,
    player: Player,
    narrative: NarrativeState,
    paused: bool,
    pending: Option<PendingDecision>,
    last_cell: Option<Pos>,
}

impl Round {
    fn new(rng: &mut ChaCha8Rng, dims: GridDims) -> Self {
        let player = Player::spawn();
        Self {
            grid: maze::generate(rng, dims),
            player,
            narrative: NarrativeState::default(),
            paused: false,
            pending: None,
            last_cell: player.cell(),
        }
    }

    fn try_move(&mut self, nx: f32, ny: f32) -> bool {
        if self
            .grid
            .can_occupy(nx.floor() as isize, ny.floor() as isize)
        {
            self.player.x = nx;
            self.player.y = ny;
            true
        } else {
            false
        }
    }
}

pub struct GameSession {
    rng: ChaCha8Rng,
    seed: u64,
    dims: GridDims,
    round: Round,
}

impl GameSession {
    pub fn new(dims: GridDims, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let round = Round::new(&mut rng, dims);
        info!(
            "new session {}x{} with seed {seed}",
            dims.cols(),
            dims.rows()
        );
        Self {
            rng,
            seed,
            dims,
            round,
        }
    }

    pub fn from_entropy(dims: GridDims) -> Self {
        Self::new(dims, rand::random())
    }

    /// Start a new round in a freshly generated maze. The RNG carries on, so
    /// replays differ from the first round.
    pub fn reset(&mut self) {
        self.round = Round::new(&mut self.rng, self.dims);
        debug!("session reset");
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn grid(&self) -> &Grid {
        &self.round.grid
    }

    pub fn player(&self) -> Player {
        self.round.player
    }

    pub fn player_cell(&self) -> Option<Pos> {
        self.round.player.cell()
    }

    pub fn narrative(&self) -> &NarrativeState {
        &self.round.narrative
    }

    pub fn pending(&self) -> Option<PendingDecision> {
        self.round.pending
    }

    pub fn is_paused(&self) -> bool {
        self.round.paused
    }

    pub fn ending(&self) -> Option<Ending> {
        self.round.narrative.ending
    }

    /// Place the player directly. Used by drivers that integrate movement
    /// themselves. Returns `false` and leaves the player alone if the target
    /// cell cannot be occupied.
    pub fn set_player(&mut self, x: f32, y: f32) -> bool {
        if x < 0.0 || y < 0.0 {
            return false;
        }
        if !self.round.grid.can_occupy(x.floor() as isize, y.floor() as isize) {
            return false;
        }
        self.round.player = Player { x, y };
        true
    }

    /// Advance one frame: move, detect fragment strikes, check endings.
    pub fn update(&mut self, dt: f32, heading: Heading) -> FrameReport {
        let mut report = FrameReport::default();
        if self.round.paused || self.round.narrative.ending.is_some() {
            return report;
        }
        let dt = dt.clamp(0.0, MAX_FRAME_DT);

        if !heading.is_still() {
            let mut dx = f32::from(heading.dx);
            let mut dy = f32::from(heading.dy);
            if dx != 0.0 && dy != 0.0 {
                dx *= DIAGONAL_SCALE;
                dy *= DIAGONAL_SCALE;
            }
            let step = PLAYER_SPEED * dt;
            let Player { x, y } = self.round.player;
            let moved_x = self.round.try_move(x + dx * step, y);
            let moved_y = self.round.try_move(self.round.player.x, y + dy * step);
            report.moved = moved_x || moved_y;
        }

        let cell = self.round.player.cell();
        if cell != self.round.last_cell {
            self.round.last_cell = cell;
            if let Some(pos) = cell {
                if self.round.grid.tile(pos) == Some(Tile::FragmentNode)
                    && !self.round.narrative.is_visited(pos)
                {
                    report.struck_fragment = Some(pos);
                }
            }
        }

        report.ending = self.check_ending();
        report
    }

    /// The player asks to interact with whatever they are standing on.
    pub fn interact(&mut self) -> Result<Interaction, SessionError> {
        if self.round.narrative.ending.is_some() {
            return Err(SessionError::RoundOver);
        }
        if let Some(pending) = self.round.pending {
            return Ok(Interaction::Decision(pending));
        }
        let Some(cell) = self.round.player.cell() else {
            return Ok(Interaction::NothingHere);
        };
        if self.round.grid.tile(cell) != Some(Tile::FragmentNode) {
            return Ok(Interaction::NothingHere);
        }
        if self.round.narrative.is_visited(cell) {
            return Ok(Interaction::AlreadyResolved);
        }

        let pending = PendingDecision {
            cell,
            fragment: fragment_at(cell),
        };
        self.round.pending = Some(pending);
        self.round.paused = true;
        debug!("fragment {} awaiting a decision at {cell}", pending.fragment.id());
        Ok(Interaction::Decision(pending))
    }

    /// Apply the player's choice to the pending fragment and resume play.
    pub fn decide(&mut self, choice: Choice) -> Result<Resolution, SessionError> {
        let pending = self
            .round
            .pending
            .take()
            .ok_or(SessionError::NoPendingDecision)?;
        let player = self.round.player.cell().unwrap_or(pending.cell);
        let resolution = self.round.narrative.resolve(
            &mut self.round.grid,
            pending.cell,
            choice,
            player,
            &mut self.rng,
        );
        self.round.paused = false;
        self.check_ending();
        Ok(resolution)
    }

    fn check_ending(&mut self) -> Option<Ending> {
        let cell = self.round.player.cell()?;
        let ending = self
            .round
            .narrative
            .check_ending(&self.round.grid, cell);
        if ending.is_some() {
            self.round.paused = true;
            self.round.pending = None;
        }
        ending
    }
}
