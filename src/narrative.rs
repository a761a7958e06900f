//! Memory fragments, their effects on the maze, and how the story ends.

use std::collections::HashSet;

use log::info;
use rand::Rng;

use crate::grid::{Grid, Pos, Tile};
use crate::mutate::{self, MutationReport};

pub const TRUTH_FOR_TRUE_ENDING: u32 = 5;
pub const DOUBT_FOR_DARK_ENDING: u32 = 6;
pub const FACED_TO_UNLOCK_EXIT: u32 = 3;
const NEIGHBORHOOD_RADIUS: isize = 2;
const RANDOM_BATCH_SIZE: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ending {
    True,
    Dark,
    Escape,
}

impl Ending {
    pub fn title(self) -> &'static str {
        match self {
            Ending::True => "True Ending: The mind opens",
            Ending::Dark => "Dark Ending: The walls win",
            Ending::Escape => "Escape: You leave, but the root remains",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Face,
    Ignore,
}

/// What a fragment does to the world when resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Every wall in the 5x5 square around the trigger cell becomes floor.
    OpenNeighborhood,
    /// Up to 40 random walls anywhere in the maze become floor.
    OpenRandomBatch,
    UnlockExit,
    /// Run the maze mutator around the player.
    MutateMaze,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fragment {
    LeftHome,
    LostFriend,
    CheatedExam,
    SilentParent,
    StrangerWatch,
    ForgotPet,
}

impl Fragment {
    /// Catalog order. Node coordinates hash into this list.
    pub const ALL: [Fragment; 6] = [
        Fragment::LeftHome,
        Fragment::LostFriend,
        Fragment::CheatedExam,
        Fragment::SilentParent,
        Fragment::StrangerWatch,
        Fragment::ForgotPet,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Fragment::LeftHome => "left_home",
            Fragment::LostFriend => "lost_friend",
            Fragment::CheatedExam => "cheated_exam",
            Fragment::SilentParent => "silent_parent",
            Fragment::StrangerWatch => "stranger_watch",
            Fragment::ForgotPet => "forgot_pet",
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            Fragment::LeftHome => "You left home before saying goodbye...",
            Fragment::LostFriend => "A photo falls open, a laugh frozen...",
            Fragment::CheatedExam => "You once lied to get ahead...",
            Fragment::SilentParent => "You wanted to tell them but the words never formed.",
            Fragment::StrangerWatch => "A stranger watched and smiled...",
            Fragment::ForgotPet => "Your childhood pet waited...",
        }
    }

    pub fn on_faced(self) -> Effect {
        match self {
            Fragment::LeftHome | Fragment::CheatedExam | Fragment::ForgotPet => {
                Effect::OpenNeighborhood
            }
            Fragment::LostFriend | Fragment::SilentParent => Effect::OpenRandomBatch,
            Fragment::StrangerWatch => Effect::UnlockExit,
        }
    }

    pub fn on_ignored(self) -> Effect {
        Effect::MutateMaze
    }

    pub fn effect(self, choice: Choice) -> Effect {
        match choice {
            Choice::Face => self.on_faced(),
            Choice::Ignore => self.on_ignored(),
        }
    }

    pub fn hint(self, choice: Choice) -> &'static str {
        match (self, choice) {
            (Fragment::LeftHome, Choice::Face) => "You acknowledged the past.",
            (Fragment::LeftHome, Choice::Ignore) => "You pushed it away.",
            (Fragment::LostFriend, Choice::Face) => "You kept the promise.",
            (Fragment::LostFriend, Choice::Ignore) => "You refused to remember.",
            (Fragment::CheatedExam, Choice::Face) => "Facing it thins the fog.",
            (Fragment::CheatedExam, Choice::Ignore) => "Denial breeds labyrinthine doubt.",
            (Fragment::SilentParent, Choice::Face) => "A corridor straightens under your feet.",
            (Fragment::SilentParent, Choice::Ignore) => "You close your mouth.",
            (Fragment::StrangerWatch, Choice::Face) => "You looked. The maze answers.",
            (Fragment::StrangerWatch, Choice::Ignore) => "The stranger laughs; paths rearrange.",
            (Fragment::ForgotPet, Choice::Face) => "You remember warmth.",
            (Fragment::ForgotPet, Choice::Ignore) => "You ignore it.",
        }
    }
}

/// Fragment told by the node at `pos`. Several nodes may share one fragment.
pub fn fragment_at(pos: Pos) -> Fragment {
    let idx = (pos.x * 9 + pos.y * 7) % Fragment::ALL.len();
    Fragment::ALL[idx]
}

/// Result of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub cell: Pos,
    pub fragment: Fragment,
    pub choice: Choice,
    pub hint: &'static str,
    /// The exit went from locked to unlocked during this resolution.
    pub exit_unlocked: bool,
    pub mutation: Option<MutationReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(Outcome),
    /// The node was resolved before; nothing changed.
    AlreadyResolved,
    /// The cell holds no fragment node.
    NothingHere,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeState {
    pub truth: u32,
    pub doubt: u32,
    pub faced_fragments: u32,
    pub visited: HashSet<Pos>,
    pub exit_locked: bool,
    pub ending: Option<Ending>,
}

impl Default for NarrativeState {
    fn default() -> Self {
        Self {
            truth: 0,
            doubt: 0,
            faced_fragments: 0,
            visited: HashSet::new(),
            exit_locked: true,
            ending: None,
        }
    }
}

impl NarrativeState {
    pub fn is_visited(&self, pos: Pos) -> bool {
        self.visited.contains(&pos)
    }

    /// Evaluate ending conditions in priority order. The first ending reached
    /// sticks for the rest of the round.
    pub fn check_ending(&mut self, grid: &Grid, player: Pos) -> Option<Ending> {
        if self.ending.is_some() {
            return self.ending;
        }
        let ending = if self.truth >= TRUTH_FOR_TRUE_ENDING {
            Some(Ending::True)
        } else if self.doubt >= DOUBT_FOR_DARK_ENDING {
            Some(Ending::Dark)
        } else if !self.exit_locked && grid.tile(player) == Some(Tile::Exit) {
            Some(Ending::Escape)
        } else {
            None
        };
        if let Some(ending) = ending {
            info!(
                "ending reached: {ending:?} (truth {}, doubt {})",
                self.truth, self.doubt
            );
            self.ending = Some(ending);
        }
        ending
    }

    /// Resolve the fragment node at `cell` with the player's choice.
    pub fn resolve(
        &mut self,
        grid: &mut Grid,
        cell: Pos,
        choice: Choice,
        player: Pos,
        rng: &mut impl Rng,
    ) -> Resolution {
        if grid.tile(cell) != Some(Tile::FragmentNode) {
            return Resolution::NothingHere;
        }
        if self.is_visited(cell) {
            return Resolution::AlreadyResolved;
        }

        let fragment = fragment_at(cell);
        let was_locked = self.exit_locked;
        let effect = fragment.effect(choice);
        let mutation = match choice {
            Choice::Face => {
                self.truth += 1;
                let report = self.apply(effect, grid, cell, player, rng);
                self.faced_fragments += 1;
                if self.faced_fragments >= FACED_TO_UNLOCK_EXIT {
                    self.exit_locked = false;
                }
                report
            }
            Choice::Ignore => {
                self.doubt += 1;
                self.apply(effect, grid, cell, player, rng)
            }
        };
        self.visited.insert(cell);

        info!(
            "fragment {} at {cell} resolved with {choice:?} (truth {}, doubt {})",
            fragment.id(),
            self.truth,
            self.doubt
        );
        Resolution::Resolved(Outcome {
            cell,
            fragment,
            choice,
            hint: fragment.hint(choice),
            exit_unlocked: was_locked && !self.exit_locked,
            mutation,
        })
    }

    fn apply(
        &mut self,
        effect: Effect,
        grid: &mut Grid,
        cell: Pos,
        player: Pos,
        rng: &mut impl Rng,
    ) -> Option<MutationReport> {
        match effect {
            Effect::OpenNeighborhood => {
                open_neighborhood(grid, cell);
                None
            }
            Effect::OpenRandomBatch => {
                open_random_batch(grid, rng);
                None
            }
            Effect::UnlockExit => {
                self.exit_locked = false;
                None
            }
            Effect::MutateMaze => Some(mutate::mutate(grid, player, rng)),
        }
    }
}

fn open_neighborhood(grid: &mut Grid, center: Pos) {
    for dy in -NEIGHBORHOOD_RADIUS..=NEIGHBORHOOD_RADIUS {
        for dx in -NEIGHBORHOOD_RADIUS..=NEIGHBORHOOD_RADIUS {
            let x = center.x as isize + dx;
            let y = center.y as isize + dy;
            if x < 0 || y < 0 {
                continue;
            }
            let pos = Pos::new(x as usize, y as usize);
            if grid.is_interior(pos) && grid.tile(pos) == Some(Tile::Wall) {
                grid.set_cell(pos, Tile::Floor);
            }
        }
    }
}

fn open_random_batch(grid: &mut Grid, rng: &mut impl Rng) {
    for _ in 0..RANDOM_BATCH_SIZE {
        let pos = Pos::new(
            rng.gen_range(1..=grid.width() - 2),
            rng.gen_range(1..=grid.height() - 2),
        );
        if grid.tile(pos) == Some(Tile::Wall) {
            grid.set_cell(pos, Tile::Floor);
        }
    }
}
