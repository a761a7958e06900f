//! Online maze mutation that never cuts the player off from the exit.

use std::collections::HashSet;

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::grid::{Dir, Grid, Pos, Tile};
use crate::path;

const OPENING_ATTEMPTS: usize = 10;
const NEIGHBOR_OPEN_CHANCE: f64 = 0.6;
const CORRUPTION_CANDIDATES: usize = 20;
const MAX_CORRUPTIONS: usize = 12;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationReport {
    /// Walls turned into floor by the opening phase.
    pub opened: usize,
    /// Floors turned into wall and kept.
    pub corrupted: usize,
    /// Closures rolled back because they disconnected the player.
    pub reverted: usize,
}

/// Open a few deceptive passages, then wall off branches the player does not
/// need. A no-op when the grid has no exit.
pub fn mutate(grid: &mut Grid, player: Pos, rng: &mut impl Rng) -> MutationReport {
    let mut report = MutationReport::default();
    let Some(exit) = grid.find_exit() else {
        return report;
    };

    let mut protected: HashSet<Pos> = HashSet::new();
    if let Some(route) = path::shortest_path(grid, player, exit) {
        protected.extend(route);
    }
    protected.insert(player);
    protected.insert(exit);

    open_passages(grid, &protected, rng, &mut report);
    corrupt_branches(grid, &protected, player, exit, rng, &mut report);

    debug!(
        "mutation around {player}: opened {}, corrupted {}, reverted {}",
        report.opened, report.corrupted, report.reverted
    );
    report
}

fn random_interior(grid: &Grid, rng: &mut impl Rng) -> Pos {
    Pos::new(
        rng.gen_range(1..=grid.width() - 2),
        rng.gen_range(1..=grid.height() - 2),
    )
}

fn open_passages(
    grid: &mut Grid,
    protected: &HashSet<Pos>,
    rng: &mut impl Rng,
    report: &mut MutationReport,
) {
    for _ in 0..OPENING_ATTEMPTS {
        let pos = random_interior(grid, rng);
        if protected.contains(&pos) || grid.tile(pos) != Some(Tile::Wall) {
            continue;
        }
        grid.set_cell(pos, Tile::Floor);
        report.opened += 1;

        if rng.gen_bool(NEIGHBOR_OPEN_CHANCE) {
            let mut dirs = Dir::ALL;
            dirs.shuffle(rng);
            let Some(next) = pos.offset(dirs[0], 1) else {
                continue;
            };
            if grid.is_interior(next)
                && !protected.contains(&next)
                && grid.tile(next) == Some(Tile::Wall)
            {
                grid.set_cell(next, Tile::Floor);
                report.opened += 1;
            }
        }
    }
}

fn corrupt_branches(
    grid: &mut Grid,
    protected: &HashSet<Pos>,
    player: Pos,
    exit: Pos,
    rng: &mut impl Rng,
    report: &mut MutationReport,
) {
    let mut candidates: Vec<Pos> = grid
        .positions_of(Tile::Floor)
        .into_iter()
        .filter(|p| grid.is_interior(*p) && !protected.contains(p))
        .collect();
    candidates.shuffle(rng);

    for pos in candidates.into_iter().take(CORRUPTION_CANDIDATES) {
        if report.corrupted >= MAX_CORRUPTIONS {
            break;
        }
        grid.set_cell(pos, Tile::Wall);
        if path::is_reachable(grid, player, exit) {
            report.corrupted += 1;
        } else {
            grid.set_cell(pos, Tile::Floor);
            report.reverted += 1;
        }
    }
}
