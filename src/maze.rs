//! Maze generation: depth-first carving, farthest-point exit, fragment nodes.

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::grid::{Dir, Grid, GridDims, Pos, Tile, START};
use crate::path;

const MIN_FRAGMENT_DISTANCE: usize = 6;
const MIN_FRAGMENTS: usize = 2;
const MAX_FRAGMENTS: usize = 5;
const CANDIDATES_PER_FRAGMENT: usize = 6;

/// Minimum BFS distance from the start for a fragment node.
pub fn fragment_distance_threshold(dims: GridDims) -> u32 {
    MIN_FRAGMENT_DISTANCE.max(dims.cols().max(dims.rows()) / 3) as u32
}

pub fn generate(rng: &mut impl Rng, dims: GridDims) -> Grid {
    let mut grid = Grid::filled(dims, Tile::Wall);
    carve(&mut grid, rng);

    let dist = path::distances(&grid, START);
    let exit = match dist.farthest() {
        Some((pos, _)) => pos,
        None => START,
    };
    grid.set_cell(exit, Tile::Exit);

    let threshold = fragment_distance_threshold(dims);
    let mut candidates: Vec<Pos> = dist
        .order()
        .iter()
        .copied()
        .filter(|&p| p != exit && dist.get(p).is_some_and(|d| d >= threshold))
        .collect();
    candidates.shuffle(rng);
    let node_count = fragment_count(candidates.len());
    for &pos in candidates.iter().take(node_count) {
        grid.set_cell(pos, Tile::FragmentNode);
    }

    debug!(
        "generated {}x{} maze: {} floor cells, exit at {}, {} fragment nodes from {} candidates",
        dims.cols(),
        dims.rows(),
        dist.reachable_count(),
        exit,
        node_count,
        candidates.len()
    );
    grid
}

fn fragment_count(candidates: usize) -> usize {
    let wanted = (candidates / CANDIDATES_PER_FRAGMENT).clamp(MIN_FRAGMENTS, MAX_FRAGMENTS);
    wanted.min(candidates)
}

/// Randomized depth-first backtracker over odd coordinates. Moves two cells
/// at a time so a one-cell wall always separates parallel corridors.
fn carve(grid: &mut Grid, rng: &mut impl Rng) {
    grid.set_cell(START, Tile::Floor);
    let mut stack = vec![START];
    let mut order = Dir::ALL;

    while let Some(&current) = stack.last() {
        order.shuffle(rng);
        let mut carved = false;
        for dir in order {
            let Some(next) = current.offset(dir, 2) else {
                continue;
            };
            if !grid.is_interior(next) || grid.tile(next) != Some(Tile::Wall) {
                continue;
            }
            if let Some(between) = current.offset(dir, 1) {
                grid.set_cell(between, Tile::Floor);
            }
            grid.set_cell(next, Tile::Floor);
            stack.push(next);
            carved = true;
            break;
        }
        if !carved {
            stack.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn threshold_scales_with_larger_side() {
        assert_eq!(fragment_distance_threshold(GridDims::from_viewport(15, 11)), 6);
        assert_eq!(fragment_distance_threshold(GridDims::from_viewport(21, 15)), 7);
        assert_eq!(fragment_distance_threshold(GridDims::from_viewport(61, 31)), 20);
    }

    #[test]
    fn fragment_count_is_clamped() {
        assert_eq!(fragment_count(0), 0);
        assert_eq!(fragment_count(1), 1);
        assert_eq!(fragment_count(5), 2);
        assert_eq!(fragment_count(24), 4);
        assert_eq!(fragment_count(500), 5);
    }

    #[test]
    fn carving_makes_a_spanning_tree() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let dims = GridDims::from_viewport(21, 15);
        let mut grid = Grid::filled(dims, Tile::Wall);
        carve(&mut grid, &mut rng);

        // Every odd/odd cell is carved.
        for y in (1..dims.rows()).step_by(2) {
            for x in (1..dims.cols()).step_by(2) {
                assert_eq!(grid.tile(Pos::new(x, y)), Some(Tile::Floor));
            }
        }
        // A tree over n rooms has n - 1 passages.
        let rooms = ((dims.cols() - 1) / 2) * ((dims.rows() - 1) / 2);
        assert_eq!(grid.count(Tile::Floor), rooms + rooms - 1);
    }

    #[test]
    fn border_is_never_carved() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let grid = generate(&mut rng, GridDims::from_viewport(31, 21));
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let pos = Pos::new(x, y);
                if grid.is_border(pos) {
                    assert_eq!(grid.tile(pos), Some(Tile::Wall), "{pos}");
                }
            }
        }
    }

    #[test]
    fn exit_is_the_farthest_cell() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let grid = generate(&mut rng, GridDims::default());
        let exit = grid.find_exit().unwrap();
        let dist = path::distances(&grid, START);
        let exit_d = dist.get(exit).unwrap();
        assert!(dist.order().iter().all(|&p| dist.get(p).unwrap() <= exit_d));
    }
}
