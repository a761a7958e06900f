//! Breadth-first queries over the maze. Every non-wall cell is traversable,
//! including a locked exit and fragment nodes.

use std::collections::VecDeque;

use crate::grid::{Grid, Pos};

/// BFS distances from a single source.
#[derive(Debug, Clone)]
pub struct DistanceMap {
    dist: Vec<Vec<i32>>,
    order: Vec<Pos>,
}

impl DistanceMap {
    /// Hop count from the source, `None` if unreachable.
    pub fn get(&self, pos: Pos) -> Option<u32> {
        let d = *self.dist.get(pos.y)?.get(pos.x)?;
        if d < 0 {
            None
        } else {
            Some(d as u32)
        }
    }

    /// Reachable cells in discovery order, source first.
    pub fn order(&self) -> &[Pos] {
        &self.order
    }

    /// First discovered cell at the greatest distance.
    pub fn farthest(&self) -> Option<(Pos, u32)> {
        let mut best: Option<(Pos, u32)> = None;
        for &pos in &self.order {
            let d = self.get(pos).unwrap_or(0);
            match best {
                Some((_, bd)) if d <= bd => {}
                _ => best = Some((pos, d)),
            }
        }
        best
    }

    pub fn reachable_count(&self) -> usize {
        self.order.len()
    }
}

pub fn distances(grid: &Grid, start: Pos) -> DistanceMap {
    let mut dist = vec![vec![-1; grid.width()]; grid.height()];
    let mut order = Vec::new();
    if !grid.is_passable(start) {
        return DistanceMap { dist, order };
    }

    let mut q = VecDeque::new();
    dist[start.y][start.x] = 0;
    q.push_back(start);

    while let Some(pos) = q.pop_front() {
        order.push(pos);
        let base = dist[pos.y][pos.x];
        for next in grid.neighbors(pos) {
            if !grid.is_passable(next) {
                continue;
            }
            if dist[next.y][next.x] == -1 {
                dist[next.y][next.x] = base + 1;
                q.push_back(next);
            }
        }
    }
    DistanceMap { dist, order }
}

/// Shortest 4-connected path from `start` to `target`, both inclusive.
pub fn shortest_path(grid: &Grid, start: Pos, target: Pos) -> Option<Vec<Pos>> {
    if !grid.is_passable(start) || !grid.is_passable(target) {
        return None;
    }
    if start == target {
        return Some(vec![start]);
    }

    let mut prev: Vec<Vec<Option<Pos>>> = vec![vec![None; grid.width()]; grid.height()];
    let mut seen = vec![vec![false; grid.width()]; grid.height()];
    let mut q = VecDeque::new();
    seen[start.y][start.x] = true;
    q.push_back(start);

    while let Some(pos) = q.pop_front() {
        if pos == target {
            let mut path = vec![pos];
            let mut cur = pos;
            while let Some(p) = prev[cur.y][cur.x] {
                path.push(p);
                cur = p;
            }
            path.reverse();
            return Some(path);
        }
        for next in grid.neighbors(pos) {
            if seen[next.y][next.x] || !grid.is_passable(next) {
                continue;
            }
            seen[next.y][next.x] = true;
            prev[next.y][next.x] = Some(pos);
            q.push_back(next);
        }
    }
    None
}

pub fn is_reachable(grid: &Grid, start: Pos, target: Pos) -> bool {
    shortest_path(grid, start, target).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridDims, Tile};

    fn corridor() -> Grid {
        // Row 1 open from x=1..=5, plus a dead end at (3, 2).
        let mut grid = Grid::filled(GridDims::from_viewport(15, 11), Tile::Wall);
        for x in 1..=5 {
            grid.set_cell(Pos::new(x, 1), Tile::Floor);
        }
        grid.set_cell(Pos::new(3, 2), Tile::Floor);
        grid
    }

    #[test]
    fn path_runs_start_to_target_inclusive() {
        let grid = corridor();
        let path = shortest_path(&grid, Pos::new(1, 1), Pos::new(5, 1)).unwrap();
        assert_eq!(path.first(), Some(&Pos::new(1, 1)));
        assert_eq!(path.last(), Some(&Pos::new(5, 1)));
        assert_eq!(path.len(), 5);
        for pair in path.windows(2) {
            let dx = pair[0].x.abs_diff(pair[1].x);
            let dy = pair[0].y.abs_diff(pair[1].y);
            assert_eq!(dx + dy, 1);
        }
    }

    #[test]
    fn same_start_and_target_is_single_cell() {
        let grid = corridor();
        let path = shortest_path(&grid, Pos::new(2, 1), Pos::new(2, 1));
        assert_eq!(path, Some(vec![Pos::new(2, 1)]));
    }

    #[test]
    fn walls_block_paths() {
        let mut grid = corridor();
        grid.set_cell(Pos::new(4, 1), Tile::Wall);
        assert!(!is_reachable(&grid, Pos::new(1, 1), Pos::new(5, 1)));
        assert!(is_reachable(&grid, Pos::new(1, 1), Pos::new(3, 2)));
        assert!(!is_reachable(&grid, Pos::new(1, 1), Pos::new(40, 1)));
    }

    #[test]
    fn exit_and_fragment_nodes_are_traversable() {
        let mut grid = corridor();
        grid.set_cell(Pos::new(3, 1), Tile::FragmentNode);
        grid.set_cell(Pos::new(5, 1), Tile::Exit);
        let path = shortest_path(&grid, Pos::new(1, 1), Pos::new(5, 1)).unwrap();
        assert!(path.contains(&Pos::new(3, 1)));
    }

    #[test]
    fn farthest_prefers_first_discovered() {
        let grid = corridor();
        let map = distances(&grid, Pos::new(3, 1));
        // (5,1) is discovered before (1,1) because Right expands before Left.
        assert_eq!(map.farthest(), Some((Pos::new(5, 1), 2)));
        assert_eq!(map.get(Pos::new(3, 2)), Some(1));
        assert_eq!(map.get(Pos::new(7, 7)), None);
        assert_eq!(map.reachable_count(), 6);
        assert_eq!(map.order()[0], Pos::new(3, 1));
    }
}
