//! Uniform spatial hash grid neighbor search (spec.md §3 `NeighborSearch`, §4.8).

use nalgebra::Vector3;
use std::collections::HashMap;

type CellKey = (i64, i64, i64);

pub struct NeighborSearch {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<usize>>,
}

impl NeighborSearch {
    /// `cell_size` should be `horizon * 1.01` per spec.md §4.8 so that every
    /// particle within the horizon falls in the 3x3x3 (or 3x3) cell block
    /// around its own cell.
    pub fn build(positions: &[Vector3<f64>], cell_size: f64) -> Self {
        let mut cells: HashMap<CellKey, Vec<usize>> = HashMap::new();
        for (i, p) in positions.iter().enumerate() {
            cells.entry(cell_key(p, cell_size)).or_default().push(i);
        }
        Self { cell_size, cells }
    }

    /// Counts neighbors within `horizon` for each particle, without storing
    /// indices — used to size `BondSystem::max_bonds` adaptively.
    pub fn count_neighbors(&self, positions: &[Vector3<f64>], horizon: f64) -> Vec<usize> {
        positions
            .iter()
            .enumerate()
            .map(|(i, p)| self.query(positions, i, *p, horizon).len())
            .collect()
    }

    /// Dense neighbor list for particle `i` at position `p`, excluding `i`
    /// itself, within `horizon`.
    pub fn query(&self, positions: &[Vector3<f64>], i: usize, p: Vector3<f64>, horizon: f64) -> Vec<usize> {
        let (cx, cy, cz) = cell_key(&p, self.cell_size);
        let mut found = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) {
                        for &j in bucket {
                            if j == i {
                                continue;
                            }
                            if (positions[j] - p).norm() <= horizon {
                                found.push(j);
                            }
                        }
                    }
                }
            }
        }
        found
    }
}

fn cell_key(p: &Vector3<f64>, cell_size: f64) -> CellKey {
    (
        (p.x / cell_size).floor() as i64,
        (p.y / cell_size).floor() as i64,
        (p.z / cell_size).floor() as i64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_all_neighbors_within_horizon() {
        let positions = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.5, 0.0, 0.0),
            Vector3::new(5.0, 0.0, 0.0),
        ];
        let grid = NeighborSearch::build(&positions, 1.0 * 1.01);
        let neighbors = grid.query(&positions, 0, positions[0], 1.0);
        assert_eq!(neighbors, vec![1]);
    }

    #[test]
    fn count_neighbors_matches_query_length() {
        let positions = vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.2, 0.0, 0.0)];
        let grid = NeighborSearch::build(&positions, 1.0 * 1.01);
        let counts = grid.count_neighbors(&positions, 1.0);
        assert_eq!(counts, vec![1, 1]);
    }
}
