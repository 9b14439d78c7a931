//! Merge-by-distance welding.
//!
//! Vertices are bucketed in a uniform grid with cell size equal to the
//! threshold, so only the 27 surrounding cells need to be searched. Close
//! pairs are joined with a union-find whose root is always the smallest
//! vertex index; that vertex keeps its position and the groups of everything
//! merged into it.

use std::collections::HashMap;

use crate::error::{Result, SynthError};
use crate::mesh::{PieceMesh, VertexId, VertexRemap};

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Join two sets; the smaller root wins.
    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra < rb {
            self.parent[rb] = ra;
        } else if rb < ra {
            self.parent[ra] = rb;
        }
    }
}

/// Merge all vertices closer than `threshold` (transitively).
///
/// Faces that collapse below three corners are removed. A non-positive
/// threshold returns an unchanged copy.
pub fn weld_by_distance(mesh: &PieceMesh, threshold: f64) -> Result<(PieceMesh, VertexRemap)> {
    if !threshold.is_finite() {
        return Err(SynthError::invalid_param("threshold", threshold, "must be finite"));
    }
    let n = mesh.num_vertices();
    if threshold <= 0.0 || n == 0 {
        return Ok((mesh.clone(), VertexRemap::identity(n)));
    }

    let cell = |x: f64| (x / threshold).floor() as i64;
    let mut grid: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
    let mut sets = UnionFind::new(n);
    let threshold_sq = threshold * threshold;
    let positions = mesh.positions();

    for (i, p) in positions.iter().enumerate() {
        let (cx, cy, cz) = (cell(p.x), cell(p.y), cell(p.z));
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(bucket) = grid.get(&(cx + dx, cy + dy, cz + dz)) {
                        for &j in bucket {
                            if (positions[j] - p).norm_squared() <= threshold_sq {
                                sets.union(i, j);
                            }
                        }
                    }
                }
            }
        }
        grid.entry((cx, cy, cz)).or_default().push(i);
    }

    let merge: Vec<VertexId> = (0..n).map(|i| VertexId::new(sets.find(i))).collect();
    let merged = merge.iter().enumerate().filter(|(i, r)| r.index() != *i).count();
    log::debug!("Weld merged {} of {} vertices", merged, n);

    Ok(mesh.merge_vertices(&merge))
}
