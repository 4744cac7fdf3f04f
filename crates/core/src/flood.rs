use tracing::debug;

use crate::field::{InfluenceField, ITERATION_UNSET};
use crate::parallel;
use crate::topology::Topology;

/// Fixed number of simultaneous-update smoothing passes over the normal
/// factor after the traversal.
const NORMAL_SMOOTH_PASSES: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct FloodSettings {
    pub use_normals: bool,
    /// Exponent applied to the accumulated edge factor when attenuating the
    /// seed-normal similarity.
    pub edge_sensitivity: f32,
}

impl Default for FloodSettings {
    fn default() -> Self {
        Self {
            use_normals: false,
            edge_sensitivity: 300.0,
        }
    }
}

/// Floods influence outward from `seed` and returns the per-vertex field.
///
/// The traversal is level-synchronous: each BFS level first closes over
/// duplicate (alias) edges, copying iteration and factors verbatim with no
/// distance increment, then expands ordinary edges with the frontier in
/// ascending vertex order, first assignment winning. The result is a pure
/// function of the graph and normals, independent of adjacency-list
/// ordering. Total over disconnected graphs; unreached vertices keep
/// [`ITERATION_UNSET`].
pub fn build_influence(
    graph: &impl Topology,
    seed: usize,
    settings: &FloodSettings,
) -> InfluenceField {
    let count = graph.vertex_count();
    let mut iteration = vec![ITERATION_UNSET; count];
    let mut max_iteration = 0;

    if seed >= count {
        return InfluenceField {
            seed,
            iteration,
            normal_factor: None,
            max_iteration,
        };
    }

    let mut edge_factor = vec![1.0f32; count];
    let mut normal_factor = vec![0.0f32; count];
    let seed_normal = graph.normal(seed);

    let mut aliases = AliasClasses::new(count);

    iteration[seed] = 0;
    let mut frontier = vec![seed];
    while !frontier.is_empty() {
        frontier.sort_unstable();

        // Close over alias edges at the current distance before expanding.
        let mut pending = frontier.clone();
        let mut cursor = 0;
        while cursor < pending.len() {
            let from = pending[cursor];
            cursor += 1;
            for neighbor in graph.neighbors(from) {
                if !neighbor.duplicate {
                    continue;
                }
                let to = neighbor.vertex as usize;
                if to >= count {
                    continue;
                }
                aliases.join(from, to);
                if iteration[to] != ITERATION_UNSET {
                    continue;
                }
                iteration[to] = iteration[from];
                edge_factor[to] = edge_factor[from];
                normal_factor[to] = normal_factor[from];
                frontier.push(to);
                pending.push(to);
            }
        }
        frontier.sort_unstable();

        let mut next = Vec::new();
        for &from in &frontier {
            for neighbor in graph.neighbors(from) {
                if neighbor.duplicate {
                    continue;
                }
                let to = neighbor.vertex as usize;
                if to >= count || iteration[to] != ITERATION_UNSET {
                    continue;
                }
                let to_iteration = iteration[from] + 1;
                iteration[to] = to_iteration;
                max_iteration = max_iteration.max(to_iteration);
                if settings.use_normals {
                    let to_normal = graph.normal(to);
                    let from_edge = edge_factor[from];
                    edge_factor[to] = to_normal.dot(graph.normal(from)) * from_edge;
                    normal_factor[to] = (seed_normal.dot(to_normal)
                        * from_edge.powf(settings.edge_sensitivity))
                    .clamp(0.0, 1.0);
                }
                next.push(to);
            }
        }
        frontier = next;
    }

    aliases.sync_i32(&mut iteration);
    // The seed must read back as exactly 0, whatever path reached it.
    iteration[seed] = 0;

    let normal_factor = if settings.use_normals {
        let mut current = normal_factor;
        aliases.sync_f32(&mut current);
        for _ in 0..NORMAL_SMOOTH_PASSES {
            let mut next = current.clone();
            let previous = current.as_slice();
            parallel::for_each_indexed_mut(&mut next, |vertex, slot| {
                let neighbors = graph.neighbors(vertex);
                if neighbors.is_empty() {
                    return;
                }
                let mut sum = 0.0;
                for neighbor in neighbors {
                    sum += previous
                        .get(neighbor.vertex as usize)
                        .copied()
                        .unwrap_or(0.0);
                }
                *slot = sum / neighbors.len() as f32;
            });
            aliases.sync_f32(&mut next);
            current = next;
        }
        Some(current)
    } else {
        None
    };

    debug!(seed, max_iteration, "influence field built");

    InfluenceField {
        seed,
        iteration,
        normal_factor,
        max_iteration,
    }
}

/// Union-find over vertices connected by alias edges. Used to keep every
/// member of an alias class carrying the value of its lowest-indexed
/// member, both after the traversal and after each smoothing pass.
struct AliasClasses {
    parent: Vec<u32>,
    dirty: bool,
}

impl AliasClasses {
    fn new(count: usize) -> Self {
        Self {
            parent: (0..count as u32).collect(),
            dirty: false,
        }
    }

    fn find(&mut self, vertex: usize) -> usize {
        let mut root = vertex;
        while self.parent[root] as usize != root {
            root = self.parent[root] as usize;
        }
        let mut walk = vertex;
        while self.parent[walk] as usize != walk {
            let next = self.parent[walk] as usize;
            self.parent[walk] = root as u32;
            walk = next;
        }
        root
    }

    /// Joins two classes, keeping the smaller index as representative.
    fn join(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        let (low, high) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[high] = low as u32;
        self.dirty = true;
    }

    fn sync_i32(&mut self, values: &mut [i32]) {
        if !self.dirty {
            return;
        }
        for vertex in 0..values.len() {
            let root = self.find(vertex);
            if root != vertex {
                values[vertex] = values[root];
            }
        }
    }

    fn sync_f32(&mut self, values: &mut [f32]) {
        if !self.dirty {
            return;
        }
        for vertex in 0..values.len() {
            let root = self.find(vertex);
            if root != vertex {
                values[vertex] = values[root];
            }
        }
    }
}
