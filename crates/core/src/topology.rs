use glam::Vec3;

/// One adjacency entry. `duplicate` marks an alias edge: the two vertices
/// represent the same geometric point at different resolution levels and
/// must stay synchronized without contributing graph distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub vertex: u32,
    pub duplicate: bool,
}

impl Neighbor {
    pub fn edge(vertex: usize) -> Self {
        Self {
            vertex: vertex as u32,
            duplicate: false,
        }
    }

    pub fn alias(vertex: usize) -> Self {
        Self {
            vertex: vertex as u32,
            duplicate: true,
        }
    }
}

/// Read-only view of a surface's vertex graph. The host owns the data; the
/// expansion core only queries it. Implementations must be `Sync` so the
/// apply stage can share them across worker threads.
pub trait Topology: Sync {
    fn vertex_count(&self) -> usize;
    fn neighbors(&self, vertex: usize) -> &[Neighbor];
    fn position(&self, vertex: usize) -> Vec3;
    fn normal(&self, vertex: usize) -> Vec3;
}

/// Reference topology built from triangle soup, for hosts without their own
/// adjacency and for tests.
#[derive(Debug, Clone, Default)]
pub struct MeshTopology {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    neighbors: Vec<Vec<Neighbor>>,
}

impl MeshTopology {
    /// Builds adjacency from triangle ring edges. Vertex normals are
    /// accumulated from face normals and normalized; degenerate fans fall
    /// back to +Z.
    pub fn from_triangles(positions: Vec<[f32; 3]>, indices: &[u32]) -> Self {
        let count = positions.len();
        let mut neighbors = vec![Vec::new(); count];
        for tri in indices.chunks_exact(3) {
            let a = tri[0] as usize;
            let b = tri[1] as usize;
            let c = tri[2] as usize;
            if a < count && b < count && c < count {
                neighbors[a].extend([Neighbor::edge(b), Neighbor::edge(c)]);
                neighbors[b].extend([Neighbor::edge(a), Neighbor::edge(c)]);
                neighbors[c].extend([Neighbor::edge(a), Neighbor::edge(b)]);
            }
        }
        for list in &mut neighbors {
            list.sort_unstable_by_key(|n| (n.vertex, n.duplicate));
            list.dedup();
        }

        let mut accum = vec![Vec3::ZERO; count];
        for tri in indices.chunks_exact(3) {
            let a = tri[0] as usize;
            let b = tri[1] as usize;
            let c = tri[2] as usize;
            if a < count && b < count && c < count {
                let pa = Vec3::from(positions[a]);
                let pb = Vec3::from(positions[b]);
                let pc = Vec3::from(positions[c]);
                let face = (pb - pa).cross(pc - pa);
                accum[a] += face;
                accum[b] += face;
                accum[c] += face;
            }
        }
        let normals = accum
            .into_iter()
            .map(|n| {
                if n.length_squared() > 1.0e-12 {
                    n.normalize().to_array()
                } else {
                    [0.0, 0.0, 1.0]
                }
            })
            .collect();

        Self {
            positions,
            normals,
            neighbors,
        }
    }

    /// Builds adjacency from an explicit edge list. Normals default to +Z;
    /// use [`MeshTopology::set_normals`] to override.
    pub fn from_edges(positions: Vec<[f32; 3]>, edges: &[[u32; 2]]) -> Self {
        let count = positions.len();
        let mut neighbors = vec![Vec::new(); count];
        for edge in edges {
            let a = edge[0] as usize;
            let b = edge[1] as usize;
            if a < count && b < count && a != b {
                neighbors[a].push(Neighbor::edge(b));
                neighbors[b].push(Neighbor::edge(a));
            }
        }
        for list in &mut neighbors {
            list.sort_unstable_by_key(|n| (n.vertex, n.duplicate));
            list.dedup();
        }
        Self {
            positions,
            normals: vec![[0.0, 0.0, 1.0]; count],
            neighbors,
        }
    }

    /// Wraps adjacency the host already owns. Lists are taken verbatim,
    /// including their ordering.
    pub fn from_parts(
        positions: Vec<[f32; 3]>,
        normals: Vec<[f32; 3]>,
        neighbors: Vec<Vec<Neighbor>>,
    ) -> Self {
        Self {
            positions,
            normals,
            neighbors,
        }
    }

    pub fn set_normals(&mut self, normals: Vec<[f32; 3]>) {
        self.normals = normals;
    }

    /// Registers an alias pair: both vertices gain a duplicate edge to the
    /// other.
    pub fn add_duplicate(&mut self, a: usize, b: usize) {
        if a == b || a >= self.neighbors.len() || b >= self.neighbors.len() {
            return;
        }
        self.neighbors[a].push(Neighbor::alias(b));
        self.neighbors[b].push(Neighbor::alias(a));
    }
}

impl Topology for MeshTopology {
    fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    fn neighbors(&self, vertex: usize) -> &[Neighbor] {
        self.neighbors
            .get(vertex)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    fn position(&self, vertex: usize) -> Vec3 {
        self.positions
            .get(vertex)
            .copied()
            .map(Vec3::from)
            .unwrap_or(Vec3::ZERO)
    }

    fn normal(&self, vertex: usize) -> Vec3 {
        self.normals
            .get(vertex)
            .copied()
            .map(Vec3::from)
            .unwrap_or(Vec3::Z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_adjacency_is_symmetric_and_deduped() {
        let topo = MeshTopology::from_triangles(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [1.0, 1.0, 0.0],
            ],
            &[0, 1, 2, 1, 3, 2],
        );
        assert_eq!(topo.vertex_count(), 4);
        // Shared edge 1-2 appears once per side despite two incident faces.
        let of = |v: usize| {
            topo.neighbors(v)
                .iter()
                .map(|n| n.vertex)
                .collect::<Vec<_>>()
        };
        assert_eq!(of(0), vec![1, 2]);
        assert_eq!(of(1), vec![0, 2, 3]);
        assert_eq!(of(2), vec![0, 1, 3]);
        assert_eq!(of(3), vec![1, 2]);
    }

    #[test]
    fn flat_grid_normals_point_up() {
        let topo = MeshTopology::from_triangles(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[0, 1, 2],
        );
        for v in 0..3 {
            let n = topo.normal(v);
            assert!((n.z - 1.0).abs() < 1.0e-5);
        }
    }

    #[test]
    fn duplicate_edges_are_flagged() {
        let mut topo = MeshTopology::from_edges(vec![[0.0; 3]; 3], &[[0, 1]]);
        topo.add_duplicate(1, 2);
        assert!(topo.neighbors(1).iter().any(|n| n.vertex == 2 && n.duplicate));
        assert!(topo.neighbors(2).iter().any(|n| n.vertex == 1 && n.duplicate));
        assert!(topo.neighbors(0).iter().all(|n| !n.duplicate));
    }
}
