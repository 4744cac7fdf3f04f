/// Iteration value of vertices the flood fill never reached. Such vertices
/// never turn on, whatever the threshold.
pub const ITERATION_UNSET: i32 = -1;

/// Per-vertex influence state produced by one flood fill and kept alive for
/// the whole interactive session. Written once by the flood-fill engine,
/// read-only afterwards; the apply stage re-evaluates it against a moving
/// threshold without ever re-touching the graph.
#[derive(Debug, Clone)]
pub struct InfluenceField {
    pub(crate) seed: usize,
    pub(crate) iteration: Vec<i32>,
    pub(crate) normal_factor: Option<Vec<f32>>,
    pub(crate) max_iteration: i32,
}

impl InfluenceField {
    pub fn len(&self) -> usize {
        self.iteration.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iteration.is_empty()
    }

    pub fn seed(&self) -> usize {
        self.seed
    }

    /// BFS distance from the seed, or [`ITERATION_UNSET`].
    pub fn iteration(&self, vertex: usize) -> i32 {
        self.iteration
            .get(vertex)
            .copied()
            .unwrap_or(ITERATION_UNSET)
    }

    pub fn iterations(&self) -> &[i32] {
        &self.iteration
    }

    /// Largest iteration observed; 0 when the seed has no reachable
    /// neighbors. Defines the upper bound of the interactive threshold
    /// range.
    pub fn max_iteration(&self) -> i32 {
        self.max_iteration
    }

    pub fn use_normals(&self) -> bool {
        self.normal_factor.is_some()
    }

    /// Smoothed normal-continuity factor in [0, 1]; 0 when normal weighting
    /// was disabled for this field.
    pub fn normal_factor(&self, vertex: usize) -> f32 {
        self.normal_factor
            .as_ref()
            .and_then(|factors| factors.get(vertex))
            .copied()
            .unwrap_or(0.0)
    }
}
