use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Mirror axes consulted when recomputing the pivot after a commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symmetry {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl Symmetry {
    /// True when `a` lies on the same side as `b` for every enabled axis.
    pub fn same_side(&self, a: Vec3, b: Vec3) -> bool {
        if self.x && a.x * b.x < 0.0 {
            return false;
        }
        if self.y && a.y * b.y < 0.0 {
            return false;
        }
        if self.z && a.z * b.z < 0.0 {
            return false;
        }
        true
    }
}

/// Interactive configuration of a mask-expansion session. Ranges are
/// enforced by [`ExpandOptions::clamped`], which runs at session start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpandOptions {
    /// Invert the generated mask.
    pub invert: bool,
    /// Take the threshold from the vertex under the cursor instead of the
    /// pointer travel distance; off-surface hovers expand to the whole
    /// connected component.
    pub follow_cursor: bool,
    /// Recompute the pivot from the mask border band after a commit.
    pub recompute_pivot: bool,
    /// Mask smoothing passes run at commit, `0..=10`.
    pub smooth_iterations: i32,
    /// Pointer travel per threshold step, `1..=10` pixels.
    pub pixels_per_step: i32,
    /// Weight the expansion by normal continuity instead of raw distance.
    pub use_normals: bool,
    /// Combine the new mask with the pre-session mask by maximum.
    pub keep_previous: bool,
    /// Sensitivity for carrying the expansion across sharp edges in
    /// normal-weighted mode, `0..=2000`.
    pub edge_sensitivity: i32,
    /// Assign a fresh region id instead of painting the scalar mask.
    pub create_regions: bool,
    pub symmetry: Symmetry,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            invert: true,
            follow_cursor: true,
            recompute_pivot: true,
            smooth_iterations: 2,
            pixels_per_step: 5,
            use_normals: true,
            keep_previous: false,
            edge_sensitivity: 300,
            create_regions: false,
            symmetry: Symmetry::default(),
        }
    }
}

impl ExpandOptions {
    pub fn clamped(&self) -> Self {
        Self {
            smooth_iterations: self.smooth_iterations.clamp(0, 10),
            pixels_per_step: self.pixels_per_step.clamp(1, 10),
            edge_sensitivity: self.edge_sensitivity.clamp(0, 2000),
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_enforces_documented_ranges() {
        let options = ExpandOptions {
            smooth_iterations: 99,
            pixels_per_step: 0,
            edge_sensitivity: -5,
            ..ExpandOptions::default()
        };
        let clamped = options.clamped();
        assert_eq!(clamped.smooth_iterations, 10);
        assert_eq!(clamped.pixels_per_step, 1);
        assert_eq!(clamped.edge_sensitivity, 0);
    }

    #[test]
    fn symmetry_checks_only_enabled_axes() {
        let sym = Symmetry {
            x: true,
            ..Symmetry::default()
        };
        let a = Vec3::new(-1.0, 2.0, 0.0);
        let b = Vec3::new(1.0, -2.0, 0.0);
        assert!(!sym.same_side(a, b));
        assert!(Symmetry::default().same_side(a, b));
        // On-plane positions are never rejected.
        assert!(sym.same_side(Vec3::ZERO, b));
    }
}
