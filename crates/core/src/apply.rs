use std::ops::Range;

use crate::field::{InfluenceField, ITERATION_UNSET};
use crate::parallel;

/// Vertices per worker batch. Batches never overlap, so each worker owns
/// its output slice exclusively and no locking is needed.
const APPLY_BATCH: usize = 1024;

/// Per-invocation inputs of the apply stage. `active_normal_factor` is the
/// live active vertex's own factor, re-queried by the caller before every
/// invocation so the comparison point follows the cursor.
#[derive(Debug, Clone, Copy)]
pub struct ApplySettings {
    pub threshold: i32,
    pub use_normals: bool,
    pub invert: bool,
    pub keep_previous: bool,
    pub active_normal_factor: f32,
}

fn raw_value(field: &InfluenceField, settings: &ApplySettings, vertex: usize) -> f32 {
    if settings.use_normals {
        if settings.active_normal_factor < field.normal_factor(vertex) {
            1.0
        } else {
            0.0
        }
    } else {
        let iteration = field.iteration(vertex);
        if iteration != ITERATION_UNSET && iteration <= settings.threshold {
            1.0
        } else {
            0.0
        }
    }
}

/// Recomputes the mask for every vertex at the given threshold. Writes only
/// where the stored value differs and returns the batch ranges that were
/// touched, so an unchanged re-apply is a full no-op against storage.
pub fn apply_mask(
    field: &InfluenceField,
    settings: &ApplySettings,
    prev_mask: &[f32],
    mask: &mut [f32],
) -> Vec<Range<usize>> {
    debug_assert_eq!(mask.len(), field.len());
    debug_assert_eq!(prev_mask.len(), field.len());

    let changed = parallel::map_chunks_mut(mask, APPLY_BATCH, |base, chunk| {
        let mut touched = false;
        for (offset, slot) in chunk.iter_mut().enumerate() {
            let vertex = base + offset;
            let mut value = raw_value(field, settings, vertex);
            if settings.keep_previous {
                value = value.max(prev_mask.get(vertex).copied().unwrap_or(0.0));
            }
            if settings.invert {
                value = 1.0 - value;
            }
            if *slot != value {
                *slot = value;
                touched = true;
            }
        }
        touched
    });

    dirty_ranges(&changed, field.len())
}

/// Region-mode apply: assigns `new_region` wherever the raw value is on.
/// The caller is expected to have reset `regions` from its session snapshot
/// first, since region assignment is not reversible per vertex.
pub fn apply_regions(
    field: &InfluenceField,
    settings: &ApplySettings,
    new_region: i32,
    regions: &mut [i32],
) -> Vec<Range<usize>> {
    debug_assert_eq!(regions.len(), field.len());

    let changed = parallel::map_chunks_mut(regions, APPLY_BATCH, |base, chunk| {
        let mut touched = false;
        for (offset, slot) in chunk.iter_mut().enumerate() {
            let vertex = base + offset;
            if raw_value(field, settings, vertex) == 1.0 && *slot != new_region {
                *slot = new_region;
                touched = true;
            }
        }
        touched
    });

    dirty_ranges(&changed, field.len())
}

fn dirty_ranges(changed: &[bool], len: usize) -> Vec<Range<usize>> {
    changed
        .iter()
        .enumerate()
        .filter(|(_, touched)| **touched)
        .map(|(chunk, _)| {
            let start = chunk * APPLY_BATCH;
            start..(start + APPLY_BATCH).min(len)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flood::{build_influence, FloodSettings};
    use crate::topology::MeshTopology;

    fn line_field() -> InfluenceField {
        let positions = (0..5).map(|i| [i as f32, 0.0, 0.0]).collect();
        let topo = MeshTopology::from_edges(positions, &[[0, 1], [1, 2], [2, 3], [3, 4]]);
        build_influence(&topo, 2, &FloodSettings::default())
    }

    fn settings(threshold: i32) -> ApplySettings {
        ApplySettings {
            threshold,
            use_normals: false,
            invert: false,
            keep_previous: false,
            active_normal_factor: 0.0,
        }
    }

    #[test]
    fn threshold_one_masks_inner_ring() {
        let field = line_field();
        let prev = vec![0.0; 5];
        let mut mask = vec![0.0; 5];
        apply_mask(&field, &settings(1), &prev, &mut mask);
        assert_eq!(mask, vec![0.0, 1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn threshold_two_masks_everything() {
        let field = line_field();
        let prev = vec![0.0; 5];
        let mut mask = vec![0.0; 5];
        apply_mask(&field, &settings(2), &prev, &mut mask);
        assert_eq!(mask, vec![1.0; 5]);
    }

    #[test]
    fn keep_previous_takes_max_of_prev_and_raw() {
        let field = line_field();
        let prev = vec![1.0, 0.0, 0.0, 0.0, 0.0];
        let mut mask = prev.clone();
        let applied = ApplySettings {
            keep_previous: true,
            ..settings(1)
        };
        apply_mask(&field, &applied, &prev, &mut mask);
        assert_eq!(mask, vec![1.0, 1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn invert_law_holds_per_vertex() {
        let field = line_field();
        let prev = vec![0.0; 5];
        for threshold in 0..=2 {
            let mut plain = vec![0.0; 5];
            let mut inverted = vec![0.0; 5];
            apply_mask(&field, &settings(threshold), &prev, &mut plain);
            let flipped = ApplySettings {
                invert: true,
                ..settings(threshold)
            };
            apply_mask(&field, &flipped, &prev, &mut inverted);
            for v in 0..5 {
                assert_eq!(inverted[v], 1.0 - plain[v]);
            }
        }
    }

    #[test]
    fn mask_grows_monotonically_with_threshold() {
        let field = line_field();
        let prev = vec![0.0; 5];
        let mut last = vec![0.0; 5];
        apply_mask(&field, &settings(0), &prev, &mut last);
        for threshold in 1..=3 {
            let mut current = vec![0.0; 5];
            apply_mask(&field, &settings(threshold), &prev, &mut current);
            for v in 0..5 {
                assert!(current[v] >= last[v]);
            }
            last = current;
        }
    }

    #[test]
    fn unreached_vertices_never_turn_on() {
        let topo = MeshTopology::from_edges(vec![[0.0; 3]; 4], &[[0, 1]]);
        let field = build_influence(&topo, 0, &FloodSettings::default());
        let prev = vec![0.0; 4];
        let mut mask = vec![0.0; 4];
        apply_mask(&field, &settings(100), &prev, &mut mask);
        assert_eq!(mask, vec![1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn second_identical_apply_reports_no_dirty_batches() {
        let field = line_field();
        let prev = vec![0.0; 5];
        let mut mask = vec![0.0; 5];
        let first = apply_mask(&field, &settings(1), &prev, &mut mask);
        assert!(!first.is_empty());
        let second = apply_mask(&field, &settings(1), &prev, &mut mask);
        assert!(second.is_empty());
    }

    #[test]
    fn normal_mode_compares_against_active_factor() {
        let mut field = line_field();
        field.normal_factor = Some(vec![0.9, 0.7, 0.5, 0.3, 0.1]);
        let prev = vec![0.0; 5];
        let mut mask = vec![0.0; 5];
        let applied = ApplySettings {
            use_normals: true,
            active_normal_factor: 0.5,
            ..settings(0)
        };
        apply_mask(&field, &applied, &prev, &mut mask);
        assert_eq!(mask, vec![1.0, 1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn regions_assigned_only_inside_threshold() {
        let field = line_field();
        let mut regions = vec![7; 5];
        let dirty = apply_regions(&field, &settings(1), 8, &mut regions);
        assert_eq!(regions, vec![7, 8, 8, 8, 7]);
        assert!(!dirty.is_empty());
        let again = apply_regions(&field, &settings(1), 8, &mut regions);
        assert!(again.is_empty());
    }
}
