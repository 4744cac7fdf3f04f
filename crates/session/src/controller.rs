use glam::{Vec2, Vec3};
use tracing::{debug, warn};

use ripple_core::{
    apply_mask, apply_regions, build_influence, smooth_mask, ApplySettings, FloodSettings,
    InfluenceField, Topology, ITERATION_UNSET,
};

use crate::config::{ExpandOptions, Symmetry};
use crate::events::{EventOutcome, KeyCode, PointerButton, UiEvent};
use crate::host::{AttributeClass, HistorySink, HoverProbe, RedrawSink};

/// The fast-forward paths stop one step short of the true maximum, leaving
/// the outermost ring unset. Inherited behavior, kept as a named constant
/// so the boundary stays pinned.
pub const FAST_FORWARD_MARGIN: i32 = 1;

/// Half-width of the mask band around 0.5 that feeds the pivot centroid.
const PIVOT_BAND: f32 = 0.2;

/// Mutable view of the attribute storage the session writes. The host
/// re-lends it on every call; the session never holds onto it.
pub enum ExpandTarget<'a> {
    Mask(&'a mut [f32]),
    Regions(&'a mut [i32]),
}

impl ExpandTarget<'_> {
    fn len(&self) -> usize {
        match self {
            ExpandTarget::Mask(mask) => mask.len(),
            ExpandTarget::Regions(regions) => regions.len(),
        }
    }

    fn is_regions(&self) -> bool {
        matches!(self, ExpandTarget::Regions(_))
    }
}

#[derive(Debug, Clone)]
enum Snapshot {
    Mask(Vec<f32>),
    Regions(Vec<i32>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Committed,
    Cancelled,
}

/// One interactive mask-expansion session. Owns the Influence Field and the
/// pre-session snapshot for its whole lifetime; the expensive flood fill
/// runs once at start and every threshold change afterwards is a cheap
/// re-apply.
pub struct ExpandSession {
    options: ExpandOptions,
    field: InfluenceField,
    snapshot: Snapshot,
    new_region: i32,
    initial_pointer: Vec2,
    last_pointer: Vec2,
    initial_position: Vec3,
    current_iteration: i32,
    last_iteration: i32,
    fast_forward: bool,
    state: SessionState,
    pivot: Option<Vec3>,
}

impl ExpandSession {
    /// Starts a session from the vertex under `pointer`. Builds the
    /// Influence Field, snapshots the pre-session values, registers the
    /// history snapshot and runs one apply at threshold 0. Returns `None`
    /// (with no observable mutation) when the surface is empty, nothing is
    /// under the cursor, the target storage does not match the surface, or
    /// the configured mode disagrees with the target variant.
    pub fn start(
        graph: &impl Topology,
        probe: &impl HoverProbe,
        pointer: Vec2,
        options: &ExpandOptions,
        target: ExpandTarget<'_>,
        history: &mut dyn HistorySink,
        redraw: &mut dyn RedrawSink,
    ) -> Option<Self> {
        let options = options.clamped();
        let count = graph.vertex_count();
        if count == 0 {
            warn!("mask expand refused: surface has no vertices");
            return None;
        }
        if target.len() != count {
            warn!(
                expected = count,
                actual = target.len(),
                "mask expand refused: target storage size mismatch"
            );
            return None;
        }
        if options.create_regions != target.is_regions() {
            warn!("mask expand refused: configured mode does not match target attribute");
            return None;
        }
        let seed = match probe.hit_test(pointer) {
            Some(seed) if seed < count => seed,
            Some(seed) => {
                warn!(seed, count, "mask expand refused: seed out of range");
                return None;
            }
            None => {
                debug!("mask expand refused: nothing under cursor");
                return None;
            }
        };

        let (snapshot, class, new_region) = match &target {
            ExpandTarget::Mask(mask) => (Snapshot::Mask(mask.to_vec()), AttributeClass::Mask, 0),
            ExpandTarget::Regions(regions) => {
                // Fresh id, allocated once per session.
                let next = regions.iter().copied().max().unwrap_or(0) + 1;
                (
                    Snapshot::Regions(regions.to_vec()),
                    AttributeClass::Regions,
                    next,
                )
            }
        };
        history.snapshot_before(class, 0..count);

        let field = build_influence(
            graph,
            seed,
            &FloodSettings {
                use_normals: options.use_normals,
                edge_sensitivity: options.edge_sensitivity as f32,
            },
        );
        let last_iteration = field.max_iteration().max(1);
        let initial_position = graph.position(seed);

        let mut session = Self {
            options,
            field,
            snapshot,
            new_region,
            initial_pointer: pointer,
            last_pointer: pointer,
            initial_position,
            current_iteration: 0,
            last_iteration,
            fast_forward: false,
            state: SessionState::Running,
            pivot: None,
        };
        session.run_apply(probe, 0, target, redraw);
        debug!(seed, last_iteration, "mask expand session started");
        Some(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn seed(&self) -> usize {
        self.field.seed()
    }

    pub fn current_iteration(&self) -> i32 {
        self.current_iteration
    }

    pub fn max_iteration(&self) -> i32 {
        self.field.max_iteration()
    }

    /// Centroid of the mask border band, available after a commit with
    /// pivot recomputation enabled.
    pub fn pivot(&self) -> Option<Vec3> {
        self.pivot
    }

    /// Feeds one host event through the state machine. Pointer moves and
    /// the fast-forward modifier re-derive the threshold and repaint when
    /// it changed; accept/cancel events finalize the session. Everything
    /// else is left for default handling.
    pub fn handle_event(
        &mut self,
        event: &UiEvent,
        graph: &impl Topology,
        probe: &impl HoverProbe,
        target: ExpandTarget<'_>,
        history: &mut dyn HistorySink,
        redraw: &mut dyn RedrawSink,
    ) -> EventOutcome {
        if self.state != SessionState::Running {
            return EventOutcome::Finished;
        }
        if target.len() != self.field.len() || target.is_regions() != self.is_region_mode() {
            warn!("target storage changed under the session; failing closed");
            self.rollback(target, history, redraw);
            return EventOutcome::Finished;
        }

        match event {
            UiEvent::ButtonPress(PointerButton::Secondary)
            | UiEvent::Key {
                code: KeyCode::Escape,
                pressed: true,
            } => {
                self.rollback(target, history, redraw);
                EventOutcome::Finished
            }
            UiEvent::ButtonRelease(PointerButton::Primary)
            | UiEvent::Key {
                code: KeyCode::Enter,
                pressed: true,
            } => {
                self.commit(graph, target, history, redraw);
                EventOutcome::Finished
            }
            UiEvent::PointerMove(position) => {
                self.last_pointer = *position;
                self.scrub(probe, target, redraw);
                EventOutcome::Running
            }
            UiEvent::ModifierChanged { fast_forward } => {
                self.fast_forward = *fast_forward;
                self.scrub(probe, target, redraw);
                EventOutcome::Running
            }
            _ => EventOutcome::Ignored,
        }
    }

    fn is_region_mode(&self) -> bool {
        matches!(self.snapshot, Snapshot::Regions(_))
    }

    /// Threshold candidate for the current pointer/modifier state, clamped
    /// to the field's range so over-range scrubs collapse onto the
    /// idempotence guard.
    fn candidate_threshold(&self, probe: &impl HoverProbe) -> i32 {
        let speed = self.options.pixels_per_step.max(1);
        let travelled = (self.last_pointer - self.initial_pointer).length() as i32;
        let mut candidate = 1 + travelled.abs() / speed;
        if self.options.follow_cursor {
            candidate = match probe.hit_test(self.last_pointer) {
                Some(vertex) if self.field.iteration(vertex) != ITERATION_UNSET => {
                    self.field.iteration(vertex)
                }
                // Off the surface (or on a part the flood never reached):
                // take the whole connected component.
                _ => self.last_iteration - FAST_FORWARD_MARGIN,
            };
        }
        if self.fast_forward {
            candidate = self.last_iteration - FAST_FORWARD_MARGIN;
        }
        candidate.clamp(0, self.last_iteration)
    }

    fn scrub(
        &mut self,
        probe: &impl HoverProbe,
        target: ExpandTarget<'_>,
        redraw: &mut dyn RedrawSink,
    ) {
        let candidate = self.candidate_threshold(probe);
        if candidate == self.current_iteration {
            return;
        }
        self.run_apply(probe, candidate, target, redraw);
        self.current_iteration = candidate;
    }

    fn run_apply(
        &self,
        probe: &impl HoverProbe,
        threshold: i32,
        target: ExpandTarget<'_>,
        redraw: &mut dyn RedrawSink,
    ) {
        let active = probe
            .active_vertex()
            .filter(|&vertex| vertex < self.field.len())
            .unwrap_or(self.field.seed());
        let settings = ApplySettings {
            threshold,
            use_normals: self.options.use_normals,
            invert: self.options.invert,
            keep_previous: self.options.keep_previous,
            active_normal_factor: self.field.normal_factor(active),
        };
        match target {
            ExpandTarget::Mask(mask) => {
                let Snapshot::Mask(prev) = &self.snapshot else {
                    return;
                };
                for range in apply_mask(&self.field, &settings, prev, mask) {
                    redraw.mark_dirty(range);
                }
            }
            ExpandTarget::Regions(regions) => {
                let Snapshot::Regions(prev) = &self.snapshot else {
                    return;
                };
                // Region assignment is not reversible per vertex: reset the
                // scratch from the snapshot, then re-apply.
                regions.copy_from_slice(prev);
                apply_regions(&self.field, &settings, self.new_region, regions);
                redraw.mark_dirty(0..regions.len());
            }
        }
        redraw.notify_attribute_changed();
    }

    fn commit(
        &mut self,
        graph: &impl Topology,
        target: ExpandTarget<'_>,
        history: &mut dyn HistorySink,
        redraw: &mut dyn RedrawSink,
    ) {
        if let ExpandTarget::Mask(mask) = target {
            let iterations = self.options.smooth_iterations as usize;
            if iterations > 0 {
                smooth_mask(graph, mask, iterations);
                redraw.mark_dirty(0..mask.len());
            }
            if self.options.recompute_pivot {
                self.pivot = mask_band_pivot(
                    graph,
                    mask,
                    self.initial_position,
                    self.options.symmetry,
                );
            }
        }
        history.commit_session();
        redraw.notify_attribute_changed();
        self.state = SessionState::Committed;
        debug!(
            threshold = self.current_iteration,
            "mask expand session committed"
        );
    }

    fn rollback(
        &mut self,
        target: ExpandTarget<'_>,
        history: &mut dyn HistorySink,
        redraw: &mut dyn RedrawSink,
    ) {
        match (target, &self.snapshot) {
            (ExpandTarget::Mask(mask), Snapshot::Mask(prev)) => {
                let len = mask.len().min(prev.len());
                mask[..len].copy_from_slice(&prev[..len]);
                redraw.mark_dirty(0..len);
            }
            (ExpandTarget::Regions(regions), Snapshot::Regions(prev)) => {
                let len = regions.len().min(prev.len());
                regions[..len].copy_from_slice(&prev[..len]);
                redraw.mark_dirty(0..len);
            }
            _ => {}
        }
        history.discard_session();
        redraw.notify_attribute_changed();
        self.state = SessionState::Cancelled;
        debug!("mask expand session cancelled");
    }
}

fn mask_band_pivot(
    graph: &impl Topology,
    mask: &[f32],
    initial: Vec3,
    symmetry: Symmetry,
) -> Option<Vec3> {
    let mut sum = Vec3::ZERO;
    let mut total = 0u32;
    for (vertex, &value) in mask.iter().enumerate() {
        if value > 0.5 - PIVOT_BAND && value < 0.5 + PIVOT_BAND {
            let position = graph.position(vertex);
            if symmetry.same_side(position, initial) {
                sum += position;
                total += 1;
            }
        }
    }
    (total > 0).then(|| sum / total as f32)
}
