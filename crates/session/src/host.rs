use std::ops::Range;

use glam::Vec2;

/// Attribute class a history snapshot covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeClass {
    Mask,
    Regions,
}

/// Live cursor queries against the host's view of the surface. The active
/// vertex is re-queried on every apply so the comparison point in
/// normal-weighted mode follows the cursor.
pub trait HoverProbe {
    fn active_vertex(&self) -> Option<usize>;
    fn hit_test(&self, screen: Vec2) -> Option<usize>;
}

/// Undo/history collaborator. The session snapshots before its first
/// mutation; over-snapshotting is legal, under-snapshotting is not.
pub trait HistorySink {
    fn snapshot_before(&mut self, class: AttributeClass, scope: Range<usize>);
    fn commit_session(&mut self);
    fn discard_session(&mut self);
}

/// Redraw/notification collaborator, bound by the host to the one surface
/// the session addresses.
pub trait RedrawSink {
    fn mark_dirty(&mut self, vertices: Range<usize>);
    fn notify_attribute_changed(&mut self);
}
