mod config;
mod controller;
mod events;
mod host;

pub use config::{ExpandOptions, Symmetry};
pub use controller::{ExpandSession, ExpandTarget, SessionState, FAST_FORWARD_MARGIN};
pub use events::{EventOutcome, KeyCode, PointerButton, UiEvent};
pub use host::{AttributeClass, HistorySink, HoverProbe, RedrawSink};
