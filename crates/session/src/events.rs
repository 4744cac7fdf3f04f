use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Enter,
    Escape,
    /// Any key the session does not consume.
    Other,
}

/// Tagged event stream delivered by the host while a session is running.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiEvent {
    PointerMove(Vec2),
    ButtonPress(PointerButton),
    ButtonRelease(PointerButton),
    Key { code: KeyCode, pressed: bool },
    ModifierChanged { fast_forward: bool },
}

/// What the controller did with an event. `Ignored` events are not
/// consumed and stay available for the host's default handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Running,
    Finished,
    Ignored,
}
