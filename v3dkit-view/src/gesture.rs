//! Drag gesture selection

use serde::{Deserialize, Serialize};

/// Camera operation driven by a mouse drag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DragMode {
    #[default]
    Rotate,
    Shift,
    Zoom,
    Pan,
}

impl DragMode {
    /// Pick the mode from held modifier keys; exactly one of ctrl/shift/alt selects
    /// Shift/Zoom/Pan, anything else rotates
    pub fn from_modifiers(ctrl: bool, shift: bool, alt: bool) -> Self {
        match (ctrl, shift, alt) {
            (true, false, false) => DragMode::Shift,
            (false, true, false) => DragMode::Zoom,
            (false, false, true) => DragMode::Pan,
            _ => DragMode::Rotate,
        }
    }
}

/// Mouse wheel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDirection {
    In,
    Out,
}

impl WheelDirection {
    /// Positive wheel deltas zoom in
    pub fn from_delta(delta: f32) -> Self {
        if delta < 0.0 {
            WheelDirection::Out
        } else {
            WheelDirection::In
        }
    }
}
