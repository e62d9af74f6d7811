//! The pointer-driven interaction state machine.
//!
//! ```text
//!          ┌──► Dragging / Resizing / Rotating ──┐
//!          ├──► Marqueeing / Panning ────────────┤
//!   Idle ──┼──► Painting / Shaping ──────────────┼──► Idle
//!          └──► TextEntry ───────────────────────┘
//! ```
//!
//! Every state except `Idle` and `TextEntry` lasts from a pointer press to its
//! release. `TextEntry` stays open until the text is committed or cancelled.

use egui::Pos2;

use crate::geometry::handles::Handle;
use crate::layer::{LayerId, Transform};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rect,
    Arrow,
}

/// What the pointer is currently doing. All points are in world space unless
/// noted otherwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InteractionState {
    #[default]
    Idle,
    /// Moving a layer by its body
    Dragging {
        layer_id: LayerId,
        start: Pos2,
        original: Transform,
    },
    Resizing {
        layer_id: LayerId,
        handle: Handle,
        start: Pos2,
        original: Transform,
    },
    Rotating {
        layer_id: LayerId,
        start: Pos2,
        original: Transform,
    },
    /// Rubber-band selection
    Marqueeing { start: Pos2, current: Pos2 },
    /// Panning the viewport; `last` is in screen space
    Panning { last: Pos2 },
    /// Freehand pencil or eraser stroke
    Painting {
        layer_id: LayerId,
        points: Vec<Pos2>,
        erase: bool,
    },
    Shaping {
        layer_id: LayerId,
        kind: ShapeKind,
        start: Pos2,
        current: Pos2,
    },
    /// Typing a text annotation anchored at `position`
    TextEntry {
        layer_id: LayerId,
        position: Pos2,
        buffer: String,
    },
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    /// Returns true while a layer transform is being edited
    pub fn is_transforming(&self) -> bool {
        matches!(
            self,
            InteractionState::Dragging { .. }
                | InteractionState::Resizing { .. }
                | InteractionState::Rotating { .. }
        )
    }

    /// Returns true while paint is being laid down but not yet committed
    pub fn is_drawing(&self) -> bool {
        matches!(
            self,
            InteractionState::Painting { .. }
                | InteractionState::Shaping { .. }
                | InteractionState::TextEntry { .. }
        )
    }

    pub fn is_text_entry(&self) -> bool {
        matches!(self, InteractionState::TextEntry { .. })
    }

    /// The layer the current operation targets, if any
    pub fn layer_id(&self) -> Option<LayerId> {
        match self {
            InteractionState::Dragging { layer_id, .. }
            | InteractionState::Resizing { layer_id, .. }
            | InteractionState::Rotating { layer_id, .. }
            | InteractionState::Painting { layer_id, .. }
            | InteractionState::Shaping { layer_id, .. }
            | InteractionState::TextEntry { layer_id, .. } => Some(*layer_id),
            InteractionState::Idle
            | InteractionState::Marqueeing { .. }
            | InteractionState::Panning { .. } => None,
        }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::Dragging { .. } => "dragging",
            InteractionState::Resizing { .. } => "resizing",
            InteractionState::Rotating { .. } => "rotating",
            InteractionState::Marqueeing { .. } => "marqueeing",
            InteractionState::Panning { .. } => "panning",
            InteractionState::Painting { .. } => "painting",
            InteractionState::Shaping { .. } => "shaping",
            InteractionState::TextEntry { .. } => "text entry",
        }
    }
}
