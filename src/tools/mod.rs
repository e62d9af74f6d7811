use egui::{Key, Modifiers, Pos2};

use crate::command::CommandHistory;
use crate::config::EditorConfig;
use crate::document::Document;
use crate::geometry::transform::Viewport;
use crate::layer::{Layer, LayerId};
use crate::selection::Selection;
use crate::state::{InteractionState, ShapeKind};

mod draw_tool;
mod selection_tool;
mod text_tool;

pub use draw_tool::{FreehandTool, ShapeTool};
pub(crate) use draw_tool::freehand_brush;
pub use selection_tool::{SelectionTool, layer_at, marquee_hits};
pub use text_tool::{TextTool, cancel_text, commit_text};

/// A pointer event resolved against the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    /// Canvas-space position
    pub screen: Pos2,
    /// World-space position
    pub world: Pos2,
    pub modifiers: Modifiers,
}

impl Pointer {
    /// Shift or the platform command key: toggles selection and pans
    pub fn has_modifier(&self) -> bool {
        self.modifiers.shift || self.modifiers.command
    }
}

/// Everything a tool may read or change while handling a pointer event
pub struct ToolContext<'a> {
    pub config: &'a EditorConfig,
    pub document: &'a mut Document,
    pub selection: &'a mut Selection,
    pub viewport: &'a mut Viewport,
    pub interaction: &'a mut InteractionState,
    pub history: &'a mut CommandHistory,
    pub annotations: &'a mut Vec<String>,
}

impl ToolContext<'_> {
    /// Switch interaction state, logging the transition
    pub fn transition(&mut self, next: InteractionState) {
        if std::mem::discriminant(self.interaction) != std::mem::discriminant(&next) {
            log::debug!("Interaction {} -> {}", self.interaction.name(), next.name());
        }
        *self.interaction = next;
    }

    /// The drawing layer new paint goes to: the active layer if it is a
    /// drawing layer, else the topmost drawing layer, else a new one
    pub fn drawing_target(&mut self) -> LayerId {
        if let Some(active) = self.selection.active() {
            if self.document.get(active).is_some_and(Layer::is_drawing) {
                return active;
            }
        }
        if let Some(topmost) = self.document.topmost_drawing() {
            return topmost;
        }
        self.document.add_drawing_layer()
    }
}

/// Tool trait defines the interface for all canvas tools
pub trait Tool {
    fn name(&self) -> &'static str;

    /// Handle pointer press on the canvas
    fn pointer_down(&self, ctx: &mut ToolContext<'_>, pointer: Pointer);

    /// Handle pointer movement, with or without the button held
    fn pointer_move(&self, ctx: &mut ToolContext<'_>, pointer: Pointer);

    /// Handle pointer release after a press on the canvas
    fn pointer_up(&self, ctx: &mut ToolContext<'_>, pointer: Pointer);
}

/// All available tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Pencil,
    Eraser,
    Rect,
    Arrow,
    Text,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        ToolKind::Select,
        ToolKind::Pencil,
        ToolKind::Eraser,
        ToolKind::Rect,
        ToolKind::Arrow,
        ToolKind::Text,
    ];

    /// Single-key shortcut that switches to the tool
    pub fn shortcut(&self) -> Key {
        match self {
            ToolKind::Select => Key::V,
            ToolKind::Pencil => Key::P,
            ToolKind::Eraser => Key::E,
            ToolKind::Rect => Key::R,
            ToolKind::Arrow => Key::A,
            ToolKind::Text => Key::T,
        }
    }

    pub fn from_shortcut(key: Key) -> Option<ToolKind> {
        Self::ALL.into_iter().find(|tool| tool.shortcut() == key)
    }

    fn tool(&self) -> &'static dyn Tool {
        match self {
            ToolKind::Select => &SelectionTool,
            ToolKind::Pencil => &FreehandTool { erase: false },
            ToolKind::Eraser => &FreehandTool { erase: true },
            ToolKind::Rect => &ShapeTool { kind: ShapeKind::Rect },
            ToolKind::Arrow => &ShapeTool { kind: ShapeKind::Arrow },
            ToolKind::Text => &TextTool,
        }
    }
}

impl Tool for ToolKind {
    fn name(&self) -> &'static str {
        self.tool().name()
    }

    fn pointer_down(&self, ctx: &mut ToolContext<'_>, pointer: Pointer) {
        self.tool().pointer_down(ctx, pointer)
    }

    fn pointer_move(&self, ctx: &mut ToolContext<'_>, pointer: Pointer) {
        self.tool().pointer_move(ctx, pointer)
    }

    fn pointer_up(&self, ctx: &mut ToolContext<'_>, pointer: Pointer) {
        self.tool().pointer_up(ctx, pointer)
    }
}
