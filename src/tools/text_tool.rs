use crate::paint::{Brush, Mark};
use crate::state::InteractionState;
use crate::tools::draw_tool::commit_mark;
use crate::tools::{Pointer, Tool, ToolContext};

/// Places text annotations. A click opens an entry; typing fills it; Enter or
/// a click elsewhere commits it.
#[derive(Debug, Clone, Copy)]
pub struct TextTool;

impl Tool for TextTool {
    fn name(&self) -> &'static str {
        "Text"
    }

    fn pointer_down(&self, ctx: &mut ToolContext<'_>, pointer: Pointer) {
        commit_text(ctx);
        let layer_id = ctx.drawing_target();
        ctx.transition(InteractionState::TextEntry {
            layer_id,
            position: pointer.world,
            buffer: String::new(),
        });
    }

    fn pointer_move(&self, _ctx: &mut ToolContext<'_>, _pointer: Pointer) {}

    fn pointer_up(&self, _ctx: &mut ToolContext<'_>, _pointer: Pointer) {}
}

/// Paint the pending text entry, if any, and record it as an annotation.
///
/// Blank entries are dropped. Returns true if text was committed.
pub fn commit_text(ctx: &mut ToolContext<'_>) -> bool {
    if !ctx.interaction.is_text_entry() {
        return false;
    }
    let InteractionState::TextEntry {
        layer_id,
        position,
        buffer,
    } = std::mem::take(ctx.interaction)
    else {
        return false;
    };

    let text = buffer.trim().to_owned();
    if text.is_empty() {
        return false;
    }

    let brush = Brush::new(ctx.config.stroke_color(), ctx.config.stroke_width);
    let size = ctx.config.text_size;
    let annotation = text.clone();
    commit_mark(ctx, layer_id, &brush, |to_local| Mark::Text {
        position: to_local(position),
        text,
        size,
    });
    log::info!("Committed text annotation {:?}", annotation);
    ctx.annotations.push(annotation);
    true
}

/// Discard the pending text entry without painting it
pub fn cancel_text(ctx: &mut ToolContext<'_>) {
    if ctx.interaction.is_text_entry() {
        log::debug!("Cancelled text entry");
        *ctx.interaction = InteractionState::Idle;
    }
}
