use egui::Pos2;

use crate::config::EditorConfig;
use crate::geometry::transform::world_to_local;
use crate::layer::LayerId;
use crate::paint::{Brush, Mark, paint_on_layer};
use crate::state::{InteractionState, ShapeKind};
use crate::tools::{Pointer, Tool, ToolContext};

/// Points closer than this (in screen pixels) to the previous one are dropped
const MIN_POINT_SPACING: f32 = 0.5;

/// Pencil and eraser
#[derive(Debug, Clone, Copy)]
pub struct FreehandTool {
    pub erase: bool,
}

impl Tool for FreehandTool {
    fn name(&self) -> &'static str {
        if self.erase { "Eraser" } else { "Pencil" }
    }

    fn pointer_down(&self, ctx: &mut ToolContext<'_>, pointer: Pointer) {
        let layer_id = ctx.drawing_target();
        ctx.transition(InteractionState::Painting {
            layer_id,
            points: vec![pointer.world],
            erase: self.erase,
        });
    }

    fn pointer_move(&self, ctx: &mut ToolContext<'_>, pointer: Pointer) {
        let spacing = MIN_POINT_SPACING / ctx.viewport.zoom;
        if let InteractionState::Painting { points, .. } = ctx.interaction {
            if points.last().is_none_or(|last| last.distance(pointer.world) >= spacing) {
                points.push(pointer.world);
            }
        }
    }

    fn pointer_up(&self, ctx: &mut ToolContext<'_>, pointer: Pointer) {
        self.pointer_move(ctx, pointer);
        let InteractionState::Painting { layer_id, points, erase } = std::mem::take(ctx.interaction) else {
            return;
        };
        let brush = freehand_brush(ctx.config, erase);
        commit_mark(ctx, layer_id, &brush, |to_local| {
            Mark::Freehand(points.iter().map(|p| to_local(*p)).collect())
        });
    }
}

/// Rectangle and arrow
#[derive(Debug, Clone, Copy)]
pub struct ShapeTool {
    pub kind: ShapeKind,
}

impl Tool for ShapeTool {
    fn name(&self) -> &'static str {
        match self.kind {
            ShapeKind::Rect => "Rectangle",
            ShapeKind::Arrow => "Arrow",
        }
    }

    fn pointer_down(&self, ctx: &mut ToolContext<'_>, pointer: Pointer) {
        let layer_id = ctx.drawing_target();
        ctx.transition(InteractionState::Shaping {
            layer_id,
            kind: self.kind,
            start: pointer.world,
            current: pointer.world,
        });
    }

    fn pointer_move(&self, ctx: &mut ToolContext<'_>, pointer: Pointer) {
        if let InteractionState::Shaping { current, .. } = ctx.interaction {
            *current = pointer.world;
        }
    }

    fn pointer_up(&self, ctx: &mut ToolContext<'_>, pointer: Pointer) {
        self.pointer_move(ctx, pointer);
        let InteractionState::Shaping {
            layer_id,
            kind,
            start,
            current,
        } = std::mem::take(ctx.interaction)
        else {
            return;
        };

        match kind {
            ShapeKind::Arrow if start.distance(current) < ctx.config.min_arrow_length => {
                log::debug!("Skipping arrow shorter than {}", ctx.config.min_arrow_length);
                return;
            }
            ShapeKind::Rect if start == current => return,
            _ => {}
        }

        let brush = Brush::new(ctx.config.stroke_color(), ctx.config.stroke_width);
        commit_mark(ctx, layer_id, &brush, |to_local| {
            let (from, to) = (to_local(start), to_local(current));
            match kind {
                ShapeKind::Rect => Mark::Rect { from, to },
                ShapeKind::Arrow => Mark::Arrow { from, to },
            }
        });
    }
}

pub(crate) fn freehand_brush(config: &EditorConfig, erase: bool) -> Brush {
    if erase {
        Brush::eraser(config.eraser_width)
    } else {
        Brush::new(config.stroke_color(), config.stroke_width)
    }
}

/// Paint a mark built in layer-local space onto `layer_id` and re-wrap the layer.
///
/// `build` receives the world-to-local mapping of the layer's current transform.
pub(crate) fn commit_mark(
    ctx: &mut ToolContext<'_>,
    layer_id: LayerId,
    brush: &Brush,
    build: impl FnOnce(&dyn Fn(Pos2) -> Pos2) -> Mark,
) {
    let Some(layer) = ctx.document.get(layer_id) else {
        log::warn!("Drawing layer {} disappeared before commit", layer_id);
        return;
    };
    let transform = layer.transform;
    let mark = build(&|world| world_to_local(world, &transform));

    if !paint_on_layer(layer, &mark, brush) {
        log::warn!("Layer {} has no drawing surface", layer_id);
        return;
    }
    if let Err(err) = ctx.document.touch(layer_id) {
        log::warn!("Failed to publish paint on {}: {}", layer_id, err);
    }
}
