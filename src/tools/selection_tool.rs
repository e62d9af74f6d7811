use egui::{Pos2, Rect};
use log::{debug, info};

use crate::command::Command;
use crate::document::Document;
use crate::geometry::handles::{Handle, handle_at, resized_transform, rotated_transform};
use crate::geometry::hit_testing::quad_intersects_rect;
use crate::layer::{Layer, LayerId, Transform};
use crate::state::InteractionState;
use crate::tools::{Pointer, Tool, ToolContext};

/// Selects, moves, resizes and rotates layers; pans and marquee-selects on empty canvas
#[derive(Debug, Clone, Copy)]
pub struct SelectionTool;

impl Tool for SelectionTool {
    fn name(&self) -> &'static str {
        "Select"
    }

    fn pointer_down(&self, ctx: &mut ToolContext<'_>, pointer: Pointer) {
        if let Some((layer_id, original, handle)) = active_handle_at(ctx, pointer.world) {
            let next = match handle {
                Handle::Rotate => InteractionState::Rotating {
                    layer_id,
                    start: pointer.world,
                    original,
                },
                handle => InteractionState::Resizing {
                    layer_id,
                    handle,
                    start: pointer.world,
                    original,
                },
            };
            ctx.transition(next);
            return;
        }

        if let Some(layer) = layer_at(ctx.document, pointer.world) {
            let (layer_id, original) = (layer.id, layer.transform);
            if pointer.has_modifier() {
                ctx.selection.toggle(layer_id);
                debug!("Toggled {} in selection ({} selected)", layer_id, ctx.selection.len());
                return;
            }
            ctx.selection.set_single(layer_id);
            ctx.transition(InteractionState::Dragging {
                layer_id,
                start: pointer.world,
                original,
            });
            return;
        }

        if pointer.has_modifier() {
            ctx.transition(InteractionState::Panning { last: pointer.screen });
        } else {
            ctx.transition(InteractionState::Marqueeing {
                start: pointer.world,
                current: pointer.world,
            });
        }
    }

    fn pointer_move(&self, ctx: &mut ToolContext<'_>, pointer: Pointer) {
        let transform = match ctx.interaction {
            InteractionState::Dragging {
                layer_id,
                start,
                original,
            } => Some((*layer_id, original.translated(pointer.world - *start))),
            InteractionState::Resizing {
                layer_id,
                handle,
                start,
                original,
            } => {
                let delta = pointer.world - *start;
                let (shift, min_size) = (pointer.modifiers.shift, ctx.config.min_layer_size);
                through_frame(ctx.document, *layer_id, original, |frame| {
                    resized_transform(frame, *handle, delta, shift, min_size)
                })
            }
            InteractionState::Rotating {
                layer_id,
                start,
                original,
            } => through_frame(ctx.document, *layer_id, original, |frame| {
                rotated_transform(frame, *start, pointer.world)
            }),
            InteractionState::Marqueeing { current, .. } => {
                *current = pointer.world;
                None
            }
            InteractionState::Panning { last } => {
                let delta = pointer.screen - *last;
                *last = pointer.screen;
                ctx.viewport.pan_by(delta);
                None
            }
            _ => None,
        };

        if let Some((layer_id, transform)) = transform {
            if let Err(err) = ctx.document.set_transform(layer_id, transform) {
                log::warn!("Dropping transform of {}: {}", layer_id, err);
                ctx.transition(InteractionState::Idle);
            }
        }
    }

    fn pointer_up(&self, ctx: &mut ToolContext<'_>, pointer: Pointer) {
        self.pointer_move(ctx, pointer);

        match std::mem::take(ctx.interaction) {
            InteractionState::Dragging { layer_id, original, .. }
            | InteractionState::Resizing { layer_id, original, .. }
            | InteractionState::Rotating { layer_id, original, .. } => {
                record_transform(ctx, layer_id, original);
            }
            InteractionState::Marqueeing { start, current } => {
                let rect = Rect::from_two_pos(start, current);
                let hits = marquee_hits(ctx.document, rect);
                if rect.area() > 0.0 {
                    ctx.selection.set_from_marquee(hits, rect);
                } else {
                    ctx.selection.clear();
                }
                debug!("Marquee {:?} selected {} layers", rect, ctx.selection.len());
            }
            _ => {}
        }
        debug!("Interaction -> idle");
    }
}

fn record_transform(ctx: &mut ToolContext<'_>, layer_id: LayerId, original: Transform) {
    let Some(layer) = ctx.document.get(layer_id) else {
        return;
    };
    if layer.transform == original {
        return;
    }
    info!("Transformed layer {} to {:?}", layer_id, layer.transform);
    ctx.history.record(Command::TransformLayer {
        layer_id,
        old_transform: original,
        new_transform: layer.transform,
    });
}

/// The handle of the active layer under `point`
fn active_handle_at(ctx: &ToolContext<'_>, point: Pos2) -> Option<(LayerId, Transform, Handle)> {
    let layer = ctx.document.get(ctx.selection.active()?)?;
    if !layer.visible || layer.is_background() {
        return None;
    }
    let handle = handle_at(point, &layer.frame()?, ctx.viewport.zoom, ctx.config)?;
    Some((layer.id, layer.transform, handle))
}

/// Apply `edit` to the layer's frame and map the result back to a layer placement.
///
/// Handles sit on the frame, which for drawing layers is the inked part only.
fn through_frame(
    document: &Document,
    layer_id: LayerId,
    original: &Transform,
    edit: impl FnOnce(&Transform) -> Transform,
) -> Option<(LayerId, Transform)> {
    let part = document.get(layer_id)?.normalized_region()?;
    let frame = edit(&original.sub_frame(part));
    Some((layer_id, Transform::from_sub_frame(&frame, part)))
}

/// Topmost visible, selectable layer under `point`, in paint order
pub fn layer_at(document: &Document, point: Pos2) -> Option<&Layer> {
    document
        .resolved_order()
        .into_iter()
        .rev()
        .filter(|layer| layer.visible && !layer.is_background())
        .find(|layer| layer.contains_point(point))
}

/// Visible, selectable layers whose hit region touches `rect`, in document order
pub fn marquee_hits(document: &Document, rect: Rect) -> Vec<LayerId> {
    document
        .layers()
        .iter()
        .filter(|layer| layer.visible && !layer.is_background())
        .filter(|layer| layer.hit_quad().is_some_and(|quad| quad_intersects_rect(&quad, rect)))
        .map(|layer| layer.id)
        .collect()
}
