use crate::document::Document;
use crate::error::{CommandError, CommandResult};
use crate::layer::{Layer, LayerId, Transform};

/// Undoable edits of the layer structure and layer placement.
///
/// Paint on drawing surfaces is not part of the history.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Insert a layer record at `index`
    AddLayer { layer: Layer, index: usize },

    /// Remove a layer, remembering where it was
    RemoveLayer { layer: Layer, index: usize },

    /// Move, resize or rotate a layer
    TransformLayer {
        layer_id: LayerId,
        old_transform: Transform,
        new_transform: Transform,
    },

    SetVisibility { layer_id: LayerId, visible: bool },

    ReorderLayer {
        layer_id: LayerId,
        old_index: usize,
        new_index: usize,
    },

    /// Several commands applied and undone as one step
    Batch(Vec<Command>),
}

impl Command {
    /// Apply the command to the document
    pub fn execute(&self, document: &mut Document) -> CommandResult {
        match self {
            Command::AddLayer { layer, index } => {
                if document.index_of(layer.id).is_some() {
                    return Err(CommandError::InvalidState);
                }
                document.insert_layer(*index, layer.clone());
                Ok(())
            }
            Command::RemoveLayer { layer, .. } => document.remove_layer(layer.id).map(|_| ()),
            Command::TransformLayer {
                layer_id,
                new_transform,
                ..
            } => document.set_transform(*layer_id, *new_transform),
            Command::SetVisibility { layer_id, visible } => document.set_visibility(*layer_id, *visible),
            Command::ReorderLayer {
                layer_id,
                new_index,
                ..
            } => document.move_to_index(*layer_id, *new_index),
            Command::Batch(commands) => commands.iter().try_for_each(|command| command.execute(document)),
        }
    }

    /// The command that reverts this one
    pub fn inverse(&self) -> Command {
        match self {
            Command::AddLayer { layer, index } => Command::RemoveLayer {
                layer: layer.clone(),
                index: *index,
            },
            Command::RemoveLayer { layer, index } => Command::AddLayer {
                layer: layer.clone(),
                index: *index,
            },
            Command::TransformLayer {
                layer_id,
                old_transform,
                new_transform,
            } => Command::TransformLayer {
                layer_id: *layer_id,
                old_transform: *new_transform,
                new_transform: *old_transform,
            },
            Command::SetVisibility { layer_id, visible } => Command::SetVisibility {
                layer_id: *layer_id,
                visible: !*visible,
            },
            Command::ReorderLayer {
                layer_id,
                old_index,
                new_index,
            } => Command::ReorderLayer {
                layer_id: *layer_id,
                old_index: *new_index,
                new_index: *old_index,
            },
            Command::Batch(commands) => Command::Batch(commands.iter().rev().map(Command::inverse).collect()),
        }
    }

    /// Short description used in logs
    pub fn label(&self) -> &'static str {
        match self {
            Command::AddLayer { .. } => "add layer",
            Command::RemoveLayer { .. } => "remove layer",
            Command::TransformLayer { .. } => "transform layer",
            Command::SetVisibility { .. } => "set visibility",
            Command::ReorderLayer { .. } => "reorder layer",
            Command::Batch(_) => "batch",
        }
    }
}
