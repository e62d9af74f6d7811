use super::Command;
use crate::document::Document;
use crate::error::{CommandError, CommandResult};

/// Manages the history of executed commands for undo/redo functionality
#[derive(Debug, Default)]
pub struct CommandHistory {
    /// Stack of commands that can be undone
    undo_stack: Vec<Command>,
    /// Stack of commands that can be redone
    redo_stack: Vec<Command>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute a command and add it to the history if successful
    pub fn execute(&mut self, command: Command, document: &mut Document) -> CommandResult {
        command.execute(document)?;
        self.record(command);
        Ok(())
    }

    /// Add a command whose effect is already in the document, such as a
    /// finished drag that was applied live
    pub fn record(&mut self, command: Command) {
        log::debug!("Recorded {}", command.label());
        self.undo_stack.push(command);
        self.redo_stack.clear();
    }

    /// Undo the last executed command
    pub fn undo(&mut self, document: &mut Document) -> CommandResult {
        let command = self.undo_stack.pop().ok_or(CommandError::InvalidState)?;
        if let Err(err) = command.inverse().execute(document) {
            log::warn!("Failed to undo {}: {}", command.label(), err);
            return Err(err);
        }
        log::debug!("Undid {}", command.label());
        self.redo_stack.push(command);
        Ok(())
    }

    /// Redo the last undone command
    pub fn redo(&mut self, document: &mut Document) -> CommandResult {
        let command = self.redo_stack.pop().ok_or(CommandError::InvalidState)?;
        if let Err(err) = command.execute(document) {
            log::warn!("Failed to redo {}: {}", command.label(), err);
            return Err(err);
        }
        log::debug!("Redid {}", command.label());
        self.undo_stack.push(command);
        Ok(())
    }

    /// Returns true if there are commands that can be undone
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if there are commands that can be redone
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspect::AspectRatio;
    use crate::config::EditorConfig;
    use crate::layer::Transform;
    use egui::{Pos2, Vec2};

    fn document_with_drawing() -> (Document, crate::layer::LayerId) {
        let config = EditorConfig {
            drawing_surface_size: 512,
            ..EditorConfig::default()
        };
        let mut document = Document::new(&config, AspectRatio::Square);
        let id = document.add_drawing_layer();
        (document, id)
    }

    #[test]
    fn transform_undo_and_redo() {
        let (mut document, id) = document_with_drawing();
        let old_transform = document.get(id).unwrap().transform;
        let new_transform = Transform::new(Pos2::new(5.0, 5.0), Vec2::splat(40.0));
        let mut history = CommandHistory::new();

        history
            .execute(
                Command::TransformLayer {
                    layer_id: id,
                    old_transform,
                    new_transform,
                },
                &mut document,
            )
            .unwrap();
        assert_eq!(document.get(id).unwrap().transform, new_transform);

        history.undo(&mut document).unwrap();
        assert_eq!(document.get(id).unwrap().transform, old_transform);
        assert!(history.can_redo());

        history.redo(&mut document).unwrap();
        assert_eq!(document.get(id).unwrap().transform, new_transform);
    }

    #[test]
    fn removed_layer_comes_back_at_its_index() {
        let (mut document, id) = document_with_drawing();
        let second = document.add_drawing_layer();
        let mut history = CommandHistory::new();

        let (layer, index) = document.remove_layer(id).unwrap();
        history.record(Command::RemoveLayer { layer, index });
        assert_eq!(document.len(), 2);

        history.undo(&mut document).unwrap();
        assert_eq!(document.index_of(id), Some(1));
        assert_eq!(document.index_of(second), Some(2));
    }

    #[test]
    fn new_command_clears_redo() {
        let (mut document, id) = document_with_drawing();
        let mut history = CommandHistory::new();
        history
            .execute(Command::SetVisibility { layer_id: id, visible: false }, &mut document)
            .unwrap();
        history.undo(&mut document).unwrap();
        assert!(document.get(id).unwrap().visible);

        history
            .execute(Command::SetVisibility { layer_id: id, visible: false }, &mut document)
            .unwrap();
        assert!(!history.can_redo());
        assert!(history.undo(&mut document).is_ok());
        assert_eq!(history.undo(&mut document), Err(CommandError::InvalidState));
    }
}
