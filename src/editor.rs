//! The editing session: document, selection, viewport, active tool and the
//! interaction state machine that routes canvas input between them.
//!
//! ```text
//!              pointer down                 pointer up
//!   ┌──────┐ ───────────────► ┌───────────┐ ──────────► ┌──────┐
//!   │ Idle │                  │ Dragging  │             │ Idle │
//!   └──────┘                  │ Resizing  │             └──────┘
//!      │                      │ Rotating  │
//!      │ Text tool click      │ Marquee   │
//!      ▼                      │ Panning   │
//!   ┌───────────┐  Enter      │ Painting  │
//!   │ TextEntry ├──────────►  │ Shaping   │
//!   └───────────┘  Escape     └───────────┘
//! ```

use egui::{CursorIcon, Key, Modifiers, Pos2, Vec2};
use image::DynamicImage;

use crate::aspect::AspectRatio;
use crate::command::{Command, CommandHistory};
use crate::config::EditorConfig;
use crate::document::Document;
use crate::error::{CommandError, CommandResult, EditorResult};
use crate::export::{ExportedRegion, GenerationRequest, export_region};
use crate::geometry::handles::handle_at;
use crate::geometry::transform::Viewport;
use crate::input::InputEvent;
use crate::layer::LayerId;
use crate::selection::Selection;
use crate::state::InteractionState;
use crate::tools::{self, Pointer, Tool, ToolContext, ToolKind, layer_at};

/// Scroll distance, in points, that zooms by one `zoom_step`
const SCROLL_NOTCH: f32 = 50.0;

pub struct Editor {
    config: EditorConfig,
    document: Document,
    selection: Selection,
    viewport: Viewport,
    tool: ToolKind,
    interaction: InteractionState,
    history: CommandHistory,
    text_annotations: Vec<String>,
    aspect_ratio: AspectRatio,
    /// Last world position of the pointer over the canvas
    hover: Option<Pos2>,
}

impl Editor {
    /// An empty session holding only the background artboard
    pub fn new(config: EditorConfig, aspect_ratio: AspectRatio) -> Self {
        let document = Document::new(&config, aspect_ratio);
        let selection = Selection::new(config.max_selection);
        Self {
            config,
            document,
            selection,
            viewport: Viewport::default(),
            tool: ToolKind::default(),
            interaction: InteractionState::Idle,
            history: CommandHistory::new(),
            text_annotations: Vec::new(),
            aspect_ratio,
            hover: None,
        }
    }

    /// A session opened on a source image, placed at the middle of the view
    pub fn with_source_image(
        config: EditorConfig,
        image: &DynamicImage,
        aspect_ratio: AspectRatio,
    ) -> EditorResult<Self> {
        let mut editor = Self::new(config, aspect_ratio);
        editor
            .document
            .add_dynamic_image(image, "Source image", &editor.viewport)?;
        Ok(editor)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Direct document access. Edits made here bypass the undo history.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    /// Text committed on the canvas so far, in commit order
    pub fn text_annotations(&self) -> &[String] {
        &self.text_annotations
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Switch tools. A pending text entry is committed and any other
    /// interaction is dropped.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if tool == self.tool {
            return;
        }
        self.commit_text();
        self.interaction = InteractionState::Idle;
        log::info!("Tool {} -> {}", self.tool.name(), tool.name());
        self.tool = tool;
    }

    /// Track the size of the canvas widget
    pub fn set_viewport_size(&mut self, size: Vec2) {
        self.viewport.set_size(size);
    }

    pub fn handle_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::PointerDown { position, modifiers } => {
                let pointer = self.pointer(*position, *modifiers);
                let tool = self.tool;
                let mut ctx = self.tool_context();
                // Clicking anywhere with another tool confirms the entry
                if tool != ToolKind::Text {
                    tools::commit_text(&mut ctx);
                }
                tool.pointer_down(&mut ctx, pointer);
            }
            InputEvent::PointerMove { position, modifiers } => {
                let pointer = self.pointer(*position, *modifiers);
                self.hover = Some(pointer.world);
                let tool = self.tool;
                tool.pointer_move(&mut self.tool_context(), pointer);
            }
            InputEvent::PointerUp { position, modifiers } => {
                let pointer = self.pointer(*position, *modifiers);
                let tool = self.tool;
                tool.pointer_up(&mut self.tool_context(), pointer);
            }
            InputEvent::Scroll { position, delta } => {
                let factor = self.config.zoom_step.powf(delta / SCROLL_NOTCH);
                self.viewport
                    .zoom_at(*position, factor, self.config.min_zoom, self.config.max_zoom);
            }
            InputEvent::KeyDown { key, modifiers } => self.handle_key(*key, *modifiers),
            InputEvent::Text(text) => {
                if let InteractionState::TextEntry { buffer, .. } = &mut self.interaction {
                    buffer.extend(text.chars().filter(|c| !c.is_control()));
                }
            }
        }
    }

    fn handle_key(&mut self, key: Key, modifiers: Modifiers) {
        if self.interaction.is_text_entry() {
            match key {
                Key::Enter => {
                    self.commit_text();
                }
                Key::Escape => tools::cancel_text(&mut self.tool_context()),
                Key::Backspace => {
                    if let InteractionState::TextEntry { buffer, .. } = &mut self.interaction {
                        buffer.pop();
                    }
                }
                _ => {}
            }
            return;
        }
        // Keys do not interrupt a pointer gesture
        if !self.interaction.is_idle() {
            return;
        }

        if modifiers.command {
            let result = match key {
                Key::Z if modifiers.shift => self.redo(),
                Key::Z => self.undo(),
                Key::Y => self.redo(),
                _ => return,
            };
            if let Err(err) = result {
                log::debug!("Shortcut {:?} ignored: {}", key, err);
            }
            return;
        }

        match key {
            Key::Delete | Key::Backspace => {
                if let Err(err) = self.delete_selected() {
                    log::warn!("Failed to delete selection: {}", err);
                }
            }
            Key::Escape => self.selection.clear(),
            _ => {
                if let Some(tool) = ToolKind::from_shortcut(key) {
                    self.set_tool(tool);
                }
            }
        }
    }

    /// Commit the pending text entry. Returns true if text was painted.
    pub fn commit_text(&mut self) -> bool {
        tools::commit_text(&mut self.tool_context())
    }

    pub fn undo(&mut self) -> CommandResult {
        self.history.undo(&mut self.document)?;
        self.prune_selection();
        Ok(())
    }

    pub fn redo(&mut self) -> CommandResult {
        self.history.redo(&mut self.document)?;
        self.prune_selection();
        Ok(())
    }

    /// Remove every selected layer as one undoable step.
    ///
    /// Returns the number of layers removed.
    pub fn delete_selected(&mut self) -> Result<usize, CommandError> {
        let mut removals: Vec<(usize, LayerId)> = self
            .selection
            .ids()
            .iter()
            .filter(|id| !id.is_background())
            .filter_map(|id| Some((self.document.index_of(*id)?, *id)))
            .collect();
        if removals.is_empty() {
            return Ok(0);
        }
        // Highest index first so the recorded indices stay valid while undoing in reverse
        removals.sort_by(|a, b| b.0.cmp(&a.0));

        let commands: Vec<Command> = removals
            .iter()
            .filter_map(|(index, id)| {
                self.document.get(*id).map(|layer| Command::RemoveLayer {
                    layer: layer.clone(),
                    index: *index,
                })
            })
            .collect();
        let count = commands.len();
        self.history
            .execute(Command::Batch(commands), &mut self.document)?;
        self.selection.clear();
        log::info!("Deleted {} selected layers", count);
        Ok(count)
    }

    /// Replace the selection with one layer, as a plain click would
    pub fn select_layer(&mut self, id: LayerId) {
        if id.is_background() || self.document.get(id).is_none() {
            return;
        }
        self.selection.set_single(id);
    }

    pub fn toggle_visibility(&mut self, id: LayerId) -> CommandResult {
        let layer = self.document.get(id).ok_or(CommandError::LayerNotFound(id))?;
        let command = Command::SetVisibility {
            layer_id: id,
            visible: !layer.visible,
        };
        self.history.execute(command, &mut self.document)
    }

    /// Move a layer to `index` in document order
    pub fn move_layer(&mut self, id: LayerId, index: usize) -> CommandResult {
        if id.is_background() {
            return Err(CommandError::BackgroundLocked);
        }
        let old_index = self.document.index_of(id).ok_or(CommandError::LayerNotFound(id))?;
        let new_index = index.clamp(1, self.document.len().saturating_sub(1).max(1));
        if old_index == new_index {
            return Ok(());
        }
        self.history.execute(
            Command::ReorderLayer {
                layer_id: id,
                old_index,
                new_index,
            },
            &mut self.document,
        )
    }

    pub fn remove_layer(&mut self, id: LayerId) -> CommandResult {
        if id.is_background() {
            return Err(CommandError::BackgroundLocked);
        }
        let index = self.document.index_of(id).ok_or(CommandError::LayerNotFound(id))?;
        let layer = self.document.layers()[index].clone();
        self.history
            .execute(Command::RemoveLayer { layer, index }, &mut self.document)?;
        self.prune_selection();
        Ok(())
    }

    /// Decode an image and add it as a new, selected layer in the middle of the view
    pub fn add_image_from_bytes(&mut self, bytes: &[u8], name: impl Into<String>) -> EditorResult<LayerId> {
        let id = self.document.add_image_from_bytes(bytes, name, &self.viewport)?;
        if let (Some(index), Some(layer)) = (self.document.index_of(id), self.document.get(id)) {
            self.history.record(Command::AddLayer {
                layer: layer.clone(),
                index,
            });
        }
        self.selection.set_single(id);
        Ok(id)
    }

    /// Flatten the current export region. A pending text entry is committed first.
    pub fn export(&mut self) -> EditorResult<ExportedRegion> {
        self.commit_text();
        export_region(self.document.layers(), &self.selection, &self.config)
    }

    /// Export and package the result with the user's instruction and the
    /// annotations typed on the canvas
    pub fn generation_request(&mut self, instruction: &str) -> EditorResult<GenerationRequest> {
        let region = self.export()?;
        GenerationRequest::new(&region, instruction, &self.text_annotations, self.aspect_ratio)
    }

    /// Cursor matching the current interaction or what is under the pointer
    pub fn cursor_icon(&self) -> CursorIcon {
        match &self.interaction {
            InteractionState::Dragging { .. } | InteractionState::Panning { .. } => CursorIcon::Grabbing,
            InteractionState::Resizing { handle, .. } => handle.cursor_icon(),
            InteractionState::Rotating { .. } => CursorIcon::Alias,
            InteractionState::Painting { .. } | InteractionState::Shaping { .. } => CursorIcon::Crosshair,
            InteractionState::TextEntry { .. } => CursorIcon::Text,
            InteractionState::Marqueeing { .. } | InteractionState::Idle => match self.tool {
                ToolKind::Select => self.hover.map_or(CursorIcon::Default, |point| self.hover_cursor(point)),
                ToolKind::Text => CursorIcon::Text,
                _ => CursorIcon::Crosshair,
            },
        }
    }

    fn hover_cursor(&self, point: Pos2) -> CursorIcon {
        let handle = self
            .selection
            .active()
            .and_then(|id| self.document.get(id))
            .filter(|layer| layer.visible)
            .and_then(|layer| layer.frame())
            .and_then(|frame| handle_at(point, &frame, self.viewport.zoom, &self.config));
        if let Some(handle) = handle {
            return handle.cursor_icon();
        }
        if layer_at(&self.document, point).is_some() {
            CursorIcon::Grab
        } else {
            CursorIcon::Default
        }
    }

    fn pointer(&self, screen: Pos2, modifiers: Modifiers) -> Pointer {
        Pointer {
            screen,
            world: self.viewport.screen_to_world(screen),
            modifiers,
        }
    }

    fn tool_context(&mut self) -> ToolContext<'_> {
        ToolContext {
            config: &self.config,
            document: &mut self.document,
            selection: &mut self.selection,
            viewport: &mut self.viewport,
            interaction: &mut self.interaction,
            history: &mut self.history,
            annotations: &mut self.text_annotations,
        }
    }

    /// Forget selected layers that no longer exist
    fn prune_selection(&mut self) {
        let document = &self.document;
        self.selection.retain(|id| document.get(id).is_some());
        // Undo from the panel can remove the layer an open text entry targets
        if let Some(id) = self.interaction.layer_id() {
            if document.get(id).is_none() {
                log::debug!("Dropping {} on removed layer {}", self.interaction.name(), id);
                self.interaction = InteractionState::Idle;
            }
        }
    }
}
