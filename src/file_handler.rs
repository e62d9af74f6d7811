use eframe::egui;

use crate::editor::Editor;
use crate::layer::LayerId;

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "webp", "bmp"];

/// Turns files dropped on the window into image layers
#[derive(Debug, Default)]
pub struct FileHandler {
    dropped_files: Vec<egui::DroppedFile>,
}

impl FileHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect files dropped this frame. Returns true if there are any.
    pub fn check_for_dropped_files(&mut self, ctx: &egui::Context) -> bool {
        ctx.input(|i| {
            if !i.raw.dropped_files.is_empty() {
                self.dropped_files.extend(i.raw.dropped_files.iter().cloned());
            }
        });
        !self.dropped_files.is_empty()
    }

    /// Add every collected image to the editor, returning the new layer ids.
    ///
    /// Unsupported or unreadable files are logged and skipped.
    pub fn process_dropped_files(&mut self, editor: &mut Editor) -> Vec<LayerId> {
        let mut added = Vec::new();
        for file in std::mem::take(&mut self.dropped_files) {
            let name = display_name(&file);
            if !is_image_file(&file) {
                log::warn!("Dropped file is not a supported type: {}", name);
                continue;
            }
            let Some(bytes) = read_bytes(&file, &name) else {
                continue;
            };
            match editor.add_image_from_bytes(&bytes, layer_name(&name)) {
                Ok(id) => {
                    log::info!("Added dropped image {} as layer {}", name, id);
                    added.push(id);
                }
                Err(err) => log::error!("Failed to add {}: {}", name, err),
            }
        }
        added
    }

    /// Dim the window and list the files being dragged over it
    pub fn preview_files_being_dropped(&self, ctx: &egui::Context) {
        use egui::{Align2, Color32, Id, LayerId, Order, TextStyle};

        let Some(text) = ctx.input(|i| {
            if i.raw.hovered_files.is_empty() {
                return None;
            }
            let mut text = "Drop to add as layer:\n".to_owned();
            for file in &i.raw.hovered_files {
                match &file.path {
                    Some(path) => text += &format!("\n{}", path.display()),
                    None if !file.mime.is_empty() => text += &format!("\n{}", file.mime),
                    None => text += "\n(unnamed file)",
                }
            }
            Some(text)
        }) else {
            return;
        };

        let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("file_drop_target")));
        let screen_rect = ctx.screen_rect();
        painter.rect_filled(screen_rect, 0.0, Color32::from_black_alpha(192));
        painter.text(
            screen_rect.center(),
            Align2::CENTER_CENTER,
            text,
            TextStyle::Heading.resolve(&ctx.style()),
            Color32::WHITE,
        );
    }
}

fn display_name(file: &egui::DroppedFile) -> String {
    if let Some(path) = &file.path {
        path.display().to_string()
    } else if !file.name.is_empty() {
        file.name.clone()
    } else {
        "unknown".to_owned()
    }
}

/// File stem used as the layer name
fn layer_name(display_name: &str) -> String {
    std::path::Path::new(display_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| display_name.to_owned())
}

/// Check the MIME type, falling back to the extension
fn is_image_file(file: &egui::DroppedFile) -> bool {
    if !file.mime.is_empty() {
        return file.mime.starts_with("image/");
    }
    let name = file
        .path
        .as_ref()
        .and_then(|path| path.extension())
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .or_else(|| file.name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()));
    name.is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

fn read_bytes(file: &egui::DroppedFile, name: &str) -> Option<Vec<u8>> {
    if let Some(bytes) = &file.bytes {
        log::debug!("Reading dropped image from memory: {} ({} bytes)", name, bytes.len());
        return Some(bytes.to_vec());
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Some(path) = &file.path {
            return match std::fs::read(path) {
                Ok(bytes) => Some(bytes),
                Err(err) => {
                    log::error!("Failed to read image file: {}: {}", path.display(), err);
                    None
                }
            };
        }
    }

    log::warn!("Dropped file has no accessible data: {}", name);
    None
}
