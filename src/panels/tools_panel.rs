use eframe::egui;

use crate::app::StudioApp;
use crate::layer::{LayerId, LayerKind};
use crate::tools::{Tool, ToolKind};

/// A click in the layer list, applied after the list is drawn
enum LayerAction {
    Select(LayerId),
    ToggleVisibility(LayerId),
    Move(LayerId, usize),
    Remove(LayerId),
}

pub fn tools_panel(app: &mut StudioApp, ctx: &egui::Context) {
    egui::SidePanel::left("tools_panel")
        .resizable(true)
        .default_width(220.0)
        .show(ctx, |ui| {
            ui.heading("Tools");
            let active_tool = app.editor.tool();
            ui.horizontal_wrapped(|ui| {
                for tool in ToolKind::ALL {
                    let response = ui
                        .selectable_label(active_tool == tool, tool.name())
                        .on_hover_text(format!("Shortcut: {:?}", tool.shortcut()));
                    if response.clicked() {
                        log::info!("Tool selected from UI: {}", tool.name());
                        app.editor.set_tool(tool);
                    }
                }
            });
            ui.separator();

            ui.horizontal(|ui| {
                if ui.add_enabled(app.editor.can_undo(), egui::Button::new("Undo")).clicked() {
                    if let Err(err) = app.editor.undo() {
                        log::warn!("Undo failed: {}", err);
                    }
                }
                if ui.add_enabled(app.editor.can_redo(), egui::Button::new("Redo")).clicked() {
                    if let Err(err) = app.editor.redo() {
                        log::warn!("Redo failed: {}", err);
                    }
                }
            });
            ui.separator();

            ui.heading("Layers");
            egui::ScrollArea::vertical()
                .max_height(280.0)
                .show(ui, |ui| layer_list(app, ui));
            ui.separator();

            ui.heading("Generate");
            ui.label(format!("Aspect ratio {}", app.editor.aspect_ratio().as_str()));
            ui.add(
                egui::TextEdit::multiline(&mut app.instruction)
                    .hint_text("Describe the change")
                    .desired_rows(3),
            );
            let annotations = app.editor.text_annotations();
            if !annotations.is_empty() {
                ui.label(format!("Canvas notes: {}", annotations.join("; ")));
            }
            if ui.button("Generate").clicked() {
                app.generate();
            }
            if let Some(status) = &app.status {
                ui.label(status);
            }
        });
}

/// Layers listed top-most first
fn layer_list(app: &mut StudioApp, ui: &mut egui::Ui) {
    let snapshot = app.editor.document().snapshot();
    let last = snapshot.len().saturating_sub(1);
    let mut action = None;

    for (index, layer) in snapshot.iter().enumerate().rev() {
        ui.horizontal(|ui| {
            if layer.is_background() {
                ui.label(format!("  {}", layer.name));
                return;
            }

            let mut visible = layer.visible;
            if ui.checkbox(&mut visible, "").on_hover_text("Visible").changed() {
                action = Some(LayerAction::ToggleVisibility(layer.id));
            }
            let kind = match layer.kind() {
                LayerKind::Image => "Image",
                LayerKind::Drawing => "Drawing",
            };
            let selected = app.editor.selection().contains(layer.id);
            if ui.selectable_label(selected, &layer.name).on_hover_text(kind).clicked() {
                action = Some(LayerAction::Select(layer.id));
            }
            if ui.add_enabled(index < last, egui::Button::new("⬆").small()).clicked() {
                action = Some(LayerAction::Move(layer.id, index + 1));
            }
            if ui.add_enabled(index > 1, egui::Button::new("⬇").small()).clicked() {
                action = Some(LayerAction::Move(layer.id, index - 1));
            }
            if ui.small_button("🗑").on_hover_text("Delete").clicked() {
                action = Some(LayerAction::Remove(layer.id));
            }
        });
    }

    let result = match action {
        Some(LayerAction::Select(id)) => {
            app.editor.select_layer(id);
            Ok(())
        }
        Some(LayerAction::ToggleVisibility(id)) => app.editor.toggle_visibility(id),
        Some(LayerAction::Move(id, index)) => app.editor.move_layer(id, index),
        Some(LayerAction::Remove(id)) => app.editor.remove_layer(id),
        None => Ok(()),
    };
    if let Err(err) = result {
        log::warn!("Layer action failed: {}", err);
    }
}
