use eframe::egui;

use crate::app::StudioApp;

pub fn central_panel(app: &mut StudioApp, ctx: &egui::Context) {
    egui::CentralPanel::default()
        .frame(egui::Frame::none())
        .show(ctx, |ui| {
            let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
            let canvas_rect = response.rect;
            app.editor.set_viewport_size(canvas_rect.size());

            // Leave keystrokes to focused text fields
            let keyboard = !ctx.wants_keyboard_input();
            for event in app.input_handler.process_input(ctx, canvas_rect, keyboard) {
                app.editor.handle_event(&event);
            }

            if let Some(texture) = app.canvas_texture(ctx) {
                let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                painter.image(texture, canvas_rect, uv, egui::Color32::WHITE);
            }

            if response.hovered() || app.input_handler.is_captured() {
                ctx.set_cursor_icon(app.editor.cursor_icon());
            }
        });
}
