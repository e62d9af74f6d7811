use eframe::egui;

use crate::editor::Editor;
use crate::export::GenerationRequest;
use crate::file_handler::FileHandler;
use crate::input::InputHandler;
use crate::panels::{central_panel, tools_panel};
use crate::renderer::Renderer;

/// Receives the payload when the user presses Generate
pub type GenerateCallback = Box<dyn FnMut(GenerationRequest)>;

/// Host window around an [`Editor`]
pub struct StudioApp {
    pub(crate) editor: Editor,
    pub(crate) renderer: Renderer,
    pub(crate) input_handler: InputHandler,
    file_handler: FileHandler,
    canvas_texture: Option<egui::TextureHandle>,
    pub(crate) instruction: String,
    /// Outcome of the last generate attempt, shown under the button
    pub(crate) status: Option<String>,
    on_generate: GenerateCallback,
}

impl StudioApp {
    pub fn new(editor: Editor, on_generate: impl FnMut(GenerationRequest) + 'static) -> Self {
        Self {
            editor,
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            file_handler: FileHandler::new(),
            canvas_texture: None,
            instruction: String::new(),
            status: None,
            on_generate: Box::new(on_generate),
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    /// Export the current region and hand it to the generate callback
    pub fn generate(&mut self) {
        match self.editor.generation_request(&self.instruction) {
            Ok(request) => {
                log::info!(
                    "Generation request: {}x{} {} {:?}",
                    request.width,
                    request.height,
                    request.aspect_ratio.as_str(),
                    request.instruction
                );
                self.status = Some(format!("Sent {}x{} region", request.width, request.height));
                (self.on_generate)(request);
            }
            Err(err) => {
                log::warn!("Cannot generate: {}", err);
                self.status = Some(err.to_string());
            }
        }
    }

    /// Render the canvas and upload it, returning the texture to paint
    pub(crate) fn canvas_texture(&mut self, ctx: &egui::Context) -> Option<egui::TextureId> {
        let frame = self.renderer.render(&self.editor)?;
        let image = egui::ColorImage::from_rgba_premultiplied(
            [frame.width() as usize, frame.height() as usize],
            frame.data(),
        );
        let options = egui::TextureOptions::NEAREST;
        match &mut self.canvas_texture {
            Some(texture) => texture.set(image, options),
            None => self.canvas_texture = Some(ctx.load_texture("canvas", image, options)),
        }
        self.canvas_texture.as_ref().map(|texture| texture.id())
    }
}

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.file_handler.preview_files_being_dropped(ctx);
        if self.file_handler.check_for_dropped_files(ctx) {
            self.file_handler.process_dropped_files(&mut self.editor);
        }

        tools_panel(self, ctx);
        central_panel(self, ctx);

        // The canvas is re-rendered every frame
        ctx.request_repaint();
    }
}
