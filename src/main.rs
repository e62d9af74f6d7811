#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use std::str::FromStr;

use studio_canvas::{AspectRatio, Editor, EditorConfig, GenerationRequest, StudioApp};

/// Usage: `studio_canvas [IMAGE] [ASPECT]`
#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let mut args = std::env::args().skip(1);
    let image_path = args.next();
    let aspect_ratio = match args.next() {
        Some(arg) => AspectRatio::from_str(&arg).unwrap_or_else(|err| {
            log::warn!("{}, using {}", err, AspectRatio::default().as_str());
            AspectRatio::default()
        }),
        None => AspectRatio::default(),
    };
    let config = EditorConfig::from_env();

    let editor = match image_path.as_deref().map(image::open) {
        Some(Ok(image)) => Editor::with_source_image(config.clone(), &image, aspect_ratio).unwrap_or_else(|err| {
            log::error!("Failed to place source image: {}", err);
            Editor::new(config, aspect_ratio)
        }),
        Some(Err(err)) => {
            log::error!("Failed to open source image: {}", err);
            Editor::new(config, aspect_ratio)
        }
        None => Editor::new(config, aspect_ratio),
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([640.0, 400.0])
            .with_title("Studio canvas"),
        ..Default::default()
    };
    eframe::run_native(
        "studio_canvas",
        native_options,
        Box::new(|_cc| Ok(Box::new(StudioApp::new(editor, save_request)))),
    )
}

/// Stand-in generate callback: keep the payload in the temp directory
#[cfg(not(target_arch = "wasm32"))]
fn save_request(request: GenerationRequest) {
    let path = std::env::temp_dir().join("studio_canvas_request.png");
    match std::fs::write(&path, &request.image_png) {
        Ok(()) => log::info!(
            "Wrote {}x{} request to {} with instruction {:?}",
            request.width,
            request.height,
            path.display(),
            request.instruction
        ),
        Err(err) => log::error!("Failed to write {}: {}", path.display(), err),
    }
}
