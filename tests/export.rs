use egui::{Key, Modifiers, Pos2, Rect, Vec2};
use image::{DynamicImage, Rgba, RgbaImage};
use studio_canvas::export::export_region;
use studio_canvas::geometry::{Viewport, local_to_world};
use studio_canvas::paint::{Brush, Mark, paint_on_layer};
use studio_canvas::{
    AspectRatio, Document, Editor, EditorConfig, EditorError, InputEvent, LayerId, Selection, ToolKind, Transform,
};
use tiny_skia::{Color, Pixmap};

const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn create_test_config() -> EditorConfig {
    EditorConfig {
        drawing_surface_size: 1000,
        ..EditorConfig::default()
    }
}

fn add_image(document: &mut Document, x: f32, y: f32, size: f32) -> LayerId {
    let mut bitmap = Pixmap::new(size as u32, size as u32).unwrap();
    bitmap.fill(Color::from_rgba8(0, 0, 255, 255));
    let id = document.add_image_layer(bitmap, "image", &Viewport::default());
    document
        .set_transform(id, Transform::new(Pos2::new(x, y), Vec2::splat(size)))
        .unwrap();
    id
}

/// Paint a rectangle outline, given in world space, onto a fresh drawing layer
fn add_scribble(document: &mut Document, from: Pos2, to: Pos2) -> LayerId {
    let id = document.add_drawing_layer();
    let layer = document.get(id).unwrap();
    let offset = layer.transform.size / 2.0;
    let mark = Mark::Rect {
        from: from + offset,
        to: to + offset,
    };
    assert!(paint_on_layer(layer, &mark, &Brush::new(egui::Color32::RED, 4.0)));
    document.touch(id).unwrap();
    id
}

fn selection_of(ids: &[LayerId]) -> Selection {
    let mut selection = Selection::new(3);
    for id in ids {
        selection.toggle(*id);
    }
    selection
}

#[test]
fn test_empty_document_has_nothing_to_export() {
    let config = create_test_config();
    let document = Document::new(&config, AspectRatio::Square);
    let result = export_region(document.layers(), &Selection::new(3), &config);
    assert!(matches!(result, Err(EditorError::NothingToExport)));
}

#[test]
fn test_nothing_selected_exports_every_visible_layer() {
    let config = create_test_config();
    let mut document = Document::new(&config, AspectRatio::Square);
    let a = add_image(&mut document, 0.0, 0.0, 100.0);
    let b = add_image(&mut document, 200.0, 200.0, 100.0);
    let hidden = add_image(&mut document, -400.0, -400.0, 50.0);
    document.set_visibility(hidden, false).unwrap();

    let region = export_region(document.layers(), &Selection::new(3), &config).unwrap();

    assert_eq!(region.layers, vec![a, b]);
    let padding = config.export_padding;
    assert_eq!(region.rect.min, Vec2::splat(-padding).to_pos2());
    assert_eq!(region.rect.max, Vec2::splat(300.0 + padding).to_pos2());
    assert_eq!(region.image.dimensions(), (340, 340));
    assert_eq!(*region.image.get_pixel(0, 0), WHITE);
    assert_eq!(*region.image.get_pixel(70, 70), BLUE);
    // Between the two images only the white backing shows
    assert_eq!(*region.image.get_pixel(170, 40), WHITE);
}

#[test]
fn test_single_selection_still_exports_everything() {
    let config = create_test_config();
    let mut document = Document::new(&config, AspectRatio::Square);
    let a = add_image(&mut document, 0.0, 0.0, 100.0);
    let b = add_image(&mut document, 200.0, 200.0, 100.0);

    let region = export_region(document.layers(), &selection_of(&[a]), &config).unwrap();
    assert_eq!(region.layers, vec![a, b]);
}

#[test]
fn test_multi_selection_exports_selected_and_overlapping_drawings() {
    let config = create_test_config();
    let mut document = Document::new(&config, AspectRatio::Square);
    let a = add_image(&mut document, 0.0, 0.0, 100.0);
    let b = add_image(&mut document, 200.0, 200.0, 100.0);
    let unselected = add_image(&mut document, 600.0, 0.0, 100.0);
    let near = add_scribble(&mut document, Pos2::new(120.0, 120.0), Pos2::new(160.0, 160.0));
    let far = add_scribble(&mut document, Pos2::new(-450.0, -450.0), Pos2::new(-420.0, -420.0));

    let region = export_region(document.layers(), &selection_of(&[a, b]), &config).unwrap();

    assert!(region.layers.contains(&a));
    assert!(region.layers.contains(&b));
    assert!(region.layers.contains(&near));
    assert!(!region.layers.contains(&unselected));
    assert!(!region.layers.contains(&far));
    // Images are composited before drawings
    assert_eq!(region.layers.last(), Some(&near));
}

#[test]
fn test_valid_marquee_box_is_reused() {
    let config = create_test_config();
    let mut document = Document::new(&config, AspectRatio::Square);
    let a = add_image(&mut document, 0.0, 0.0, 100.0);
    let b = add_image(&mut document, 200.0, 200.0, 100.0);
    let mut selection = Selection::new(3);
    let marquee = Rect::from_min_max(Pos2::new(-10.0, -10.0), Pos2::new(250.0, 250.0));
    selection.set_from_marquee(vec![a, b], marquee);

    let region = export_region(document.layers(), &selection, &config).unwrap();
    assert_eq!(region.rect, marquee);
    assert_eq!(region.image.dimensions(), (260, 260));

    // Once a selected layer leaves the box the padded bounds are used instead
    document
        .set_transform(b, Transform::new(Pos2::new(400.0, 400.0), Vec2::splat(100.0)))
        .unwrap();
    let region = export_region(document.layers(), &selection, &config).unwrap();
    assert_eq!(region.rect.max, Vec2::splat(500.0 + config.export_padding).to_pos2());
}

#[test]
fn test_large_regions_are_scaled_down() {
    let config = EditorConfig {
        max_export_dimension: 200,
        ..create_test_config()
    };
    let mut document = Document::new(&config, AspectRatio::Square);
    add_image(&mut document, 0.0, 0.0, 360.0);

    let region = export_region(document.layers(), &Selection::new(3), &config).unwrap();
    assert_eq!(region.image.dimensions(), (200, 200));
    assert!((region.scale - 0.5).abs() < 1e-6);
}

#[test]
fn test_image_with_text_note_becomes_generation_request() {
    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(400, 400, BLUE));
    let mut editor = Editor::with_source_image(create_test_config(), &image, AspectRatio::Landscape4x3).unwrap();

    // Place the note under the image, in world space
    editor.set_tool(ToolKind::Text);
    let at = editor.viewport().world_to_screen(Pos2::new(-150.0, 230.0));
    editor.handle_event(&InputEvent::PointerDown {
        position: at,
        modifiers: Modifiers::NONE,
    });
    editor.handle_event(&InputEvent::PointerUp {
        position: at,
        modifiers: Modifiers::NONE,
    });
    editor.handle_event(&InputEvent::Text("fix lighting".to_owned()));
    editor.handle_event(&InputEvent::KeyDown {
        key: Key::Enter,
        modifiers: Modifiers::NONE,
    });

    let region = editor.export().unwrap();
    let pixels: Vec<&Rgba<u8>> = region.image.pixels().collect();
    assert_eq!(*region.image.get_pixel(0, 0), WHITE);
    assert!(pixels.iter().any(|pixel| **pixel == BLUE));
    assert!(pixels.iter().any(|pixel| pixel[0] > 150 && pixel[2] < 150));

    let request = editor.generation_request("").unwrap();
    assert!(request.instruction.contains("fix lighting"));
    assert_eq!(request.aspect_ratio, AspectRatio::Landscape4x3);
    assert_eq!((request.width, request.height), region.image.dimensions());
    assert_eq!(&request.image_png[..4], b"\x89PNG");
}

#[test]
fn test_single_selection_marquee_skips_layers_outside_it() {
    let config = create_test_config();
    let mut document = Document::new(&config, AspectRatio::Square);
    let a = add_image(&mut document, 0.0, 0.0, 100.0);
    add_image(&mut document, 400.0, 400.0, 100.0);
    let mut selection = Selection::new(3);
    let marquee = Rect::from_min_max(Pos2::new(-10.0, -10.0), Pos2::new(120.0, 120.0));
    selection.set_from_marquee(vec![a], marquee);

    let region = export_region(document.layers(), &selection, &config).unwrap();
    assert_eq!(region.rect, marquee);
    assert_eq!(region.layers, vec![a]);
}

#[test]
fn test_text_written_on_image_is_exported_with_it() {
    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(400, 400, BLUE));
    let mut editor = Editor::with_source_image(create_test_config(), &image, AspectRatio::Square).unwrap();
    let image_id = editor.document().layers()[1].id;
    let placement = editor.document().get(image_id).unwrap().transform;

    // Write at (50, 50) inside the image
    editor.set_tool(ToolKind::Text);
    let at = editor
        .viewport()
        .world_to_screen(local_to_world(Pos2::new(50.0, 50.0), &placement));
    editor.handle_event(&InputEvent::PointerDown {
        position: at,
        modifiers: Modifiers::NONE,
    });
    editor.handle_event(&InputEvent::PointerUp {
        position: at,
        modifiers: Modifiers::NONE,
    });
    editor.handle_event(&InputEvent::Text("fix lighting".to_owned()));
    editor.handle_event(&InputEvent::KeyDown {
        key: Key::Enter,
        modifiers: Modifiers::NONE,
    });

    let region = editor.export().unwrap();
    let padding = config_padding();
    assert_eq!(region.layers.len(), 2);
    assert_eq!(region.layers[0], image_id);
    assert_eq!(region.image.dimensions(), (400 + 2 * padding, 400 + 2 * padding));
    assert_eq!(*region.image.get_pixel(0, 0), WHITE);
    assert!(region.image.pixels().any(|pixel| *pixel == BLUE));
    let red = region
        .image
        .pixels()
        .filter(|pixel| pixel[0] > 150 && pixel[2] < 150)
        .count();
    assert!(red > 50, "only {red} red pixels");

    let request = editor.generation_request("").unwrap();
    assert!(request.instruction.contains("fix lighting"));
    assert_eq!(request.aspect_ratio, AspectRatio::Square);
}

fn config_padding() -> u32 {
    create_test_config().export_padding as u32
}
