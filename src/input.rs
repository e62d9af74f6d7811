use egui::{Context, Event, Key, Modifiers, PointerButton, Pos2, Rect};

/// Input the editor reacts to. Positions are in canvas space: screen pixels
/// relative to the top-left corner of the canvas widget.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Primary button was pressed inside the canvas
    PointerDown { position: Pos2, modifiers: Modifiers },
    /// Pointer moved over the canvas, or anywhere while a press is captured
    PointerMove { position: Pos2, modifiers: Modifiers },
    /// Primary button was released after a captured press
    PointerUp { position: Pos2, modifiers: Modifiers },
    /// Vertical scroll over the canvas, in points; positive scrolls up
    Scroll { position: Pos2, delta: f32 },
    KeyDown { key: Key, modifiers: Modifiers },
    /// Typed text
    Text(String),
}

/// Handles converting raw egui input into canvas [`InputEvent`]s
#[derive(Debug, Default)]
pub struct InputHandler {
    last_pointer_pos: Option<Pos2>,
    /// Set between a press inside the canvas and its release
    captured: bool,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_captured(&self) -> bool {
        self.captured
    }

    /// Translate this frame's egui input for a canvas occupying `canvas_rect`.
    ///
    /// Keyboard events are only produced when `keyboard` is true, so text
    /// fields elsewhere in the window keep their keystrokes.
    pub fn process_input(&mut self, ctx: &Context, canvas_rect: Rect, keyboard: bool) -> Vec<InputEvent> {
        let mut events = Vec::new();
        let to_canvas = |pos: Pos2| (pos - canvas_rect.min).to_pos2();

        ctx.input(|input| {
            let modifiers = input.modifiers;
            let hover = input.pointer.hover_pos().or(input.pointer.interact_pos());

            if let Some(pos) = hover {
                let over_canvas = canvas_rect.contains(pos);

                if input.pointer.button_pressed(PointerButton::Primary) && over_canvas {
                    self.captured = true;
                    events.push(InputEvent::PointerDown {
                        position: to_canvas(pos),
                        modifiers,
                    });
                }

                if Some(pos) != self.last_pointer_pos && (self.captured || over_canvas) {
                    events.push(InputEvent::PointerMove {
                        position: to_canvas(pos),
                        modifiers,
                    });
                }

                let scroll = input.smooth_scroll_delta.y;
                if over_canvas && scroll != 0.0 {
                    events.push(InputEvent::Scroll {
                        position: to_canvas(pos),
                        delta: scroll,
                    });
                }
            }
            // Keep the last known position while the pointer is outside the window
            if hover.is_some() {
                self.last_pointer_pos = hover;
            }

            if self.captured && input.pointer.button_released(PointerButton::Primary) {
                self.captured = false;
                if let Some(pos) = self.last_pointer_pos {
                    events.push(InputEvent::PointerUp {
                        position: to_canvas(pos),
                        modifiers,
                    });
                }
            }

            if !keyboard {
                return;
            }
            for event in &input.events {
                match event {
                    Event::Key {
                        key,
                        pressed: true,
                        modifiers,
                        ..
                    } => events.push(InputEvent::KeyDown {
                        key: *key,
                        modifiers: *modifiers,
                    }),
                    Event::Text(text) => events.push(InputEvent::Text(text.clone())),
                    _ => {}
                }
            }
        });

        events
    }
}
