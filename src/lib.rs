#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod aspect;
pub mod command;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod export;
pub mod file_handler;
pub mod geometry;
pub mod input;
pub mod layer;
pub mod paint;
pub mod panels;
pub mod renderer;
pub mod selection;
pub mod state;
pub mod surface;
pub mod text;
pub mod tools;

pub use app::StudioApp;
pub use aspect::AspectRatio;
pub use command::{Command, CommandHistory};
pub use config::EditorConfig;
pub use document::Document;
pub use editor::Editor;
pub use error::{CommandError, EditorError, EditorResult};
pub use export::{ExportedRegion, GenerationRequest};
pub use input::{InputEvent, InputHandler};
pub use layer::{Layer, LayerId, Transform};
pub use renderer::Renderer;
pub use selection::Selection;
pub use state::InteractionState;
pub use tools::{Tool, ToolKind};
