use thiserror::Error;

use crate::layer::LayerId;

/// Errors raised while mutating the layer document through commands
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Layer {0} does not exist")]
    LayerNotFound(LayerId),
    #[error("The background layer cannot be removed or reordered")]
    BackgroundLocked,
    #[error("Command cannot be applied in the current state")]
    InvalidState,
}

/// Result type for command operations
pub type CommandResult = Result<(), CommandError>;

/// Errors that can occur while loading the editor configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

/// Top-level error for editor operations that can be surfaced to the user
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("There is no visible content to export")]
    NothingToExport,

    #[error("The export region has zero area")]
    DegenerateRegion,

    #[error("Failed to decode image: {0}")]
    ImageDecode(#[source] image::ImageError),

    #[error("Failed to encode image: {0}")]
    ImageEncode(#[source] image::ImageError),

    #[error("Cannot allocate a {width}x{height} raster")]
    Raster { width: u32, height: u32 },

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type EditorResult<T> = Result<T, EditorError>;
