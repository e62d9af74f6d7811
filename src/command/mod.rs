mod commands;
mod history;

pub use commands::Command;
pub use history::CommandHistory;

pub use crate::error::{CommandError, CommandResult};
