//! Interactive terminal scratchpad.
mod commands;
mod input;
mod render;
mod runner;
mod state;
mod tasks;

pub use commands::{completions, parse_command, SlashCommand, SLASH_COMMANDS};
pub use input::TextInput;
pub use render::{draw, Theme};
pub use runner::run;
pub use state::{Mode, Pane, SearchState, ViewState, ERROR_TTL};
pub use tasks::{Message, Task};
