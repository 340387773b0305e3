//! Terminal user interface (Ratatui).

mod app;
mod backend;
mod chat_list;
mod chat_view;
mod forms;
mod help;
mod input;
mod log_pane;
mod navbar;
mod ui;

pub use app::run;
pub use log_pane::LogBuffer;
