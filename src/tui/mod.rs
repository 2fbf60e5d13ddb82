//! Terminal form for listing ADLS files
//!
//! Eight input fields on top, the results table below. The pipeline runs on
//! a background task and reports back through the event channel.

mod app;
mod event;
pub mod terminal;
pub mod ui;

pub use app::App;
pub use event::{Event, EventHandler};
pub use terminal::enter_terminal;
