//! Interactive dialer
//!
//! Terminal user interface using Ratatui: number field, call button and
//! message log.

mod app;
mod field;
mod messages;
mod ui;

pub use app::run;
