// Library surface for the binary, headless integration tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod language;
pub mod leaderboard;
pub mod logging;
pub mod profile;
pub mod reporter;
pub mod runtime;
pub mod session;
pub mod timer;
pub mod ui;
pub mod word_stream;

pub use error::{Error, Result};
