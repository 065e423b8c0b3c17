// Library surface for headless/integration tests and reuse.
// The binary in main.rs only adds the CLI and terminal setup.
pub mod answers;
pub mod api;
pub mod app;
pub mod app_dirs;
pub mod attempt;
pub mod clock;
pub mod config;
pub mod error;
pub mod exam;
pub mod gateway;
pub mod history;
pub mod logging;
pub mod navigation;
pub mod runtime;
pub mod ui;
pub mod util;
