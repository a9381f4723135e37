#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod envelope;
pub mod error;
pub mod import;
pub mod layout;
pub mod layout_dump;
pub mod model;
pub mod render;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
