/// Command-line parsing and command execution
pub mod cli;
/// Tile geometry, file naming, and display defaults
pub mod configuration;
/// Error types shared by every stage of the pipeline
pub mod error;
/// Photo decoding and mosaic export
pub mod image;
/// Logger installation
pub mod logging;
/// Terminal progress bars
pub mod progress;
