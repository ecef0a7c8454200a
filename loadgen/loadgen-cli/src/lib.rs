//! Library side of the `loadgen` binary: the bundled scenario, command
//! implementations and report formatting.

pub mod commands;
pub mod output;
pub mod scenario;

pub use commands::RunOptions;
pub use output::OutputFormat;
pub use scenario::{ScenarioSettings, SimpleQdrantUser};
