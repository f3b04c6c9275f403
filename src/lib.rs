//! Pocket Option stream - main library
//!
//! Ties the workspace crates together for the binaries.
//!
//! ## Architecture
//!
//! - **eventsockets**: event client runtime (re-exported from workspace)
//! - **pocket_option**: generated typed client, models, config (re-exported)
//! - **bin_common**: shared CLI and run-loop helpers for binaries
//!
//! ## Usage in Binaries
//!
//! ```ignore
//! use pocket_option_stream::bin_common::{load_config_from_env, ConfigType};
//! use pocket_option_stream::pocket_option::{ClientSettings, PocketOptionClient};
//! ```

// Re-export workspace libraries for convenience
pub use eventsockets;
pub use pocket_option;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod runner;

    pub use cli::{load_config_from_env, parse_args, ConfigType};
    pub use runner::{wait_for_shutdown, BinaryRunner, RunConfig};
}
