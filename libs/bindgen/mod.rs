//! Event catalog compiler
//!
//! Turns a JSON event catalog into typed Rust bindings for an
//! `eventsockets` client: one `on_<name>` / `<name>_registrar` pair per
//! inbound event and one async `emit_<name>` per outbound event.
//!
//! Usually driven from a `build.rs`:
//!
//! ```ignore
//! let out = PathBuf::from(env::var("OUT_DIR").unwrap()).join("bindings.rs");
//! event_bindgen::compile_file("events.json", out, &BindingOptions::new("MyClient"))
//!     .unwrap_or_else(|e| panic!("{e}"));
//! ```
//!
//! Nothing here touches the network.

pub mod catalog;
pub mod codegen;
pub mod error;
pub mod shape;
pub mod validate;

pub use catalog::{Arg, Catalog, Direction, InboundEntry, OutboundEntry, Transform};
pub use codegen::{compile_file, generate, BindingOptions, GENERATED_HEADER};
pub use error::{CompileError, Result, SchemaIssue, SchemaValidationError};
pub use shape::Shape;
pub use validate::validate;
