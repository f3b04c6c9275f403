//! Rust source emission
//!
//! The output is an `impl` block for an existing client type that derefs to
//! the runtime's `EventClient`, meant to be `include!`d from `OUT_DIR`:
//!
//! ```ignore
//! pub struct PocketOptionClient { inner: eventsockets::EventClient }
//! // + impl Deref<Target = EventClient>
//! include!(concat!(env!("OUT_DIR"), "/pocket_option_bindings.rs"));
//! ```

mod inbound;
mod outbound;
mod writer;

pub use writer::SourceWriter;

use crate::catalog::Catalog;
use crate::error::{CompileError, Result};
use crate::validate::validate;
use std::path::Path;
use tracing::{debug, info};

pub const GENERATED_HEADER: &str = "// @generated by event-bindgen. Do not edit.";

/// Where generated code finds the types it refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingOptions {
    /// Type the `impl` block is written for
    pub client_type: String,
    /// Module holding every `record` type
    pub models_path: String,
    /// Module holding every transform function
    pub transforms_path: String,
    /// Path of the runtime crate
    pub runtime_path: String,
}

impl Default for BindingOptions {
    fn default() -> Self {
        Self {
            client_type: "Client".to_string(),
            models_path: "crate::models".to_string(),
            transforms_path: "crate::transforms".to_string(),
            runtime_path: "::eventsockets".to_string(),
        }
    }
}

impl BindingOptions {
    pub fn new(client_type: impl Into<String>) -> Self {
        Self {
            client_type: client_type.into(),
            ..Self::default()
        }
    }

    pub fn models(mut self, path: impl Into<String>) -> Self {
        self.models_path = path.into();
        self
    }

    pub fn transforms(mut self, path: impl Into<String>) -> Self {
        self.transforms_path = path.into();
        self
    }

    pub fn runtime(mut self, path: impl Into<String>) -> Self {
        self.runtime_path = path.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !is_path(&self.client_type) || self.client_type.contains("::") {
            return Err(CompileError::Options(format!(
                "client type `{}` must be a plain type name",
                self.client_type
            )));
        }
        for (what, path) in [
            ("models", &self.models_path),
            ("transforms", &self.transforms_path),
            ("runtime", &self.runtime_path),
        ] {
            if !is_path(path) {
                return Err(CompileError::Options(format!("{what} path `{path}` is not a Rust path")));
            }
        }
        Ok(())
    }
}

fn is_path(path: &str) -> bool {
    let path = path.strip_prefix("::").unwrap_or(path);
    !path.is_empty()
        && path.split("::").all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
                && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        })
}

/// Validate `catalog` and render its bindings
///
/// Entries are emitted in catalog order, so the same catalog always renders
/// the same source.
pub fn generate(catalog: &Catalog, options: &BindingOptions) -> Result<String> {
    options.validate()?;
    validate(catalog)?;

    let mut w = SourceWriter::new();
    w.line(GENERATED_HEADER);
    w.line(format!(
        "// {} inbound and {} outbound events.",
        catalog.on.len(),
        catalog.emit.len()
    ));
    w.blank();

    w.block(format!("impl {} {{", options.client_type), "}", |w| {
        w.doc("Wire names of every inbound event, in catalog order");
        w.line(format!(
            "pub const INBOUND_EVENTS: &'static [&'static str] = &[{}];",
            quoted(catalog.inbound_events())
        ));
        w.doc("Wire names of every outbound event, in catalog order");
        w.line(format!(
            "pub const OUTBOUND_EVENTS: &'static [&'static str] = &[{}];",
            quoted(catalog.outbound_events())
        ));

        for entry in &catalog.on {
            w.blank();
            inbound::write_inbound(w, entry, options);
        }
        for entry in &catalog.emit {
            w.blank();
            outbound::write_outbound(w, entry, options);
        }
    });

    debug!(
        inbound = catalog.on.len(),
        outbound = catalog.emit.len(),
        client = %options.client_type,
        "Generated bindings"
    );
    Ok(w.finish())
}

/// Load, validate and render `input` into `output`
///
/// The output file is only rewritten when its content changes. Returns
/// whether it was written.
pub fn compile_file(input: impl AsRef<Path>, output: impl AsRef<Path>, options: &BindingOptions) -> Result<bool> {
    let input = input.as_ref();
    let output = output.as_ref();

    let catalog = Catalog::load(input)?;
    let source = generate(&catalog, options)?;

    if let Ok(existing) = std::fs::read_to_string(output) {
        if existing == source {
            debug!(output = %output.display(), "Bindings unchanged");
            return Ok(false);
        }
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| CompileError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(output, source).map_err(|source| CompileError::Io {
        path: output.to_path_buf(),
        source,
    })?;

    info!(input = %input.display(), output = %output.display(), "Wrote bindings");
    Ok(true)
}

fn quoted<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.map(|name| format!("{name:?}")).collect::<Vec<_>>().join(", ")
}
