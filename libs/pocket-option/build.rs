//! Generates the typed `PocketOptionClient` bindings from `events.json`.
//!
//! The quotes fixture of `event-bindgen` is rendered as well so the tests
//! can compile the parts of the generator `events.json` does not use.

use event_bindgen::{compile_file, BindingOptions};
use std::env;
use std::path::PathBuf;

const CATALOG: &str = "events.json";
const FIXTURE: &str = "../bindgen/tests/fixtures/quotes.json";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={CATALOG}");
    println!("cargo:rerun-if-changed={FIXTURE}");

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));

    let options = BindingOptions::new("PocketOptionClient")
        .models("crate::models")
        .transforms("crate::transforms")
        .runtime("::eventsockets");
    if let Err(e) = compile_file(CATALOG, out_dir.join("pocket_option_bindings.rs"), &options) {
        panic!("{CATALOG}: {e}");
    }

    let fixture = BindingOptions::new("QuoteClient")
        .models("fixtures")
        .transforms("fixtures")
        .runtime("::eventsockets");
    if let Err(e) = compile_file(FIXTURE, out_dir.join("quotes_bindings.rs"), &fixture) {
        panic!("{FIXTURE}: {e}");
    }
}
