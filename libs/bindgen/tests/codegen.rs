//! Rendering tests over the fixture catalogs

use event_bindgen::*;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn render() -> String {
    let catalog = Catalog::load(fixture("quotes.json")).unwrap();
    generate(&catalog, &BindingOptions::new("QuoteClient")).unwrap()
}

#[test]
fn test_header_and_event_tables() {
    let source = render();
    assert!(source.starts_with(GENERATED_HEADER));
    assert!(source.contains("// 3 inbound and 5 outbound events."));
    assert!(source.contains("impl QuoteClient {"));
    assert!(source.contains(
        r#"pub const INBOUND_EVENTS: &'static [&'static str] = &["successupdateBalance", "updateStream", "raw/event"];"#
    ));
    assert!(source.contains(
        r#"pub const OUTBOUND_EVENTS: &'static [&'static str] = &["ps", "subscribeSymbol", "changeSymbol", "openOrder", "loadHistory"];"#
    ));
}

#[test]
fn test_inbound_registration_forms() {
    let source = render();

    let immediate = "    /// Account balance pushed after every settled order.
    pub fn on_balance<L>(&self, listener: L)
    where
        L: ::eventsockets::Listener<crate::models::Balance>,
    {
        self.balance_registrar().register(listener)
    }
";
    assert!(source.contains(immediate), "{source}");

    assert!(source.contains(
        "    pub fn balance_registrar(&self) -> ::eventsockets::Registrar<crate::models::Balance> {
        self.registrar(\"successupdateBalance\", ::eventsockets::decode_payload::<crate::models::Balance>)
    }"
    ));
    assert!(source.contains("/// `raw/event` frames, delivered as `json`."));
    assert!(source.contains("pub fn raw_registrar(&self) -> ::eventsockets::Registrar<::eventsockets::Value> {"));
}

#[test]
fn test_transformed_inbound_decodes_the_wire_shape() {
    let source = render();
    assert!(source.contains("pub fn ticks_registrar(&self) -> ::eventsockets::Registrar<Vec<crate::models::Tick>> {"));
    assert!(source.contains(
        "        self.registrar(\"updateStream\", |raw| {
            ::eventsockets::decode_payload::<Vec<(String, f64, f64)>>(raw).map(crate::transforms::ticks)
        })"
    ));
}

#[test]
fn test_payload_arity() {
    let source = render();

    // No arguments: no payload
    assert!(source.contains(
        "    pub async fn emit_ping(&self) -> ::eventsockets::Result<()> {
        self.emit(\"ps\", None, None).await
    }"
    ));

    // One argument: the bare value
    assert!(source.contains(
        "pub async fn emit_subscribe(&self, asset: impl Into<String>) -> ::eventsockets::Result<()> {"
    ));
    assert!(source.contains(
        "self.emit(\"subscribeSymbol\", Some(::eventsockets::Value::from(asset)), None).await"
    ));

    // Several arguments: an array in declared order
    assert!(source.contains(
        "self.emit(\"changeSymbol\", Some(::eventsockets::Value::Array(vec![::eventsockets::Value::from(asset), ::eventsockets::Value::from(period)])), None).await"
    ));
}

#[test]
fn test_defaults_become_options() {
    let source = render();
    assert!(source.contains("/// When `None`: `period` defaults to `30`."));
    assert!(source.contains(
        "pub async fn emit_change_symbol(&self, asset: impl Into<String>, period: Option<i64>) -> ::eventsockets::Result<()> {"
    ));
    assert!(source.contains("let period = period.unwrap_or(30);"));
    assert!(source.contains(
        r#"let filter = filter.unwrap_or_else(|| ::eventsockets::Value::Object([("period".to_string(), ::eventsockets::Value::from(60_i64)), ("tags".to_string(), ::eventsockets::Value::Array(vec![::eventsockets::Value::from("a")]))].into_iter().collect()));"#
    ));
}

#[test]
fn test_cast_argument_and_callback() {
    let source = render();
    assert!(source.contains(
        "pub async fn emit_place(&self, order: crate::models::Order, callback: Option<::eventsockets::TypedAck<crate::models::OrderAck>>) -> ::eventsockets::Result<()> {"
    ));
    assert!(source.contains(
        "self.emit(\"openOrder\", Some(::eventsockets::to_payload(&order)?), callback.map(::eventsockets::Ack::from)).await"
    ));
}

#[test]
fn test_custom_paths() {
    let catalog = Catalog::load(fixture("quotes.json")).unwrap();
    let options = BindingOptions::new("QuoteClient")
        .models("super::types")
        .transforms("super::reshape")
        .runtime("rt");
    let source = generate(&catalog, &options).unwrap();

    assert!(source.contains("rt::decode_payload::<Vec<(String, f64, f64)>>(raw).map(super::reshape::ticks)"));
    assert!(source.contains("rt::Listener<super::types::Balance>"));
    assert!(!source.contains("::eventsockets"));
}

#[test]
fn test_rendering_is_deterministic() {
    assert_eq!(render(), render());
}
