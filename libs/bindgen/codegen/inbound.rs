use super::writer::SourceWriter;
use super::BindingOptions;
use crate::catalog::InboundEntry;

/// `on_<name>` and `<name>_registrar` for one inbound entry
pub(super) fn write_inbound(w: &mut SourceWriter, entry: &InboundEntry, options: &BindingOptions) {
    let rt = &options.runtime_path;
    let ty = entry.shape.rust_type(&options.models_path, rt);
    let wire = format!("{:?}", entry.event);

    let summary = entry
        .doc
        .clone()
        .unwrap_or_else(|| format!("`{}` frames, delivered as `{}`.", entry.event, entry.shape));

    w.doc(&summary);
    w.line(format!("pub fn on_{}<L>(&self, listener: L)", entry.name));
    w.line("where");
    w.line(format!("    L: {rt}::Listener<{ty}>,"));
    w.block("{", "}", |w| {
        w.line(format!("self.{}_registrar().register(listener)", entry.name));
    });
    w.blank();

    w.doc(&format!(
        "Deferred form of [`Self::on_{}`]; the listener attaches on `register`.",
        entry.name
    ));
    w.block(
        format!("pub fn {}_registrar(&self) -> {rt}::Registrar<{ty}> {{", entry.name),
        "}",
        |w| match &entry.transform {
            None => {
                w.line(format!("self.registrar({wire}, {rt}::decode_payload::<{ty}>)"));
            }
            Some(transform) => {
                let input = transform.input.rust_type(&options.models_path, rt);
                w.block(format!("self.registrar({wire}, |raw| {{"), "})", |w| {
                    w.line(format!(
                        "{rt}::decode_payload::<{input}>(raw).map({}::{})",
                        options.transforms_path, transform.function
                    ));
                });
            }
        },
    );
}
