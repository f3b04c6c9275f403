use super::writer::SourceWriter;
use super::BindingOptions;
use crate::catalog::{Arg, OutboundEntry};
use crate::shape::Shape;
use serde_json::Value;

/// Emitters with more parameters than this get a clippy allowance
const CLIPPY_MAX_ARGS: usize = 7;

/// `emit_<name>` for one outbound entry
pub(super) fn write_outbound(w: &mut SourceWriter, entry: &OutboundEntry, options: &BindingOptions) {
    let rt = &options.runtime_path;

    let mut params: Vec<String> = entry.args.iter().map(|arg| parameter(arg, options)).collect();
    if let Some(callback) = &entry.callback {
        let ty = callback.rust_type(&options.models_path, rt);
        params.push(format!("callback: Option<{rt}::TypedAck<{ty}>>"));
    }

    let summary = entry.doc.clone().unwrap_or_else(|| format!("Emit `{}`.", entry.event));
    w.doc(&summary);
    let defaults: Vec<String> = entry
        .args
        .iter()
        .filter_map(|arg| arg.default.as_ref().map(|d| format!("`{}` defaults to `{d}`", arg.name)))
        .collect();
    if !defaults.is_empty() {
        w.doc("");
        w.doc(&format!("When `None`: {}.", defaults.join(", ")));
    }
    if params.len() > CLIPPY_MAX_ARGS {
        w.line("#[allow(clippy::too_many_arguments)]");
    }

    let mut signature = format!("pub async fn emit_{}(&self", entry.name);
    for param in &params {
        signature.push_str(", ");
        signature.push_str(param);
    }
    signature.push_str(&format!(") -> {rt}::Result<()> {{"));

    w.block(signature, "}", |w| {
        for arg in &entry.args {
            if let Some(line) = normalize(arg, rt) {
                w.line(line);
            }
        }

        let values: Vec<String> = entry.args.iter().map(|arg| to_value(arg, rt)).collect();
        let payload = match values.as_slice() {
            [] => "None".to_string(),
            [single] => format!("Some({single})"),
            many => format!("Some({rt}::Value::Array(vec![{}]))", many.join(", ")),
        };
        let ack = if entry.callback.is_some() {
            format!("callback.map({rt}::Ack::from)")
        } else {
            "None".to_string()
        };

        w.line(format!("self.emit({:?}, {payload}, {ack}).await", entry.event));
    });
}

fn parameter(arg: &Arg, options: &BindingOptions) -> String {
    let ty = arg.shape.rust_type(&options.models_path, &options.runtime_path);
    match (&arg.shape, &arg.default) {
        (_, Some(_)) => format!("{}: Option<{ty}>", arg.name),
        (Shape::String, None) => format!("{}: impl Into<String>", arg.name),
        _ => format!("{}: {ty}", arg.name),
    }
}

/// Statement turning the parameter into its plain Rust type, if needed
fn normalize(arg: &Arg, rt: &str) -> Option<String> {
    let name = &arg.name;
    match (&arg.default, &arg.shape) {
        (Some(default), shape) => {
            let literal = default_literal(shape, default, rt);
            Some(match shape {
                Shape::String | Shape::Json => format!("let {name} = {name}.unwrap_or_else(|| {literal});"),
                _ => format!("let {name} = {name}.unwrap_or({literal});"),
            })
        }
        (None, Shape::String) => Some(format!("let {name}: String = {name}.into();")),
        (None, _) => None,
    }
}

fn to_value(arg: &Arg, rt: &str) -> String {
    if arg.cast {
        format!("{rt}::to_payload(&{})?", arg.name)
    } else {
        format!("{rt}::Value::from({})", arg.name)
    }
}

/// Rust expression for a validated default literal
fn default_literal(shape: &Shape, value: &Value, rt: &str) -> String {
    match shape {
        Shape::Bool => value.as_bool().unwrap_or_default().to_string(),
        Shape::Int => value.as_i64().unwrap_or_default().to_string(),
        Shape::Float => format!("{:?}", value.as_f64().unwrap_or_default()),
        Shape::String => format!("{:?}.to_string()", value.as_str().unwrap_or_default()),
        _ => json_literal(value, rt),
    }
}

/// Rust expression building `value` as a runtime `Value`
pub(super) fn json_literal(value: &Value, rt: &str) -> String {
    match value {
        Value::Null => format!("{rt}::Value::Null"),
        Value::Bool(b) => format!("{rt}::Value::Bool({b})"),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                format!("{rt}::Value::from({i}_i64)")
            } else if let Some(u) = n.as_u64() {
                format!("{rt}::Value::from({u}_u64)")
            } else {
                format!("{rt}::Value::from({:?}_f64)", n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => format!("{rt}::Value::from({s:?})"),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(|v| json_literal(v, rt)).collect();
            format!("{rt}::Value::Array(vec![{}])", items.join(", "))
        }
        Value::Object(map) if map.is_empty() => format!("{rt}::Value::Object(Default::default())"),
        Value::Object(map) => {
            let fields: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("({k:?}.to_string(), {})", json_literal(v, rt)))
                .collect();
            format!(
                "{rt}::Value::Object([{}].into_iter().collect())",
                fields.join(", ")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_literal() {
        assert_eq!(json_literal(&json!(null), "rt"), "rt::Value::Null");
        assert_eq!(json_literal(&json!(-3), "rt"), "rt::Value::from(-3_i64)");
        assert_eq!(json_literal(&json!(1.5), "rt"), "rt::Value::from(1.5_f64)");
        assert_eq!(
            json_literal(&json!(["a", true]), "rt"),
            r#"rt::Value::Array(vec![rt::Value::from("a"), rt::Value::Bool(true)])"#
        );
        assert_eq!(
            json_literal(&json!({"period": 30}), "rt"),
            r#"rt::Value::Object([("period".to_string(), rt::Value::from(30_i64))].into_iter().collect())"#
        );
        assert_eq!(json_literal(&json!({}), "rt"), "rt::Value::Object(Default::default())");
    }

    #[test]
    fn test_default_literals() {
        assert_eq!(default_literal(&Shape::Float, &json!(30), "rt"), "30.0");
        assert_eq!(default_literal(&Shape::Int, &json!(30), "rt"), "30");
        assert_eq!(default_literal(&Shape::String, &json!("a\"b"), "rt"), r#""a\"b".to_string()"#);
    }
}
