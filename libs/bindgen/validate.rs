//! Catalog validation
//!
//! Collects every problem instead of stopping at the first one.

use crate::catalog::{Catalog, Direction, InboundEntry, OutboundEntry};
use crate::error::{SchemaIssue, SchemaValidationError};
use crate::shape::Shape;
use std::collections::HashSet;

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
    "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true", "type", "unsafe",
    "use", "where", "while", "abstract", "become", "box", "do", "final", "gen", "macro", "override",
    "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Argument names the generated emitters use for their own locals
const RESERVED_ARGS: &[&str] = &["payload", "callback"];

pub fn validate(catalog: &Catalog) -> Result<(), SchemaValidationError> {
    let mut issues = Issues::default();

    let mut wire_names = HashSet::new();
    let mut names = HashSet::new();
    for (index, entry) in catalog.on.iter().enumerate() {
        let at = location(Direction::Inbound, index, &entry.name);
        check_common(&mut issues, &at, &entry.name, &entry.event, &mut names, &mut wire_names);
        check_shape(&mut issues, &at, "type", &entry.shape);
        check_inbound(&mut issues, &at, entry);
    }

    let mut wire_names = HashSet::new();
    let mut names = HashSet::new();
    for (index, entry) in catalog.emit.iter().enumerate() {
        let at = location(Direction::Outbound, index, &entry.name);
        check_common(&mut issues, &at, &entry.name, &entry.event, &mut names, &mut wire_names);
        check_outbound(&mut issues, &at, entry);
    }

    if issues.0.is_empty() {
        Ok(())
    } else {
        Err(SchemaValidationError { issues: issues.0 })
    }
}

#[derive(Default)]
struct Issues(Vec<SchemaIssue>);

impl Issues {
    fn push(&mut self, location: &str, message: impl Into<String>) {
        self.0.push(SchemaIssue {
            location: location.to_string(),
            message: message.into(),
        });
    }
}

fn location(direction: Direction, index: usize, name: &str) -> String {
    format!("{direction}[{index}] `{name}`")
}

fn check_common<'a>(
    issues: &mut Issues,
    at: &str,
    name: &'a str,
    event: &'a str,
    names: &mut HashSet<&'a str>,
    wire_names: &mut HashSet<&'a str>,
) {
    if !is_snake_ident(name) {
        issues.push(at, format!("accessor name `{name}` is not a lowercase Rust identifier"));
    }
    if !names.insert(name) {
        issues.push(at, format!("duplicate accessor name `{name}`"));
    }
    if event.is_empty() {
        issues.push(at, "wire name is empty");
    } else if !wire_names.insert(event) {
        issues.push(at, format!("duplicate wire name `{event}`"));
    }
}

fn check_shape(issues: &mut Issues, at: &str, field: &str, shape: &Shape) {
    for record in shape.records() {
        if !is_type_ident(record) {
            issues.push(at, format!("{field}: record name `{record}` is not a Rust type name"));
        }
    }
}

fn check_inbound(issues: &mut Issues, at: &str, entry: &InboundEntry) {
    let Some(transform) = &entry.transform else {
        return;
    };

    if !is_snake_ident(&transform.function) {
        issues.push(
            at,
            format!("transform function `{}` is not a Rust function name", transform.function),
        );
    }
    check_shape(issues, at, "transform.input", &transform.input);
    check_shape(issues, at, "transform.output", &transform.output);

    if transform.output != entry.shape {
        issues.push(
            at,
            format!(
                "transform output `{}` does not match the entry type `{}`",
                transform.output, entry.shape
            ),
        );
    }
    if transform.input == Shape::Null && entry.shape != Shape::Null {
        issues.push(at, "transform input is `null` but the entry carries data");
    }
}

fn check_outbound(issues: &mut Issues, at: &str, entry: &OutboundEntry) {
    let mut arg_names = HashSet::new();
    let mut seen_default = false;

    for arg in &entry.args {
        let arg_at = format!("{at} arg `{}`", arg.name);

        if !is_snake_ident(&arg.name) {
            issues.push(&arg_at, "argument name is not a lowercase Rust identifier");
        } else if RESERVED_ARGS.contains(&arg.name.as_str()) {
            issues.push(&arg_at, "argument name is reserved by the generated code");
        }
        if !arg_names.insert(arg.name.as_str()) {
            issues.push(&arg_at, "duplicate argument name");
        }
        check_shape(issues, &arg_at, "type", &arg.shape);

        if !arg.cast && !arg.shape.is_json_native() {
            issues.push(
                &arg_at,
                format!("`{}` is not JSON-native; mark the argument `cast`", arg.shape),
            );
        }

        match &arg.default {
            Some(default) => {
                seen_default = true;
                if !arg.shape.supports_default() {
                    issues.push(&arg_at, format!("`{}` arguments cannot have a default", arg.shape));
                } else if !arg.shape.accepts(default) {
                    issues.push(
                        &arg_at,
                        format!("default {default} is not a valid `{}` literal", arg.shape),
                    );
                }
            }
            None if seen_default => {
                issues.push(&arg_at, "required argument follows an argument with a default");
            }
            None => {}
        }
    }

    if let Some(callback) = &entry.callback {
        check_shape(issues, at, "callback", callback);
    }

    if let Some(payload) = &entry.payload {
        check_shape(issues, at, "payload", payload);
        if !payload_matches(payload, entry) {
            issues.push(
                at,
                format!(
                    "payload `{payload}` does not match {} argument(s) ({})",
                    entry.arity(),
                    describe_args(entry)
                ),
            );
        }
    }
}

/// Whether the declared wire shape agrees with what the arguments produce
fn payload_matches(payload: &Shape, entry: &OutboundEntry) -> bool {
    let arg_fits = |expected: &Shape, arg: &crate::catalog::Arg| {
        *expected == arg.shape || (arg.cast && *expected == Shape::Json)
    };

    match entry.args.as_slice() {
        [] => *payload == Shape::Null,
        [single] => arg_fits(payload, single),
        args => match payload {
            Shape::Tuple(items) => {
                items.len() == args.len() && items.iter().zip(args).all(|(s, a)| arg_fits(s, a))
            }
            Shape::List(item) => args.iter().all(|a| arg_fits(item, a)),
            Shape::Json => true,
            _ => false,
        },
    }
}

fn describe_args(entry: &OutboundEntry) -> String {
    if entry.args.is_empty() {
        return "none".to_string();
    }
    entry
        .args
        .iter()
        .map(|arg| format!("{}: {}", arg.name, arg.shape))
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_snake_ident(name: &str) -> bool {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_lowercase());
    valid_start
        && chars.all(|c| c == '_' || c.is_ascii_lowercase() || c.is_ascii_digit())
        && name != "_"
        && !KEYWORDS.contains(&name)
}

fn is_type_ident(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !KEYWORDS.contains(&name)
}
