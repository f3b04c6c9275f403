//! Structural payload types
//!
//! A catalog names a payload type either with a scalar keyword or with a
//! single-key object:
//!
//! ```text
//! "null" "bool" "int" "float" "string" "json"
//! {"record": "Deal"}
//! {"list": <shape>}
//! {"tuple": [<shape>, ...]}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum Shape {
    Null,
    Bool,
    Int,
    Float,
    String,
    /// Any JSON value, passed through untouched
    Json,
    /// Named model type
    Record(String),
    List(Box<Shape>),
    Tuple(Vec<Shape>),
}

impl Shape {
    /// Rust type for this shape
    ///
    /// Records resolve under `models`, `json` under `runtime`.
    pub fn rust_type(&self, models: &str, runtime: &str) -> String {
        match self {
            Shape::Null => "()".to_string(),
            Shape::Bool => "bool".to_string(),
            Shape::Int => "i64".to_string(),
            Shape::Float => "f64".to_string(),
            Shape::String => "String".to_string(),
            Shape::Json => format!("{runtime}::Value"),
            Shape::Record(name) => format!("{models}::{name}"),
            Shape::List(item) => format!("Vec<{}>", item.rust_type(models, runtime)),
            Shape::Tuple(items) => {
                let parts: Vec<String> = items.iter().map(|s| s.rust_type(models, runtime)).collect();
                if parts.len() == 1 {
                    format!("({},)", parts[0])
                } else {
                    format!("({})", parts.join(", "))
                }
            }
        }
    }

    /// Whether a value of this shape converts into a JSON value with
    /// `Value::from` alone
    pub fn is_json_native(&self) -> bool {
        match self {
            Shape::Null | Shape::Bool | Shape::Int | Shape::Float | Shape::String | Shape::Json => true,
            Shape::List(item) => item.is_json_native(),
            Shape::Record(_) | Shape::Tuple(_) => false,
        }
    }

    /// Whether a catalog `default` literal can be written for this shape
    pub fn supports_default(&self) -> bool {
        matches!(
            self,
            Shape::Bool | Shape::Int | Shape::Float | Shape::String | Shape::Json
        )
    }

    /// Whether `value` is a valid literal of this shape
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Shape::Null => value.is_null(),
            Shape::Bool => value.is_boolean(),
            Shape::Int => value.is_i64(),
            Shape::Float => value.is_number(),
            Shape::String => value.is_string(),
            Shape::Json => true,
            Shape::Record(_) => value.is_object(),
            Shape::List(item) => value
                .as_array()
                .is_some_and(|items| items.iter().all(|v| item.accepts(v))),
            Shape::Tuple(shapes) => value.as_array().is_some_and(|items| {
                items.len() == shapes.len() && shapes.iter().zip(items).all(|(s, v)| s.accepts(v))
            }),
        }
    }

    /// Record names referenced anywhere inside this shape
    pub fn records(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_records(&mut out);
        out
    }

    fn collect_records<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Shape::Record(name) => out.push(name),
            Shape::List(item) => item.collect_records(out),
            Shape::Tuple(items) => items.iter().for_each(|s| s.collect_records(out)),
            _ => {}
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Null => f.write_str("null"),
            Shape::Bool => f.write_str("bool"),
            Shape::Int => f.write_str("int"),
            Shape::Float => f.write_str("float"),
            Shape::String => f.write_str("string"),
            Shape::Json => f.write_str("json"),
            Shape::Record(name) => write!(f, "record {name}"),
            Shape::List(item) => write!(f, "list<{item}>"),
            Shape::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl TryFrom<Value> for Shape {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(name) => match name.as_str() {
                "null" => Ok(Shape::Null),
                "bool" => Ok(Shape::Bool),
                "int" => Ok(Shape::Int),
                "float" => Ok(Shape::Float),
                "string" => Ok(Shape::String),
                "json" => Ok(Shape::Json),
                other => Err(format!("unknown scalar type `{other}`")),
            },
            Value::Object(map) => {
                if map.len() != 1 {
                    return Err(format!(
                        "a composite type is an object with exactly one key, found {} keys",
                        map.len()
                    ));
                }
                let Some((key, inner)) = map.into_iter().next() else {
                    return Err("empty composite type".to_string());
                };
                match (key.as_str(), inner) {
                    ("record", Value::String(name)) => Ok(Shape::Record(name)),
                    ("record", other) => Err(format!("record name must be a string, found {other}")),
                    ("list", inner) => Ok(Shape::List(Box::new(Shape::try_from(inner)?))),
                    ("tuple", Value::Array(items)) if !items.is_empty() => Ok(Shape::Tuple(
                        items
                            .into_iter()
                            .map(Shape::try_from)
                            .collect::<Result<_, _>>()?,
                    )),
                    ("tuple", _) => Err("tuple must list at least one element type".to_string()),
                    (other, _) => Err(format!("unknown composite type `{other}`")),
                }
            }
            other => Err(format!("expected a type name or a composite type object, found {other}")),
        }
    }
}

impl From<Shape> for Value {
    fn from(shape: Shape) -> Self {
        let single = |key: &str, inner: Value| {
            let mut map = Map::new();
            map.insert(key.to_string(), inner);
            Value::Object(map)
        };
        match shape {
            Shape::Null => Value::from("null"),
            Shape::Bool => Value::from("bool"),
            Shape::Int => Value::from("int"),
            Shape::Float => Value::from("float"),
            Shape::String => Value::from("string"),
            Shape::Json => Value::from("json"),
            Shape::Record(name) => single("record", Value::String(name)),
            Shape::List(item) => single("list", Value::from(*item)),
            Shape::Tuple(items) => single("tuple", Value::Array(items.into_iter().map(Value::from).collect())),
        }
    }
}
