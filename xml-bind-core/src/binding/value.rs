use std::fmt::{self, Display, Formatter};

/// The closed set of leaf types a schema can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Bool,
    Int,
}

/// A typed leaf value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Bool(bool),
    Int(i32),
}

impl FieldKind {
    /// The value a cleared leaf of this kind holds.
    pub fn default_value(self) -> Value {
        match self {
            FieldKind::Text => Value::Text(String::new()),
            FieldKind::Bool => Value::Bool(false),
            FieldKind::Int => Value::Int(0),
        }
    }

    /// String-level check that runs before conversion.
    pub fn accepts_str(self, raw: &str) -> bool {
        match self {
            FieldKind::Text => true,
            FieldKind::Bool => parse_bool(raw).is_some(),
            FieldKind::Int => raw.trim().parse::<i32>().is_ok(),
        }
    }

    /// Convert raw text into a value of this kind.
    pub fn convert(self, raw: &str) -> Option<Value> {
        match self {
            FieldKind::Text => Some(Value::Text(raw.to_string())),
            FieldKind::Bool => parse_bool(raw).map(Value::Bool),
            FieldKind::Int => raw.trim().parse::<i32>().ok().map(Value::Int),
        }
    }

    pub fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (FieldKind::Text, Value::Text(_))
                | (FieldKind::Bool, Value::Bool(_))
                | (FieldKind::Int, Value::Int(_))
        )
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => f.write_str(text),
            Value::Bool(flag) => f.write_str(if *flag { "true" } else { "false" }),
            Value::Int(number) => write!(f, "{number}"),
        }
    }
}

/// Value-level validator attached to a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Every value of the right kind is valid.
    Any,
    /// Text must equal one of the listed values (case-sensitive).
    OneOf(&'static [&'static str]),
    /// Integer within the inclusive bounds.
    Range { min: i32, max: i32 },
    /// Text length in characters within the inclusive bounds.
    Length { min: usize, max: usize },
}

impl Rule {
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Rule::Any, _) => true,
            (Rule::OneOf(allowed), Value::Text(text)) => allowed.contains(&text.as_str()),
            (Rule::Range { min, max }, Value::Int(number)) => (*min..=*max).contains(number),
            (Rule::Length { min, max }, Value::Text(text)) => {
                (*min..=*max).contains(&text.chars().count())
            }
            _ => false,
        }
    }
}

/// How a leaf's value is tagged when saved into an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    /// Keep the tag the value was loaded with, else ask the store's policy.
    Inherit,
    /// Always stored unprotected.
    Never,
}
