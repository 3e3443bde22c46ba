//! Declared argument shapes: JSON Schema generation and validation.

use serde_json::{json, Map, Value};

use super::error::ArgError;

pub type JsonObject = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Number,
    String,
    /// A string restricted to one of the listed choices.
    Choice(&'static [&'static str]),
}

impl ParamKind {
    fn json_type(self) -> &'static str {
        match self {
            ParamKind::Number => "number",
            ParamKind::String | ParamKind::Choice(_) => "string",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

impl Param {
    pub const fn number(name: &'static str, description: &'static str) -> Self {
        Self { name, kind: ParamKind::Number, required: true, description }
    }

    pub const fn string(name: &'static str, description: &'static str) -> Self {
        Self { name, kind: ParamKind::String, required: true, description }
    }

    pub const fn choice(
        name: &'static str,
        choices: &'static [&'static str],
        description: &'static str,
    ) -> Self {
        Self { name, kind: ParamKind::Choice(choices), required: true, description }
    }

    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn check(&self, value: &Value) -> Result<(), ArgError> {
        let type_ok = match self.kind {
            ParamKind::Number => value.is_number(),
            ParamKind::String | ParamKind::Choice(_) => value.is_string(),
        };
        if !type_ok {
            return Err(ArgError::WrongType {
                name: self.name,
                expected: self.kind.json_type(),
            });
        }
        if let (ParamKind::Choice(choices), Some(s)) = (self.kind, value.as_str()) {
            if !choices.contains(&s) {
                return Err(ArgError::NotAChoice {
                    name: self.name,
                    value: s.to_owned(),
                    choices: choices.join(", "),
                });
            }
        }
        Ok(())
    }
}

/// JSON Schema object describing `params`, as advertised in `tools/list`.
pub fn input_schema(params: &[Param]) -> JsonObject {
    let mut properties = Map::new();
    for p in params {
        let mut prop = json!({ "type": p.kind.json_type(), "description": p.description });
        if let ParamKind::Choice(choices) = p.kind {
            prop["enum"] = json!(choices);
        }
        properties.insert(p.name.to_owned(), prop);
    }
    let required: Vec<&str> = params.iter().filter(|p| p.required).map(|p| p.name).collect();

    let mut schema = Map::new();
    schema.insert("type".into(), json!("object"));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".into(), json!(required));
    }
    schema
}

/// Arguments that passed validation against a tool's declared params.
/// Undeclared keys are dropped.
#[derive(Debug, Clone, Default)]
pub struct Args(JsonObject);

impl Args {
    pub fn validate(params: &[Param], raw: Option<JsonObject>) -> Result<Self, ArgError> {
        let mut raw = raw.unwrap_or_default();
        let mut out = Map::new();
        for p in params {
            match raw.remove(p.name) {
                Some(value) => {
                    p.check(&value)?;
                    out.insert(p.name.to_owned(), value);
                }
                None if p.required => return Err(ArgError::Missing(p.name)),
                None => {}
            }
        }
        Ok(Self(out))
    }

    pub fn number(&self, name: &'static str) -> Result<f64, ArgError> {
        self.opt_number(name).ok_or(ArgError::Missing(name))
    }

    pub fn opt_number(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(Value::as_f64)
    }

    pub fn string(&self, name: &'static str) -> Result<&str, ArgError> {
        self.opt_string(name).ok_or(ArgError::Missing(name))
    }

    pub fn opt_string(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }
}
