//! Tool input schemas: declaration, JSON-schema export and validation.

use crate::error::{MediabotError, Result};
use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use serde_json::{json, Map, Value};

/// Semantic type of a tool parameter, with its constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    String,
    /// Whole number within an inclusive range.
    Integer { min: Option<i64>, max: Option<i64> },
    /// Any number not below `min`.
    Number { min: Option<f64> },
    Boolean,
    StringList,
    /// One of a fixed set of lowercase names. Matching ignores case.
    Enum(&'static [&'static str]),
}

/// One named parameter of a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    pub required: bool,
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn required(name: &str, kind: ParamKind, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &str, kind: ParamKind, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    /// Optional parameter filled with `default` when absent.
    pub fn with_default(mut self, default: Value) -> Self {
        self.required = false;
        self.default = Some(default);
        self
    }

    fn json_schema(&self) -> Value {
        let mut schema = match &self.kind {
            ParamKind::String => json!({ "type": "string" }),
            ParamKind::Integer { min, max } => {
                let mut s = json!({ "type": "integer" });
                if let Some(min) = min {
                    s["minimum"] = json!(min);
                }
                if let Some(max) = max {
                    s["maximum"] = json!(max);
                }
                s
            }
            ParamKind::Number { min } => {
                let mut s = json!({ "type": "number" });
                if let Some(min) = min {
                    s["minimum"] = json!(min);
                }
                s
            }
            ParamKind::Boolean => json!({ "type": "boolean" }),
            ParamKind::StringList => json!({ "type": "array", "items": { "type": "string" } }),
            ParamKind::Enum(values) => json!({ "type": "string", "enum": values }),
        };
        schema["description"] = json!(self.description);
        if let Some(default) = &self.default {
            schema["default"] = default.clone();
        }
        schema
    }

    /// Check one present value, returning it normalised.
    fn check(&self, tool: &str, value: &Value) -> Result<Value> {
        let fail = |reason: String| MediabotError::schema(tool, &self.name, reason);

        match &self.kind {
            ParamKind::String => value
                .as_str()
                .map(|_| value.clone())
                .ok_or_else(|| fail(format!("must be a string, got {}", type_name(value)))),
            ParamKind::Integer { min, max } => {
                let n = value
                    .as_i64()
                    .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                    .ok_or_else(|| fail(format!("must be an integer, got {}", type_name(value))))?;
                if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
                    return Err(fail(format!(
                        "must be between {} and {}, got {}",
                        min.map(|m| m.to_string()).unwrap_or_else(|| "-inf".into()),
                        max.map(|m| m.to_string()).unwrap_or_else(|| "inf".into()),
                        n
                    )));
                }
                Ok(json!(n))
            }
            ParamKind::Number { min } => {
                let n = value
                    .as_f64()
                    .ok_or_else(|| fail(format!("must be a number, got {}", type_name(value))))?;
                if min.is_some_and(|m| n < m) {
                    return Err(fail(format!("must be at least {}, got {}", min.unwrap_or_default(), n)));
                }
                Ok(value.clone())
            }
            ParamKind::Boolean => value
                .as_bool()
                .map(|_| value.clone())
                .ok_or_else(|| fail(format!("must be true or false, got {}", type_name(value)))),
            ParamKind::StringList => {
                let items = value
                    .as_array()
                    .ok_or_else(|| fail(format!("must be a list of strings, got {}", type_name(value))))?;
                if items.iter().any(|i| !i.is_string()) {
                    return Err(fail("must contain only strings".to_string()));
                }
                Ok(value.clone())
            }
            ParamKind::Enum(values) => {
                let s = value
                    .as_str()
                    .ok_or_else(|| fail(format!("must be one of {}", values.join(", "))))?;
                let lowered = s.trim().to_lowercase();
                if values.contains(&lowered.as_str()) {
                    Ok(json!(lowered))
                } else {
                    Err(fail(format!("must be one of {}, got '{}'", values.join(", "), s)))
                }
            }
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// Name, description and ordered parameters of a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolSpec {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// JSON schema of the arguments object.
    pub fn parameters_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.clone(), p.json_schema()))
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Function-calling definition for the chat completions API.
    pub fn to_function(&self) -> ChatCompletionTool {
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: self.name.clone(),
                description: Some(self.description.clone()),
                parameters: Some(self.parameters_schema()),
                strict: None,
            },
        }
    }

    /// Validate `args` and return them normalised.
    ///
    /// Enum values are lowercased, integers given as whole floats become
    /// integers and declared defaults are filled in. Unknown fields are dropped.
    /// The first offending field is reported.
    pub fn validate(&self, args: &Value) -> Result<Value> {
        let empty = Map::new();
        let object = match args {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(MediabotError::schema(
                    &self.name,
                    "arguments",
                    format!("must be an object, got {}", type_name(other)),
                ))
            }
        };

        let mut normalised = Map::new();
        for param in &self.params {
            match object.get(&param.name).filter(|v| !v.is_null()) {
                Some(value) => {
                    normalised.insert(param.name.clone(), param.check(&self.name, value)?);
                }
                None if param.required => {
                    return Err(MediabotError::schema(&self.name, &param.name, "is required"));
                }
                None => {
                    if let Some(default) = &param.default {
                        normalised.insert(param.name.clone(), default.clone());
                    }
                }
            }
        }
        Ok(Value::Object(normalised))
    }
}
