// Tagged tool arguments and their declared schema

use std::collections::BTreeMap;
use std::fmt;

/// The kind of value a parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamKind {
    /// JSON Schema type name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An argument value tagged with its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    String(String),
    Number(f64),
    Boolean(bool),
    Array(Vec<ParamValue>),
    Object(BTreeMap<String, ParamValue>),
}

impl ParamValue {
    /// `None` for null, which matches no declared kind.
    pub fn kind(&self) -> Option<ParamKind> {
        match self {
            Self::Null => None,
            Self::String(_) => Some(ParamKind::String),
            Self::Number(_) => Some(ParamKind::Number),
            Self::Boolean(_) => Some(ParamKind::Boolean),
            Self::Array(_) => Some(ParamKind::Array),
            Self::Object(_) => Some(ParamKind::Object),
        }
    }

    /// Whether this is the zero value of its kind. A required parameter
    /// holding its zero value counts as missing.
    pub fn is_default(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            Self::Number(n) => *n == 0.0,
            Self::Boolean(b) => !b,
            Self::Array(items) => items.is_empty(),
            Self::Object(fields) => fields.is_empty(),
        }
    }
}

impl From<serde_json::Value> for ParamValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or_default()),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(fields) => Self::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Argument validation failures. Reported to the caller as tool errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("missing required parameter: {0}")]
    Missing(String),

    #[error("parameter {name} is not of type {expected}")]
    WrongType { name: String, expected: ParamKind },

    #[error("tool arguments must be an object")]
    NotAnObject,
}

/// A declared tool parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    pub description: String,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: description.into(),
        }
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamKind::String, description)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Build the JSON Schema `inputSchema` object for a parameter list.
pub fn input_schema(params: &[ParamSpec]) -> serde_json::Value {
    let properties: serde_json::Map<String, serde_json::Value> = params
        .iter()
        .map(|p| {
            (
                p.name.clone(),
                serde_json::json!({
                    "type": p.kind.as_str(),
                    "description": p.description,
                }),
            )
        })
        .collect();

    let required: Vec<&str> = params
        .iter()
        .filter(|p| p.required)
        .map(|p| p.name.as_str())
        .collect();

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Arguments of a single tool call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: BTreeMap<String, ParamValue>,
}

impl Arguments {
    /// Accepts an object or an absent/null value (no arguments).
    pub fn from_json(value: Option<serde_json::Value>) -> Result<Self, ParamError> {
        match value.map(ParamValue::from) {
            None | Some(ParamValue::Null) => Ok(Self::default()),
            Some(ParamValue::Object(values)) => Ok(Self { values }),
            Some(_) => Err(ParamError::NotAnObject),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Check every declared parameter against the supplied values.
    ///
    /// Required parameters must be present, of the declared kind and not the
    /// zero value. Optional parameters are only kind-checked when given.
    pub fn validate(&self, params: &[ParamSpec]) -> Result<(), ParamError> {
        for spec in params {
            match self.values.get(&spec.name) {
                None | Some(ParamValue::Null) if spec.required => {
                    return Err(ParamError::Missing(spec.name.clone()));
                }
                None | Some(ParamValue::Null) => {}
                Some(value) => {
                    if value.kind() != Some(spec.kind) {
                        return Err(ParamError::WrongType {
                            name: spec.name.clone(),
                            expected: spec.kind,
                        });
                    }
                    if spec.required && value.is_default() {
                        return Err(ParamError::Missing(spec.name.clone()));
                    }
                }
            }
        }
        Ok(())
    }

    /// A required, non-empty string parameter.
    pub fn required_string(&self, name: &str) -> Result<&str, ParamError> {
        match self.values.get(name) {
            None | Some(ParamValue::Null) => Err(ParamError::Missing(name.to_string())),
            Some(ParamValue::String(s)) if s.is_empty() => {
                Err(ParamError::Missing(name.to_string()))
            }
            Some(ParamValue::String(s)) => Ok(s),
            Some(_) => Err(ParamError::WrongType {
                name: name.to_string(),
                expected: ParamKind::String,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namespace_spec() -> Vec<ParamSpec> {
        vec![ParamSpec::string("namespace", "Namespace to list pods in").required()]
    }

    fn args(value: serde_json::Value) -> Arguments {
        Arguments::from_json(Some(value)).unwrap()
    }

    #[test]
    fn test_missing_required_parameter() {
        let err = args(serde_json::json!({})).validate(&namespace_spec()).unwrap_err();
        assert_eq!(err.to_string(), "missing required parameter: namespace");
    }

    #[test]
    fn test_empty_string_counts_as_missing() {
        let err = args(serde_json::json!({"namespace": ""}))
            .validate(&namespace_spec())
            .unwrap_err();
        assert_eq!(err, ParamError::Missing("namespace".to_string()));
    }

    #[test]
    fn test_wrong_type() {
        let err = args(serde_json::json!({"namespace": 7}))
            .validate(&namespace_spec())
            .unwrap_err();
        assert_eq!(err.to_string(), "parameter namespace is not of type string");
    }

    #[test]
    fn test_optional_parameters() {
        let params = vec![
            ParamSpec::string("namespace", "ns").required(),
            ParamSpec::new("limit", ParamKind::Number, "max results"),
        ];

        assert!(args(serde_json::json!({"namespace": "default"}))
            .validate(&params)
            .is_ok());
        assert!(args(serde_json::json!({"namespace": "default", "limit": 0}))
            .validate(&params)
            .is_ok());
        assert!(args(serde_json::json!({"namespace": "default", "limit": "5"}))
            .validate(&params)
            .is_err());
    }

    #[test]
    fn test_required_string() {
        let arguments = args(serde_json::json!({"namespace": "kube-system", "flag": true}));
        assert_eq!(arguments.required_string("namespace").unwrap(), "kube-system");
        assert!(matches!(
            arguments.required_string("flag"),
            Err(ParamError::WrongType { .. })
        ));
        assert_eq!(
            arguments.required_string("other"),
            Err(ParamError::Missing("other".to_string()))
        );
    }

    #[test]
    fn test_arguments_must_be_an_object() {
        assert_eq!(Arguments::from_json(None).unwrap(), Arguments::default());
        assert_eq!(
            Arguments::from_json(Some(serde_json::json!(["default"]))),
            Err(ParamError::NotAnObject)
        );
    }

    #[test]
    fn test_input_schema() {
        let schema = input_schema(&namespace_spec());
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["namespace"]["type"], "string");
        assert_eq!(schema["required"], serde_json::json!(["namespace"]));
    }
}
