//! 载荷校验（PayloadSchema）
//!
//! - `TypedSchema<T>`：载荷必须能反序列化为 `T`；
//! - `ObjectSchema`：逐字段声明的结构化 schema，默认忽略未声明字段，`strict()` 时拒绝。
//!
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

/// 载荷校验器
pub trait PayloadSchema: Send + Sync {
    /// 校验载荷；不做任何强制类型转换
    fn validate(&self, payload: &Value) -> Result<(), SchemaViolation>;

    /// 用于日志与调试的简短描述
    fn describe(&self) -> String;
}

/// 校验失败的位置与原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("schema violation at `{path}`: expected {expected}, found {found}")]
pub struct SchemaViolation {
    pub path: String,
    pub expected: String,
    pub found: String,
}

impl SchemaViolation {
    fn new(path: &str, expected: impl Into<String>, found: Option<&Value>) -> Self {
        Self {
            path: path.to_string(),
            expected: expected.into(),
            found: found.map(value_kind).unwrap_or("nothing").to_string(),
        }
    }
}

// ============================================================================
// TypedSchema
// ============================================================================

/// 以 serde 类型作为 schema
pub struct TypedSchema<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedSchema<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for TypedSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PayloadSchema for TypedSchema<T>
where
    T: DeserializeOwned,
{
    fn validate(&self, payload: &Value) -> Result<(), SchemaViolation> {
        <T as serde::Deserialize<'_>>::deserialize(payload)
            .map(|_| ())
            .map_err(|e| SchemaViolation {
                path: "$".to_string(),
                expected: type_name::<T>().to_string(),
                found: e.to_string(),
            })
    }

    fn describe(&self) -> String {
        format!("typed<{}>", type_name::<T>())
    }
}

// ============================================================================
// ObjectSchema
// ============================================================================

/// 字段类型
#[derive(Debug, Clone)]
pub enum FieldKind {
    String,
    Number,
    Integer,
    Boolean,
    Array(Box<FieldKind>),
    Object(ObjectSchema),
    Optional(Box<FieldKind>),
    Any,
}

impl FieldKind {
    pub fn array(of: FieldKind) -> Self {
        FieldKind::Array(Box::new(of))
    }

    pub fn optional(of: FieldKind) -> Self {
        FieldKind::Optional(Box::new(of))
    }

    pub fn object(schema: ObjectSchema) -> Self {
        FieldKind::Object(schema)
    }

    fn check(&self, value: Option<&Value>, path: &str) -> Result<(), SchemaViolation> {
        match (self, value) {
            (FieldKind::Any, _) => Ok(()),
            (FieldKind::Optional(_), None) => Ok(()),
            (FieldKind::Optional(inner), Some(v)) => inner.check(Some(v), path),
            (FieldKind::String, Some(Value::String(_))) => Ok(()),
            (FieldKind::Number, Some(Value::Number(_))) => Ok(()),
            (FieldKind::Integer, Some(Value::Number(n))) if is_integral(n) => Ok(()),
            (FieldKind::Boolean, Some(Value::Bool(_))) => Ok(()),
            (FieldKind::Array(of), Some(Value::Array(items))) => {
                for (i, item) in items.iter().enumerate() {
                    of.check(Some(item), &format!("{path}[{i}]"))?;
                }
                Ok(())
            }
            (FieldKind::Object(schema), Some(v)) => schema.check(v, path),
            (kind, found) => Err(SchemaViolation::new(path, kind.to_string(), found)),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::String => f.write_str("string"),
            FieldKind::Number => f.write_str("number"),
            FieldKind::Integer => f.write_str("integer"),
            FieldKind::Boolean => f.write_str("boolean"),
            FieldKind::Array(of) => write!(f, "array<{of}>"),
            FieldKind::Object(_) => f.write_str("object"),
            FieldKind::Optional(of) => write!(f, "optional<{of}>"),
            FieldKind::Any => f.write_str("any"),
        }
    }
}

/// 结构化对象 schema
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    fields: Vec<(String, FieldKind)>,
    strict: bool,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// 声明一个字段；重复声明时后者覆盖前者
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        self.fields.retain(|(n, _)| *n != name);
        self.fields.push((name, kind));
        self
    }

    /// 拒绝未声明的字段
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    fn check(&self, value: &Value, path: &str) -> Result<(), SchemaViolation> {
        let Value::Object(map) = value else {
            return Err(SchemaViolation::new(path, "object", Some(value)));
        };

        for (name, kind) in &self.fields {
            kind.check(map.get(name), &format!("{path}.{name}"))?;
        }

        if self.strict {
            if let Some(extra) = map
                .keys()
                .find(|k| !self.fields.iter().any(|(n, _)| n == *k))
            {
                return Err(SchemaViolation::new(
                    &format!("{path}.{extra}"),
                    "no such field",
                    map.get(extra),
                ));
            }
        }

        Ok(())
    }
}

impl PayloadSchema for ObjectSchema {
    fn validate(&self, payload: &Value) -> Result<(), SchemaViolation> {
        self.check(payload, "$")
    }

    fn describe(&self) -> String {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(n, k)| format!("{n}: {k}"))
            .collect();
        format!("object {{ {} }}", fields.join(", "))
    }
}

fn is_integral(n: &serde_json::Number) -> bool {
    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    #[allow(dead_code)]
    struct Greeting {
        value: String,
    }

    #[test]
    fn typed_schema_rejects_wrong_field_type() {
        let schema = TypedSchema::<Greeting>::new();
        assert!(schema.validate(&json!({"value": "hi"})).is_ok());
        assert!(schema.validate(&json!({"value": 10})).is_err());
        assert!(schema.validate(&json!({})).is_err());
    }

    #[test]
    fn object_schema_reports_nested_path() {
        let answer = ObjectSchema::new()
            .field("answer", FieldKind::String)
            .field("question", FieldKind::String);
        let schema = ObjectSchema::new()
            .field("answers", FieldKind::array(FieldKind::object(answer)))
            .field("uri", FieldKind::String);

        let ok = json!({"answers": [{"answer": "a", "question": "q"}], "uri": "u"});
        assert!(schema.validate(&ok).is_ok());

        let bad = json!({"answers": [{"answer": "a", "question": 1}], "uri": "u"});
        let err = schema.validate(&bad).unwrap_err();
        assert_eq!(err.path, "$.answers[0].question");
        assert_eq!(err.expected, "string");
        assert_eq!(err.found, "number");
    }

    #[test]
    fn object_schema_optional_and_strict() {
        let schema = ObjectSchema::new()
            .field("value", FieldKind::Integer)
            .field("note", FieldKind::optional(FieldKind::String));

        assert!(schema.validate(&json!({"value": 3})).is_ok());
        assert!(schema.validate(&json!({"value": 3, "extra": true})).is_ok());
        assert!(schema.validate(&json!({"value": 3.5})).is_err());
        assert!(schema.validate(&json!({"value": 3, "note": null})).is_err());

        let strict = schema.strict();
        let err = strict
            .validate(&json!({"value": 3, "extra": true}))
            .unwrap_err();
        assert_eq!(err.path, "$.extra");
    }

    #[test]
    fn object_schema_rejects_non_object_payload() {
        let schema = ObjectSchema::new().field("value", FieldKind::String);
        let err = schema.validate(&json!("value")).unwrap_err();
        assert_eq!(err.path, "$");
        assert_eq!(err.found, "string");
    }
}
