//! JSON Schema validation for request and response bodies.
//!
//! [`JsonSchema`] wraps a parsed schema document. Construction compiles every
//! `pattern` regex up front, so a broken schema fails at startup rather than on
//! the first request that exercises it.
//!
//! Supported keywords: `$ref` (local pointers only), `type`, `enum`, `const`,
//! `required`, `properties`, `additionalProperties`, `minProperties`,
//! `maxProperties`, `items`, `minItems`, `maxItems`, `uniqueItems`,
//! `minLength`, `maxLength`, `pattern`, `minimum`, `maximum`,
//! `exclusiveMinimum`, `exclusiveMaximum`, `allOf`, `anyOf`, `oneOf` and `not`.
//! Unknown keywords are ignored.
//!
//! Error messages are formatted as `<property> <message>` where the property
//! path is rooted at `instance`, e.g. `instance.address.zip does not match
//! pattern "^[0-9]{5}$"`.

use std::collections::{HashMap, HashSet};
use std::fmt;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

/// References deeper than this are treated as cycles.
const MAX_DEPTH: usize = 64;

/// Keywords whose values are data, not subschemas.
const DATA_KEYWORDS: &[&str] = &["enum", "const", "default", "examples", "example"];

/// Errors compiling a schema document.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A `pattern` keyword holds an invalid regular expression.
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Regex compiler error.
        #[source]
        source: regex::Error,
    },

    /// The schema document is not an object or boolean.
    #[error("schema must be an object or boolean, got {0}")]
    NotASchema(&'static str),
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Path of the failing value, rooted at `instance`.
    pub property: String,
    /// What went wrong.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.property, self.message)
    }
}

/// Result of a validation operation.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Failures in the order the validator reported them.
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Whether validation passed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Joins every error message with `", "`.
    #[must_use]
    pub fn message(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A compiled JSON Schema document.
#[derive(Debug, Clone)]
pub struct JsonSchema {
    document: Value,
    patterns: HashMap<String, Regex>,
}

impl PartialEq for JsonSchema {
    fn eq(&self, other: &Self) -> bool {
        self.document == other.document
    }
}

impl JsonSchema {
    /// Compiles a schema document.
    pub fn compile(document: Value) -> Result<Self, SchemaError> {
        match &document {
            Value::Object(_) | Value::Bool(_) => {}
            other => return Err(SchemaError::NotASchema(type_name(other))),
        }
        let mut patterns = HashMap::new();
        collect_patterns(&document, &mut patterns)?;
        Ok(Self { document, patterns })
    }

    /// Returns the schema document.
    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Validates an instance against the schema.
    #[must_use]
    pub fn validate(&self, instance: &Value) -> ValidationResult {
        let mut errors = Vec::new();
        let validator = Validator {
            root: &self.document,
            patterns: &self.patterns,
        };
        validator.check(&self.document, instance, "instance", 0, &mut errors);
        ValidationResult { errors }
    }

    /// Returns `true` if the instance is valid.
    #[must_use]
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validate(instance).is_valid()
    }
}

fn collect_patterns(schema: &Value, out: &mut HashMap<String, Regex>) -> Result<(), SchemaError> {
    match schema {
        Value::Object(map) => {
            for (key, value) in map {
                if DATA_KEYWORDS.contains(&key.as_str()) {
                    continue;
                }
                if key == "pattern" {
                    if let Value::String(pattern) = value {
                        if !out.contains_key(pattern) {
                            let regex = Regex::new(pattern).map_err(|source| {
                                SchemaError::InvalidPattern {
                                    pattern: pattern.clone(),
                                    source,
                                }
                            })?;
                            out.insert(pattern.clone(), regex);
                        }
                        continue;
                    }
                }
                collect_patterns(value, out)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_patterns(item, out)?;
            }
        }
        _ => {}
    }
    Ok(())
}

struct Validator<'s> {
    root: &'s Value,
    patterns: &'s HashMap<String, Regex>,
}

impl<'s> Validator<'s> {
    fn check(
        &self,
        schema: &'s Value,
        instance: &Value,
        property: &str,
        depth: usize,
        errors: &mut Vec<ValidationError>,
    ) {
        if depth > MAX_DEPTH {
            push(errors, property, "exceeds maximum schema depth");
            return;
        }

        let map = match schema {
            Value::Bool(true) => return,
            Value::Bool(false) => {
                push(errors, property, "is not allowed by a false schema");
                return;
            }
            Value::Object(map) => map,
            _ => return,
        };

        // A reference replaces its sibling keywords.
        if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
            match self.resolve(reference) {
                Some(target) => self.check(target, instance, property, depth + 1, errors),
                None => push(errors, property, format!("has unresolvable reference {reference:?}")),
            }
            return;
        }

        check_type(map, instance, property, errors);
        check_enum(map, instance, property, errors);

        match instance {
            Value::Object(object) => self.check_object(map, object, property, depth, errors),
            Value::Array(items) => self.check_array(map, items, property, depth, errors),
            Value::String(text) => self.check_string(map, text, property, errors),
            Value::Number(_) => check_number(map, instance, property, errors),
            _ => {}
        }

        self.check_combinators(map, instance, property, depth, errors);
    }

    fn resolve(&self, reference: &str) -> Option<&'s Value> {
        let pointer = reference.strip_prefix('#')?;
        self.root.pointer(pointer)
    }

    fn check_object(
        &self,
        map: &'s Map<String, Value>,
        object: &Map<String, Value>,
        property: &str,
        depth: usize,
        errors: &mut Vec<ValidationError>,
    ) {
        if let Some(required) = map.get("required").and_then(Value::as_array) {
            for name in required.iter().filter_map(Value::as_str) {
                if !object.contains_key(name) {
                    push(errors, property, format!("requires property {name:?}"));
                }
            }
        }

        let properties = map.get("properties").and_then(Value::as_object);
        if let Some(properties) = properties {
            for (name, subschema) in properties {
                if let Some(value) = object.get(name) {
                    self.check(subschema, value, &child_property(property, name), depth + 1, errors);
                }
            }
        }

        match map.get("additionalProperties") {
            Some(Value::Bool(false)) => {
                for name in object.keys() {
                    if !properties.is_some_and(|p| p.contains_key(name)) {
                        push(
                            errors,
                            property,
                            format!("is not allowed to have the additional property {name:?}"),
                        );
                    }
                }
            }
            Some(additional) if additional.is_object() => {
                for (name, value) in object {
                    if !properties.is_some_and(|p| p.contains_key(name)) {
                        self.check(additional, value, &child_property(property, name), depth + 1, errors);
                    }
                }
            }
            _ => {}
        }

        if let Some(min) = map.get("minProperties").and_then(Value::as_u64) {
            if (object.len() as u64) < min {
                push(errors, property, format!("does not meet minimum property length of {min}"));
            }
        }
        if let Some(max) = map.get("maxProperties").and_then(Value::as_u64) {
            if (object.len() as u64) > max {
                push(errors, property, format!("does not meet maximum property length of {max}"));
            }
        }
    }

    fn check_array(
        &self,
        map: &'s Map<String, Value>,
        items: &[Value],
        property: &str,
        depth: usize,
        errors: &mut Vec<ValidationError>,
    ) {
        match map.get("items") {
            Some(Value::Array(tuple)) => {
                for (index, (subschema, item)) in tuple.iter().zip(items).enumerate() {
                    self.check(subschema, item, &format!("{property}[{index}]"), depth + 1, errors);
                }
            }
            Some(subschema) => {
                for (index, item) in items.iter().enumerate() {
                    self.check(subschema, item, &format!("{property}[{index}]"), depth + 1, errors);
                }
            }
            None => {}
        }

        if let Some(min) = map.get("minItems").and_then(Value::as_u64) {
            if (items.len() as u64) < min {
                push(errors, property, format!("does not meet minimum length of {min}"));
            }
        }
        if let Some(max) = map.get("maxItems").and_then(Value::as_u64) {
            if (items.len() as u64) > max {
                push(errors, property, format!("does not meet maximum length of {max}"));
            }
        }
        if map.get("uniqueItems").and_then(Value::as_bool) == Some(true) {
            let mut seen = HashSet::with_capacity(items.len());
            let duplicate = items.iter().any(|item| !seen.insert(canonical_key(item)));
            if duplicate {
                push(errors, property, "contains duplicate item");
            }
        }
    }

    fn check_string(
        &self,
        map: &Map<String, Value>,
        text: &str,
        property: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        let length = text.chars().count() as u64;
        if let Some(min) = map.get("minLength").and_then(Value::as_u64) {
            if length < min {
                push(errors, property, format!("does not meet minimum length of {min}"));
            }
        }
        if let Some(max) = map.get("maxLength").and_then(Value::as_u64) {
            if length > max {
                push(errors, property, format!("does not meet maximum length of {max}"));
            }
        }
        if let Some(pattern) = map.get("pattern").and_then(Value::as_str) {
            if let Some(regex) = self.patterns.get(pattern) {
                if !regex.is_match(text) {
                    push(errors, property, format!("does not match pattern {pattern:?}"));
                }
            }
        }
    }

    fn check_combinators(
        &self,
        map: &'s Map<String, Value>,
        instance: &Value,
        property: &str,
        depth: usize,
        errors: &mut Vec<ValidationError>,
    ) {
        if let Some(all) = map.get("allOf").and_then(Value::as_array) {
            for subschema in all {
                self.check(subschema, instance, property, depth + 1, errors);
            }
        }

        if let Some(any) = map.get("anyOf").and_then(Value::as_array) {
            if !any.iter().any(|s| self.passes(s, instance, property, depth)) {
                push(errors, property, format!("is not any of {}", subschema_list(any.len())));
            }
        }

        if let Some(one) = map.get("oneOf").and_then(Value::as_array) {
            let matched = one
                .iter()
                .filter(|s| self.passes(s, instance, property, depth))
                .count();
            if matched != 1 {
                push(
                    errors,
                    property,
                    format!("is not exactly one from {}", subschema_list(one.len())),
                );
            }
        }

        if let Some(not) = map.get("not") {
            if self.passes(not, instance, property, depth) {
                push(errors, property, format!("is of prohibited type {not}"));
            }
        }
    }

    fn passes(&self, schema: &'s Value, instance: &Value, property: &str, depth: usize) -> bool {
        let mut scratch = Vec::new();
        self.check(schema, instance, property, depth + 1, &mut scratch);
        scratch.is_empty()
    }
}

fn check_type(
    map: &Map<String, Value>,
    instance: &Value,
    property: &str,
    errors: &mut Vec<ValidationError>,
) {
    let names: Vec<&str> = match map.get("type") {
        Some(Value::String(name)) => vec![name.as_str()],
        Some(Value::Array(names)) => names.iter().filter_map(Value::as_str).collect(),
        _ => return,
    };
    if !names.iter().any(|name| type_matches(name, instance)) {
        push(errors, property, format!("is not of a type(s) {}", names.join(",")));
    }
}

fn check_enum(
    map: &Map<String, Value>,
    instance: &Value,
    property: &str,
    errors: &mut Vec<ValidationError>,
) {
    if let Some(allowed) = map.get("enum").and_then(Value::as_array) {
        if !allowed.contains(instance) {
            let listed = allowed.iter().map(display_value).collect::<Vec<_>>().join(",");
            push(errors, property, format!("is not one of enum values: {listed}"));
        }
    }
    if let Some(expected) = map.get("const") {
        if expected != instance {
            push(errors, property, format!("does not exactly match expected constant: {expected}"));
        }
    }
}

fn check_number(
    map: &Map<String, Value>,
    instance: &Value,
    property: &str,
    errors: &mut Vec<ValidationError>,
) {
    let Some(value) = instance.as_f64() else {
        return;
    };

    if let Some(minimum) = map.get("minimum").and_then(Value::as_f64) {
        let exclusive = map.get("exclusiveMinimum").and_then(Value::as_bool) == Some(true);
        if exclusive && value <= minimum {
            push(errors, property, format!("must be greater than {}", map["minimum"]));
        } else if !exclusive && value < minimum {
            push(errors, property, format!("must be greater than or equal to {}", map["minimum"]));
        }
    }
    if let Some(bound) = map.get("exclusiveMinimum").filter(|v| v.is_number()) {
        if bound.as_f64().is_some_and(|b| value <= b) {
            push(errors, property, format!("must be greater than {bound}"));
        }
    }

    if let Some(maximum) = map.get("maximum").and_then(Value::as_f64) {
        let exclusive = map.get("exclusiveMaximum").and_then(Value::as_bool) == Some(true);
        if exclusive && value >= maximum {
            push(errors, property, format!("must be less than {}", map["maximum"]));
        } else if !exclusive && value > maximum {
            push(errors, property, format!("must be less than or equal to {}", map["maximum"]));
        }
    }
    if let Some(bound) = map.get("exclusiveMaximum").filter(|v| v.is_number()) {
        if bound.as_f64().is_some_and(|b| value >= b) {
            push(errors, property, format!("must be less than {bound}"));
        }
    }
}

fn type_matches(name: &str, instance: &Value) -> bool {
    match name {
        "null" => instance.is_null(),
        "boolean" => instance.is_boolean(),
        "object" => instance.is_object(),
        "array" => instance.is_array(),
        "string" => instance.is_string(),
        "number" => instance.is_number(),
        "integer" => match instance {
            Value::Number(n) if n.is_i64() || n.is_u64() => true,
            Value::Number(n) => n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0),
            _ => false,
        },
        "any" => true,
        _ => false,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn child_property(parent: &str, name: &str) -> String {
    let mut chars = name.chars();
    let is_identifier = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if is_identifier {
        format!("{parent}.{name}")
    } else {
        format!("{parent}[{}]", Value::String(name.to_string()))
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn subschema_list(count: usize) -> String {
    (0..count)
        .map(|i| format!("[subschema {i}]"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Serializes a value with object keys sorted, so equal values share a key.
fn canonical_key(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(object) => {
            let mut entries: Vec<_> = object.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (index, (key, item)) in entries.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn push(errors: &mut Vec<ValidationError>, property: &str, message: impl Into<String>) {
    errors.push(ValidationError {
        property: property.to_string(),
        message: message.into(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person_schema() -> JsonSchema {
        JsonSchema::compile(json!({
            "type": "object",
            "required": ["name", "email"],
            "properties": {
                "name": {"type": "string", "minLength": 1},
                "email": {"type": "string", "pattern": "^[^@]+@[^@]+$"},
                "age": {"type": "integer", "minimum": 0, "maximum": 150},
                "tags": {"type": "array", "items": {"type": "string"}, "maxItems": 3}
            },
            "additionalProperties": false
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_instance() {
        let schema = person_schema();
        assert!(schema.is_valid(&json!({"name": "Ada", "email": "ada@example.com", "age": 36})));
    }

    #[test]
    fn test_missing_required_properties_reported_in_order() {
        let result = person_schema().validate(&json!({}));
        assert_eq!(
            result.message(),
            r#"instance requires property "name", instance requires property "email""#
        );
    }

    #[test]
    fn test_nested_property_paths() {
        let result = person_schema().validate(&json!({
            "name": "Ada",
            "email": "nope",
            "age": 36.5,
            "tags": ["a", 2]
        }));
        let messages: Vec<String> = result.errors.iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            vec![
                "instance.age is not of a type(s) integer".to_string(),
                r#"instance.email does not match pattern "^[^@]+@[^@]+$""#.to_string(),
                "instance.tags[1] is not of a type(s) string".to_string(),
            ]
        );
    }

    #[test]
    fn test_additional_properties_rejected() {
        let result = person_schema().validate(&json!({
            "name": "Ada", "email": "a@b", "first-name": "x"
        }));
        assert_eq!(
            result.message(),
            r#"instance is not allowed to have the additional property "first-name""#
        );
    }

    #[test]
    fn test_integral_float_is_integer() {
        let schema = JsonSchema::compile(json!({"type": "integer"})).unwrap();
        assert!(schema.is_valid(&json!(3.0)));
        assert!(!schema.is_valid(&json!(3.5)));
    }

    #[test]
    fn test_numeric_bounds() {
        let schema = JsonSchema::compile(json!({
            "minimum": 1, "exclusiveMaximum": 10
        }))
        .unwrap();
        assert_eq!(schema.validate(&json!(0)).message(), "instance must be greater than or equal to 1");
        assert_eq!(schema.validate(&json!(10)).message(), "instance must be less than 10");

        let draft4 = JsonSchema::compile(json!({"minimum": 1, "exclusiveMinimum": true})).unwrap();
        assert_eq!(draft4.validate(&json!(1)).message(), "instance must be greater than 1");
    }

    #[test]
    fn test_enum_and_const() {
        let schema = JsonSchema::compile(json!({"enum": ["red", "green", 3]})).unwrap();
        assert_eq!(
            schema.validate(&json!("blue")).message(),
            "instance is not one of enum values: red,green,3"
        );
        let constant = JsonSchema::compile(json!({"const": {"a": 1}})).unwrap();
        assert!(constant.is_valid(&json!({"a": 1})));
        assert!(!constant.is_valid(&json!({"a": 2})));
    }

    #[test]
    fn test_local_references() {
        let schema = JsonSchema::compile(json!({
            "definitions": {"id": {"type": "string", "minLength": 3}},
            "type": "object",
            "properties": {"id": {"$ref": "#/definitions/id"}}
        }))
        .unwrap();
        assert!(schema.is_valid(&json!({"id": "abc"})));
        assert_eq!(
            schema.validate(&json!({"id": "a"})).message(),
            "instance.id does not meet minimum length of 3"
        );

        let dangling = JsonSchema::compile(json!({"$ref": "#/definitions/nope"})).unwrap();
        assert!(!dangling.is_valid(&json!(1)));
    }

    #[test]
    fn test_recursive_reference_terminates() {
        let schema = JsonSchema::compile(json!({"$ref": "#"})).unwrap();
        let result = schema.validate(&json!(1));
        assert_eq!(result.message(), "instance exceeds maximum schema depth");
    }

    #[test]
    fn test_combinators() {
        let schema = JsonSchema::compile(json!({
            "anyOf": [{"type": "string"}, {"type": "integer"}],
            "not": {"const": 0}
        }))
        .unwrap();
        assert!(schema.is_valid(&json!("x")));
        assert_eq!(
            schema.validate(&json!(true)).message(),
            "instance is not any of [subschema 0],[subschema 1]"
        );
        assert!(!schema.is_valid(&json!(0)));

        let one = JsonSchema::compile(json!({
            "oneOf": [{"type": "number"}, {"type": "integer"}]
        }))
        .unwrap();
        assert!(one.is_valid(&json!(1.5)));
        assert!(!one.is_valid(&json!(1)));
    }

    #[test]
    fn test_unique_items_and_property_counts() {
        let schema = JsonSchema::compile(json!({
            "uniqueItems": true, "minItems": 2
        }))
        .unwrap();
        assert_eq!(schema.validate(&json!([1, 1])).message(), "instance contains duplicate item");
        assert_eq!(
            schema.validate(&json!([1])).message(),
            "instance does not meet minimum length of 2"
        );

        let object = JsonSchema::compile(json!({"maxProperties": 1})).unwrap();
        assert!(!object.is_valid(&json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_unique_items_compares_objects_structurally() {
        let schema = JsonSchema::compile(json!({"uniqueItems": true})).unwrap();
        assert!(!schema.is_valid(&json!([{"a": 1, "b": [2]}, {"b": [2], "a": 1}])));
        assert!(schema.is_valid(&json!([{"a": 1}, {"a": 2}, [1], "1", 1])));
    }

    #[test]
    fn test_unique_items_scales_to_large_arrays() {
        let schema = JsonSchema::compile(json!({"type": "array", "uniqueItems": true})).unwrap();
        let distinct = Value::Array((0..150_000).map(Value::from).collect());

        let started = std::time::Instant::now();
        assert!(schema.is_valid(&distinct));
        assert!(started.elapsed() < std::time::Duration::from_secs(5));

        let mut repeated = (0..150_000).map(Value::from).collect::<Vec<_>>();
        repeated.push(Value::from(149_999));
        assert_eq!(
            schema.validate(&Value::Array(repeated)).message(),
            "instance contains duplicate item"
        );
    }

    #[test]
    fn test_string_length_counts_characters() {
        let schema = JsonSchema::compile(json!({"maxLength": 2})).unwrap();
        assert!(schema.is_valid(&json!("日本")));
    }

    #[test]
    fn test_invalid_pattern_fails_compilation() {
        let result = JsonSchema::compile(json!({
            "properties": {"code": {"type": "string", "pattern": "(["}}
        }));
        assert!(matches!(result, Err(SchemaError::InvalidPattern { .. })));
    }

    #[test]
    fn test_pattern_inside_enum_is_data() {
        let schema = JsonSchema::compile(json!({"enum": [{"pattern": "(["}]}));
        assert!(schema.is_ok());
    }

    #[test]
    fn test_non_schema_document_rejected() {
        assert!(matches!(JsonSchema::compile(json!(42)), Err(SchemaError::NotASchema("number"))));
    }

    #[test]
    fn test_boolean_schemas() {
        assert!(JsonSchema::compile(json!(true)).unwrap().is_valid(&json!(null)));
        assert!(!JsonSchema::compile(json!(false)).unwrap().is_valid(&json!(null)));
    }
}
