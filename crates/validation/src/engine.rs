//! Collect-all validation over JSON payloads.
//!
//! Validation runs in two passes. The static pass walks the schema, checks
//! every field independently and builds the normalised payload (trimmed
//! strings, whole integers). The cross-field pass then evaluates the
//! schema's [`CrossFieldRule`]s against the normalised payload, skipping
//! any value that already failed statically. Neither pass stops early.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{FieldError, ValidationError, ValidationFailure};
use crate::schema::{CrossFieldRule, FieldSpec, Schema, StringRule, ValueRule};
use crate::{PayloadKind, Schemas};

/// Pseudo-path used when the payload is not a JSON object at all.
pub const BODY_FIELD: &str = "body";

#[derive(Debug, Clone)]
pub struct ValidationEngine {
    schemas: Arc<Schemas>,
}

impl ValidationEngine {
    pub fn new(schemas: Arc<Schemas>) -> Self {
        Self { schemas }
    }

    pub fn schemas(&self) -> &Schemas {
        &self.schemas
    }

    /// Validate `payload` as `kind`, returning the normalised payload.
    ///
    /// Keys the schema does not mention are carried through untouched.
    pub fn validate(&self, kind: PayloadKind, payload: &Value) -> Result<Value, ValidationError> {
        let schema = self
            .schemas
            .get(kind)
            .ok_or(ValidationError::UnknownKind(kind))?;

        let mut run = Run::default();
        let normalized = match payload {
            Value::Object(map) => {
                let normalized = run.object(&schema.fields, map, "");
                run.cross(schema, &normalized);
                Value::Object(normalized)
            }
            _ => {
                run.report(BODY_FIELD, "payload must be a JSON object");
                payload.clone()
            }
        };

        if run.errors.is_empty() {
            Ok(normalized)
        } else {
            tracing::debug!(%kind, violations = run.errors.len(), "payload rejected");
            Err(ValidationError::Invalid(ValidationFailure {
                kind,
                details: run.errors,
            }))
        }
    }

    /// Validate and deserialize in one step.
    pub fn validate_into<T: DeserializeOwned>(
        &self,
        kind: PayloadKind,
        payload: &Value,
    ) -> Result<T, ValidationError> {
        let normalized = self.validate(kind, payload)?;
        serde_json::from_value(normalized).map_err(|err| {
            ValidationError::Invalid(ValidationFailure {
                kind,
                details: vec![FieldError::new(BODY_FIELD, err.to_string())],
            })
        })
    }
}

#[derive(Default)]
struct Run {
    errors: Vec<FieldError>,
    /// Paths that produced at least one static violation.
    failed: BTreeSet<String>,
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

impl Run {
    fn report(&mut self, path: &str, message: impl Into<String>) {
        self.failed.insert(path.to_string());
        self.errors.push(FieldError::new(path, message));
    }

    /// `true` if `path` or anything beneath it failed statically.
    fn failed_at_or_below(&self, path: &str) -> bool {
        self.failed.iter().any(|p| {
            p == path
                || p.strip_prefix(path)
                    .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('['))
        })
    }

    fn object(&mut self, fields: &[FieldSpec], input: &Map<String, Value>, parent: &str) -> Map<String, Value> {
        let mut out = input.clone();
        for spec in fields {
            let path = join(parent, spec.name);
            match present(input.get(spec.name)) {
                None => {
                    // Null is absence: drop it so typed defaults apply downstream.
                    out.remove(spec.name);
                    if spec.required {
                        self.report(&path, format!("{path} is required"));
                    }
                }
                Some(value) => {
                    if let Some(normalized) = self.value(&spec.rule, value, &path) {
                        out.insert(spec.name.to_string(), normalized);
                    }
                }
            }
        }
        out
    }

    /// Check one value. Returns the normalised value when it differs in
    /// representation from the input, `None` to keep the input as is.
    fn value(&mut self, rule: &ValueRule, value: &Value, path: &str) -> Option<Value> {
        match rule {
            ValueRule::String(rule) => self.string(rule, value, path),
            ValueRule::Integer { min, max } => self.integer(*min, *max, value, path),
            ValueRule::Number { min, max } => {
                match value.as_f64() {
                    None => self.report(path, format!("{path} must be a number")),
                    Some(n) if n < *min => self.report(path, format!("{path} must be at least {min}")),
                    Some(n) if n > *max => self.report(path, format!("{path} must be at most {max}")),
                    Some(_) => {}
                }
                None
            }
            ValueRule::Boolean => {
                if !value.is_boolean() {
                    self.report(path, format!("{path} must be a boolean"));
                }
                None
            }
            ValueRule::OneOf(allowed) => {
                match value.as_str().map(str::trim) {
                    Some(s) if allowed.contains(&s) => return Some(Value::String(s.to_string())),
                    _ => self.report(path, format!("{path} must be one of: {}", allowed.join(", "))),
                }
                None
            }
            ValueRule::Object(fields) => match value {
                Value::Object(map) => Some(Value::Object(self.object(fields, map, path))),
                _ => {
                    self.report(path, format!("{path} must be an object"));
                    None
                }
            },
            ValueRule::Array { items, min_len } => match value {
                Value::Array(elements) => {
                    if elements.len() < *min_len {
                        self.report(path, format!("{path} must contain at least {min_len} item(s)"));
                    }
                    let normalized = elements
                        .iter()
                        .enumerate()
                        .map(|(i, element)| {
                            let item_path = format!("{path}[{i}]");
                            if element.is_null() {
                                self.report(&item_path, format!("{item_path} is required"));
                                return element.clone();
                            }
                            self.value(items, element, &item_path)
                                .unwrap_or_else(|| element.clone())
                        })
                        .collect();
                    Some(Value::Array(normalized))
                }
                _ => {
                    self.report(path, format!("{path} must be an array"));
                    None
                }
            },
        }
    }

    fn string(&mut self, rule: &StringRule, value: &Value, path: &str) -> Option<Value> {
        let Some(raw) = value.as_str() else {
            self.report(path, format!("{path} must be a string"));
            return None;
        };
        let s = if rule.trim { raw.trim() } else { raw };
        let len = s.chars().count();

        if len == 0 && rule.min_len > 0 {
            self.report(path, format!("{path} is not allowed to be empty"));
        } else if len < rule.min_len {
            self.report(path, format!("{path} must be at least {} characters long", rule.min_len));
        } else if let Some(max) = rule.max_len.filter(|max| len > *max) {
            self.report(path, format!("{path} must be at most {max} characters long"));
        } else if let Some(pattern) = rule.pattern.as_ref().filter(|p| !p.regex.is_match(s)) {
            self.report(path, format!("{path} {}", pattern.message));
        }

        (s.len() != raw.len()).then(|| Value::String(s.to_string()))
    }

    fn integer(&mut self, min: i64, max: i64, value: &Value, path: &str) -> Option<Value> {
        let whole = value.as_i64().or_else(|| {
            value
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        });
        match whole {
            None => self.report(path, format!("{path} must be an integer")),
            Some(n) if n < min => self.report(path, format!("{path} must be at least {min}")),
            Some(n) if n > max => self.report(path, format!("{path} must be at most {max}")),
            Some(n) => return Some(Value::from(n)),
        }
        None
    }

    fn cross(&mut self, schema: &Schema, root: &Map<String, Value>) {
        for rule in &schema.cross {
            match rule {
                CrossFieldRule::MemberOf {
                    array,
                    field,
                    collection,
                } => self.member_of(root, array, field, collection),
                CrossFieldRule::AtMostSibling { array, field, bound } => {
                    self.at_most_sibling(root, array, field, bound)
                }
                CrossFieldRule::EqualsSibling { field, other, message } => {
                    let (Some(value), Some(expected)) =
                        (present(root.get(*field)), present(root.get(*other)))
                    else {
                        continue;
                    };
                    if !self.failed_at_or_below(field) && value != expected {
                        self.report(field, format!("{field} {message}"));
                    }
                }
            }
        }
    }

    /// Elements of a top-level array that carry `field`, paired with their path.
    fn referencing<'a>(
        &self,
        root: &'a Map<String, Value>,
        array: &str,
        field: &str,
    ) -> Vec<(String, &'a Value)> {
        let Some(Value::Array(elements)) = root.get(array) else {
            return Vec::new();
        };
        elements
            .iter()
            .enumerate()
            .filter_map(|(i, element)| {
                let value = present(element.get(field))?;
                let path = format!("{array}[{i}].{field}");
                (!self.failed_at_or_below(&path)).then_some((path, value))
            })
            .collect()
    }

    fn member_of(&mut self, root: &Map<String, Value>, array: &str, field: &str, collection: &str) {
        if self.failed_at_or_below(collection) {
            return;
        }
        let members = match present(root.get(collection)) {
            None => None,
            Some(Value::Array(members)) => Some(members),
            Some(_) => return,
        };
        for (path, value) in self.referencing(root, array, field) {
            match members {
                None => self.report(
                    &path,
                    format!("{path} refers to {collection}, but none are declared"),
                ),
                Some(members) if !members.contains(value) => self.report(
                    &path,
                    format!("{path} must be one of the declared {collection}"),
                ),
                Some(_) => {}
            }
        }
    }

    fn at_most_sibling(&mut self, root: &Map<String, Value>, array: &str, field: &str, bound: &str) {
        if self.failed_at_or_below(bound) {
            return;
        }
        let Some(limit) = present(root.get(bound)).and_then(Value::as_i64) else {
            return;
        };
        for (path, value) in self.referencing(root, array, field) {
            if value.as_i64().is_some_and(|n| n > limit) {
                self.report(
                    &path,
                    format!("{path} must not exceed {bound} ({limit})"),
                );
            }
        }
    }
}
