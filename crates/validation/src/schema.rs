//! Declarative schema model.
//!
//! A [`Schema`] is plain configuration data: per-field static rules plus a
//! list of cross-field rules. Schemas are built once at startup (see
//! [`Schemas::standard`](crate::Schemas::standard)) and handed to the engine.

use regex::Regex;

/// A compiled pattern with the message reported when it does not match.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub regex: Regex,
    pub message: &'static str,
}

impl Pattern {
    pub fn new(pattern: &str, message: &'static str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            message,
        })
    }
}

#[derive(Debug, Clone)]
pub struct StringRule {
    /// Trim surrounding whitespace before measuring; the trimmed value is
    /// what validation hands back.
    pub trim: bool,
    pub min_len: usize,
    pub max_len: Option<usize>,
    pub pattern: Option<Pattern>,
}

impl StringRule {
    pub fn trimmed(min_len: usize, max_len: usize) -> Self {
        Self {
            trim: true,
            min_len,
            max_len: Some(max_len),
            pattern: None,
        }
    }

    pub fn raw(min_len: usize, max_len: usize) -> Self {
        Self {
            trim: false,
            min_len,
            max_len: Some(max_len),
            pattern: None,
        }
    }

    /// Any non-empty string.
    pub fn non_empty() -> Self {
        Self {
            trim: true,
            min_len: 1,
            max_len: None,
            pattern: None,
        }
    }

    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = Some(pattern);
        self
    }
}

#[derive(Debug, Clone)]
pub enum ValueRule {
    String(StringRule),
    /// Whole numbers only; `2.0` is accepted and normalised to `2`.
    Integer { min: i64, max: i64 },
    Number { min: f64, max: f64 },
    Boolean,
    /// String restricted to an enumerated set.
    OneOf(&'static [&'static str]),
    Object(Vec<FieldSpec>),
    Array { items: Box<ValueRule>, min_len: usize },
}

impl ValueRule {
    /// Integer bounded below, and above by what a `u32` can hold.
    pub fn count(min: i64) -> Self {
        Self::Integer {
            min,
            max: i64::from(u32::MAX),
        }
    }

    pub fn array(items: ValueRule, min_len: usize) -> Self {
        Self::Array {
            items: Box::new(items),
            min_len,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub rule: ValueRule,
}

impl FieldSpec {
    pub fn required(name: &'static str, rule: ValueRule) -> Self {
        Self {
            name,
            required: true,
            rule,
        }
    }

    pub fn optional(name: &'static str, rule: ValueRule) -> Self {
        Self {
            name,
            required: false,
            rule,
        }
    }
}

/// A rule whose validity depends on another part of the same payload.
///
/// Evaluated in a second pass, on the normalised payload, and only for
/// values that passed their own static rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrossFieldRule {
    /// `array[*].field`, when present, must equal an element of the
    /// top-level `collection`. An absent collection is a violation.
    MemberOf {
        array: &'static str,
        field: &'static str,
        collection: &'static str,
    },

    /// `array[*].field` must not exceed the top-level scalar `bound`.
    /// Skipped when `bound` is absent or itself invalid.
    AtMostSibling {
        array: &'static str,
        field: &'static str,
        bound: &'static str,
    },

    /// Top-level `field` must equal top-level `other`.
    /// Skipped when `other` is absent.
    EqualsSibling {
        field: &'static str,
        other: &'static str,
        message: &'static str,
    },
}

/// Static field rules plus cross-field rules for one payload kind.
#[derive(Debug, Clone)]
pub struct Schema {
    pub fields: Vec<FieldSpec>,
    pub cross: Vec<CrossFieldRule>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self {
            fields,
            cross: Vec::new(),
        }
    }

    pub fn with_cross(mut self, rule: CrossFieldRule) -> Self {
        self.cross.push(rule);
        self
    }
}
