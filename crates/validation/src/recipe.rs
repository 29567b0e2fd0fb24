//! Recipe schema.

use recipebook_core::RecipeBody;
use serde_json::Value;

use crate::schema::{CrossFieldRule, FieldSpec, Schema, StringRule, ValueRule};
use crate::{PayloadKind, ValidationEngine, ValidationError};

pub const UNITS: &[&str] = &["kpl", "g", "kg", "l", "dl", "cl", "ml", "tl", "rkl"];

fn text(min: usize, max: usize) -> ValueRule {
    ValueRule::String(StringRule::trimmed(min, max))
}

fn subtitle() -> ValueRule {
    ValueRule::Object(vec![
        FieldSpec::required("index", ValueRule::count(1)),
        FieldSpec::required("name", text(1, 100)),
    ])
}

pub fn schema() -> Schema {
    let duration = ValueRule::Object(vec![
        FieldSpec::required("hours", ValueRule::Integer { min: 0, max: 99 }),
        FieldSpec::required("minutes", ValueRule::Integer { min: 0, max: 59 }),
    ]);

    let tag = ValueRule::Object(vec![
        FieldSpec::required("name", ValueRule::String(StringRule::non_empty())),
        FieldSpec::required("color", ValueRule::String(StringRule::non_empty())),
    ]);

    let ingredient = ValueRule::Object(vec![
        FieldSpec::optional("quantity", ValueRule::Number { min: 0.1, max: 1000.0 }),
        FieldSpec::optional("unit", ValueRule::OneOf(UNITS)),
        FieldSpec::required("description", text(1, 100)),
        FieldSpec::optional("subtitle", subtitle()),
    ]);

    let instruction = ValueRule::Object(vec![
        FieldSpec::required("index", ValueRule::count(1)),
        FieldSpec::required("title", text(1, 100)),
        FieldSpec::required("description", text(1, 3000)),
        FieldSpec::required("pageNumber", ValueRule::count(1)),
    ]);

    Schema::new(vec![
        FieldSpec::optional("image", ValueRule::String(StringRule::non_empty())),
        FieldSpec::required("title", text(1, 100)),
        FieldSpec::required("description", text(1, 1000)),
        FieldSpec::required("duration", duration),
        FieldSpec::optional("tags", ValueRule::array(tag, 0)),
        FieldSpec::required("portionSize", ValueRule::count(1)),
        FieldSpec::optional("subtitles", ValueRule::array(subtitle(), 0)),
        FieldSpec::required("ingredients", ValueRule::array(ingredient, 1)),
        FieldSpec::required("pages", ValueRule::count(1)),
        FieldSpec::required("instructions", ValueRule::array(instruction, 1)),
    ])
    .with_cross(CrossFieldRule::MemberOf {
        array: "ingredients",
        field: "subtitle",
        collection: "subtitles",
    })
    .with_cross(CrossFieldRule::AtMostSibling {
        array: "instructions",
        field: "pageNumber",
        bound: "pages",
    })
}

impl ValidationEngine {
    /// Validate a client-supplied recipe body and return it normalised.
    pub fn validate_recipe(&self, payload: &Value) -> Result<RecipeBody, ValidationError> {
        self.validate_into(PayloadKind::Recipe, payload)
    }
}
