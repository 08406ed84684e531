//! Ingredient list codec
//!
//! Ingredient rows are stored in a single text column as
//! `name,quantity,unit;name,quantity,unit`. Delimiters and the escape
//! character inside a value are prefixed with a backslash, so data without
//! them is stored verbatim.

use crate::models::Ingredient;

const FIELD_SEPARATOR: char = ',';
const ROW_SEPARATOR: char = ';';
const ESCAPE: char = '\\';

/// Pair up the parallel ingredient columns submitted by the recipe form
///
/// Rows are zipped like the form columns, so surplus values of a longer
/// column are dropped. Rows without a name are skipped and do not count
/// towards the stored ingredients, so the empty rows of the form never reach
/// the recipe.
pub fn from_form_rows(names: &[String], quantities: &[String], units: &[String]) -> Vec<Ingredient> {
    names
        .iter()
        .zip(quantities)
        .zip(units)
        .filter(|((name, _), _)| !name.trim().is_empty())
        .map(|((name, quantity), unit)| Ingredient::new(name.trim(), quantity.trim(), unit.trim()))
        .collect()
}

/// Serialize ingredient rows into the stored representation
pub fn encode(ingredients: &[Ingredient]) -> String {
    ingredients
        .iter()
        .map(|ingredient| {
            [
                escape(&ingredient.name),
                escape(&ingredient.quantity),
                escape(&ingredient.unit),
            ]
            .join(",")
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Parse the stored representation back into ingredient rows
pub fn decode(raw: &str) -> Vec<Ingredient> {
    if raw.is_empty() {
        return Vec::new();
    }

    let mut rows = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        match c {
            ESCAPE => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            FIELD_SEPARATOR => fields.push(std::mem::take(&mut current)),
            ROW_SEPARATOR => {
                fields.push(std::mem::take(&mut current));
                rows.push(row_from_fields(std::mem::take(&mut fields)));
            }
            _ => current.push(c),
        }
    }

    fields.push(current);
    rows.push(row_from_fields(fields));
    rows
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, FIELD_SEPARATOR | ROW_SEPARATOR | ESCAPE) {
            escaped.push(ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

// Unescaped extra commas stay in the unit.
fn row_from_fields(fields: Vec<String>) -> Ingredient {
    let mut fields = fields.into_iter();
    let name = fields.next().unwrap_or_default();
    let quantity = fields.next().unwrap_or_default();
    let unit = fields.collect::<Vec<_>>().join(",");
    Ingredient {
        name,
        quantity,
        unit,
    }
}
