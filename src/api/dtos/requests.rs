use serde_json::Value;
use std::collections::HashMap;

use crate::domain::models::asset::ImageUpload;
use crate::domain::models::event::CreateEventInput;
use crate::error::AppError;

/// Fields collected from a `multipart/form-data` event submission.
#[derive(Debug, Default)]
pub struct EventForm {
    text: HashMap<String, String>,
    agenda: Vec<String>,
    tags: Vec<String>,
    pub image: Option<ImageUpload>,
}

impl EventForm {
    /// Records one text field. Repeated `agenda`/`tags` fields accumulate;
    /// other repeated fields keep the last value.
    pub fn push_text(&mut self, name: &str, value: String) {
        match name {
            "agenda" => self.agenda.push(value),
            "tags" => self.tags.push(value),
            _ => {
                self.text.insert(name.to_string(), value);
            }
        }
    }

    pub fn into_parts(mut self) -> Result<(CreateEventInput, Option<ImageUpload>), AppError> {
        let mut take = |key: &str| self.text.remove(key).unwrap_or_default();

        let input = CreateEventInput {
            title: take("title"),
            description: take("description"),
            overview: take("overview"),
            venue: take("venue"),
            location: take("location"),
            date: take("date"),
            time: take("time"),
            mode: take("mode"),
            audience: take("audience"),
            organizer: take("organizer"),
            agenda: parse_list_field("agenda", self.agenda)?,
            tags: parse_list_field("tags", self.tags)?,
        };
        Ok((input, self.image))
    }
}

/// A list field arrives either as repeated values or as a single JSON array
/// of strings. A single value that does not look like an array is one item.
pub fn parse_list_field(name: &str, values: Vec<String>) -> Result<Vec<String>, AppError> {
    if values.len() != 1 || !values[0].trim_start().starts_with('[') {
        return Ok(values);
    }
    let single = &values[0];

    let invalid = || AppError::validation_field(format!("{name} must be a JSON array of strings"), name);
    match serde_json::from_str::<Value>(single).map_err(|_| invalid())? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err(invalid()),
            })
            .collect(),
        _ => Err(invalid()),
    }
}
