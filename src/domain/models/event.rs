use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub overview: String,
    pub image: String,
    pub venue: String,
    pub location: String,
    pub date: String, // YYYY-MM-DD
    pub time: String, // HH:MM, 24h
    pub mode: String,
    pub audience: String,
    pub agenda: Json<Vec<String>>,
    pub organizer: String,
    pub tags: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn new(input: CreateEventInput, slug: String, image: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            slug,
            description: input.description,
            overview: input.overview,
            image,
            venue: input.venue,
            location: input.location,
            date: input.date,
            time: input.time,
            mode: input.mode,
            audience: input.audience,
            agenda: Json(input.agenda),
            organizer: input.organizer,
            tags: Json(input.tags),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites every editable attribute. The slug and image are left alone.
    pub fn apply(&mut self, input: CreateEventInput) {
        self.title = input.title;
        self.description = input.description;
        self.overview = input.overview;
        self.venue = input.venue;
        self.location = input.location;
        self.date = input.date;
        self.time = input.time;
        self.mode = input.mode;
        self.audience = input.audience;
        self.agenda = Json(input.agenda);
        self.organizer = input.organizer;
        self.tags = Json(input.tags);
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSort {
    /// Creation time, most recent first.
    #[default]
    Newest,
    /// Scheduled date and time, soonest first.
    Upcoming,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateEventInput {
    pub title: String,
    pub description: String,
    pub overview: String,
    pub venue: String,
    pub location: String,
    pub date: String,
    pub time: String,
    pub mode: String,
    pub audience: String,
    pub organizer: String,
    pub agenda: Vec<String>,
    pub tags: Vec<String>,
}

const LENGTH_LIMITS: &[(&str, usize)] = &[
    ("title", 200),
    ("description", 500),
    ("overview", 5000),
    ("venue", 200),
    ("location", 200),
    ("mode", 50),
    ("audience", 200),
    ("organizer", 200),
];

impl CreateEventInput {
    fn scalar_fields(&self) -> [(&'static str, &str); 10] {
        [
            ("title", self.title.as_str()),
            ("description", self.description.as_str()),
            ("overview", self.overview.as_str()),
            ("venue", self.venue.as_str()),
            ("location", self.location.as_str()),
            ("date", self.date.as_str()),
            ("time", self.time.as_str()),
            ("mode", self.mode.as_str()),
            ("audience", self.audience.as_str()),
            ("organizer", self.organizer.as_str()),
        ]
    }

    fn trimmed(self) -> Self {
        let clean_list = |items: Vec<String>| -> Vec<String> {
            items
                .into_iter()
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect()
        };
        Self {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            overview: self.overview.trim().to_string(),
            venue: self.venue.trim().to_string(),
            location: self.location.trim().to_string(),
            date: self.date.trim().to_string(),
            time: self.time.trim().to_string(),
            mode: self.mode.trim().to_string(),
            audience: self.audience.trim().to_string(),
            organizer: self.organizer.trim().to_string(),
            agenda: clean_list(self.agenda),
            tags: clean_list(self.tags),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let missing: Vec<&str> = self
            .scalar_fields()
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(AppError::Validation {
                message: format!("Missing required field(s): {}", missing.join(", ")),
                details: Some(json!({ "missing": missing })),
            });
        }

        if self.agenda.is_empty() {
            return Err(AppError::validation_field("Agenda must contain at least one item", "agenda"));
        }
        if self.tags.is_empty() {
            return Err(AppError::validation_field("Tags must contain at least one item", "tags"));
        }

        for (name, value) in self.scalar_fields() {
            let Some((_, max)) = LENGTH_LIMITS.iter().find(|(field, _)| *field == name) else {
                continue;
            };
            if value.chars().count() > *max {
                return Err(AppError::validation_field(
                    format!("{name} must be at most {max} characters"),
                    name,
                ));
            }
        }

        Ok(())
    }

    /// Trims, validates and normalizes the input into its stored form.
    pub fn prepare(self) -> Result<Self, AppError> {
        let mut input = self.trimmed();
        input.validate()?;
        input.date = normalize_date(&input.date)?;
        input.time = normalize_time(&input.time)?;
        Ok(input)
    }
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub overview: Option<String>,
    pub venue: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub mode: Option<String>,
    pub audience: Option<String>,
    pub organizer: Option<String>,
    pub agenda: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

impl UpdateEventInput {
    pub fn merge(self, event: &Event) -> CreateEventInput {
        CreateEventInput {
            title: self.title.unwrap_or_else(|| event.title.clone()),
            description: self.description.unwrap_or_else(|| event.description.clone()),
            overview: self.overview.unwrap_or_else(|| event.overview.clone()),
            venue: self.venue.unwrap_or_else(|| event.venue.clone()),
            location: self.location.unwrap_or_else(|| event.location.clone()),
            date: self.date.unwrap_or_else(|| event.date.clone()),
            time: self.time.unwrap_or_else(|| event.time.clone()),
            mode: self.mode.unwrap_or_else(|| event.mode.clone()),
            audience: self.audience.unwrap_or_else(|| event.audience.clone()),
            organizer: self.organizer.unwrap_or_else(|| event.organizer.clone()),
            agenda: self.agenda.unwrap_or_else(|| event.agenda.0.clone()),
            tags: self.tags.unwrap_or_else(|| event.tags.0.clone()),
        }
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y"];

pub fn normalize_date(raw: &str) -> Result<String, AppError> {
    let raw = raw.trim();
    let parsed = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        });

    match parsed {
        Some(date) => Ok(date.format("%Y-%m-%d").to_string()),
        None => Err(AppError::validation_field("Date must be a valid date format", "date")),
    }
}

pub fn normalize_time(raw: &str) -> Result<String, AppError> {
    let invalid = || AppError::validation_field("Time must be in HH:MM format (e.g., 14:30)", "time");

    let (hour, minute) = raw.trim().split_once(':').ok_or_else(invalid)?;
    let well_formed = (1..=2).contains(&hour.len())
        && minute.len() == 2
        && hour.chars().chain(minute.chars()).all(|c| c.is_ascii_digit());
    if !well_formed {
        return Err(invalid());
    }

    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }

    Ok(format!("{hour:02}:{minute:02}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> CreateEventInput {
        CreateEventInput {
            title: "  RustConf 2026 ".into(),
            description: "A conference about Rust".into(),
            overview: "Three days of talks and workshops".into(),
            venue: "Hall A".into(),
            location: "Portland, OR".into(),
            date: "2026-05-15".into(),
            time: "9:30".into(),
            mode: "hybrid".into(),
            audience: "Developers".into(),
            organizer: "Rust Foundation".into(),
            agenda: vec!["Keynote".into(), "  ".into(), "Workshops".into()],
            tags: vec!["rust".into(), "systems".into()],
        }
    }

    #[test]
    fn test_prepare_trims_and_normalizes() {
        let prepared = sample_input().prepare().unwrap();
        assert_eq!(prepared.title, "RustConf 2026");
        assert_eq!(prepared.time, "09:30");
        assert_eq!(prepared.date, "2026-05-15");
        assert_eq!(prepared.agenda, vec!["Keynote", "Workshops"]);
    }

    #[test]
    fn test_missing_fields_are_listed() {
        let input = CreateEventInput { venue: " ".into(), mode: String::new(), ..sample_input() };
        match input.prepare() {
            Err(AppError::Validation { message, details }) => {
                assert_eq!(message, "Missing required field(s): venue, mode");
                assert_eq!(details, Some(json!({ "missing": ["venue", "mode"] })));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_lists_rejected() {
        let no_agenda = CreateEventInput { agenda: vec!["   ".into()], ..sample_input() };
        assert!(matches!(no_agenda.prepare(), Err(AppError::Validation { .. })));

        let no_tags = CreateEventInput { tags: vec![], ..sample_input() };
        assert!(matches!(no_tags.prepare(), Err(AppError::Validation { .. })));
    }

    #[test]
    fn test_length_limits() {
        let input = CreateEventInput { mode: "x".repeat(51), ..sample_input() };
        assert!(matches!(input.prepare(), Err(AppError::Validation { .. })));
    }

    #[test]
    fn test_normalize_date_formats() {
        assert_eq!(normalize_date("2026-05-15").unwrap(), "2026-05-15");
        assert_eq!(normalize_date("2026/05/15").unwrap(), "2026-05-15");
        assert_eq!(normalize_date("May 15, 2026").unwrap(), "2026-05-15");
        assert_eq!(normalize_date("2026-05-15T23:30:00-02:00").unwrap(), "2026-05-16");
        assert!(normalize_date("2026-02-30").is_err());
        assert!(normalize_date("soon").is_err());
    }

    #[test]
    fn test_normalize_time() {
        assert_eq!(normalize_time("09:30").unwrap(), "09:30");
        assert_eq!(normalize_time("7:05").unwrap(), "07:05");
        assert_eq!(normalize_time("23:59").unwrap(), "23:59");
        assert!(normalize_time("24:00").is_err());
        assert!(normalize_time("12:60").is_err());
        assert!(normalize_time("12:5").is_err());
        assert!(normalize_time("noon").is_err());
        assert!(normalize_time("+1:30").is_err());
    }
}
