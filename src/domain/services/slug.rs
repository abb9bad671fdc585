use percent_encoding::percent_decode_str;
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

use crate::domain::ports::EventRepository;
use crate::error::AppError;

pub const MAX_SLUG_LEN: usize = 200;
/// Room kept free after the base for a `-N` collision suffix.
const SUFFIX_RESERVE: usize = 10;
const MAX_BASE_SLUG_LEN: usize = MAX_SLUG_LEN - SUFFIX_RESERVE;

static PUBLIC_SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid regex"));

/// Lower-cases the title, drops anything that is not an ASCII letter, digit,
/// underscore, whitespace or hyphen, and joins the remaining words with single
/// hyphens. Underscores separate words so the result always passes
/// [`parse_slug`]. The result is cut to leave room for a collision suffix.
pub fn base_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_separator = false;

    for ch in title.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch);
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_separator = true;
        }
    }

    // ASCII only, so byte truncation stays on a char boundary
    slug.truncate(MAX_BASE_SLUG_LEN);
    slug.truncate(slug.trim_end_matches('-').len());
    slug
}

/// Picks `base` if it is free, otherwise `base-(N+1)` where N is the largest
/// numeric suffix already taken.
pub fn next_available_slug(base: &str, existing: &[String]) -> Result<String, AppError> {
    let pattern = RegexBuilder::new(&format!(r"^{}(?:-(\d+))?$", regex::escape(base)))
        .case_insensitive(true)
        .build()
        .map_err(|e| AppError::Internal(format!("invalid slug pattern for '{}': {}", base, e)))?;

    let mut has_base = false;
    let mut max_suffix: u64 = 0;

    for slug in existing {
        let Some(caps) = pattern.captures(slug) else { continue };
        match caps.get(1) {
            None => has_base = true,
            Some(suffix) => {
                if let Ok(n) = suffix.as_str().parse::<u64>() {
                    max_suffix = max_suffix.max(n);
                }
            }
        }
    }

    let slug = if has_base {
        format!("{}-{}", base, max_suffix.saturating_add(1))
    } else {
        base.to_string()
    };

    if slug.len() > MAX_SLUG_LEN {
        return Err(AppError::validation_field("Slug is too long", "title"));
    }
    Ok(slug)
}

pub async fn generate_unique_slug(
    repo: &dyn EventRepository,
    title: &str,
    exclude_id: Option<&str>,
) -> Result<String, AppError> {
    let base = base_slug(title);
    if base.is_empty() {
        return Err(AppError::validation_field(
            "Title must contain at least one letter or number",
            "title",
        ));
    }

    let existing = repo.find_slugs_like(&base, exclude_id).await?;
    next_available_slug(&base, &existing)
}

/// Normalizes a slug received from a client: percent-decoded, trimmed and
/// lower-cased, then checked against the public slug format.
pub fn parse_slug(raw: &str) -> Result<String, AppError> {
    if raw.is_empty() {
        return Err(AppError::MissingSlug);
    }

    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| AppError::InvalidSlug("Invalid slug encoding".into()))?;
    let slug = decoded.trim().to_lowercase();

    if !PUBLIC_SLUG_RE.is_match(&slug) {
        return Err(AppError::InvalidSlug(
            "Invalid slug format. Use lowercase letters, numbers, and hyphens only.".into(),
        ));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(AppError::InvalidSlug("Slug is too long".into()));
    }

    Ok(slug)
}
