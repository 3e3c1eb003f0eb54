//! Deterministic schema normalizer.
//!
//! Takes the loosely-structured record a parser produced (arbitrary JSON)
//! and returns a canonical `ResumeRecord`. Pure transform: no I/O, no
//! failure path — malformed or missing fields degrade to empty strings and
//! lists instead of erroring.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::models::resume::{Contact, Education, Experience, Project, ResumeRecord, Skills};

/// Bullet glyphs or sentence-ending periods followed by whitespace.
static BULLET_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[•–\-]\s*|\.\s+").expect("invalid bullet split regex"));

/// Skill entries at or above this length are treated as stray section
/// headers or junk tokens, not skills.
const MAX_SKILL_LEN: usize = 30;

/// Inserts a space at every lowercase→uppercase boundary, then trims.
/// "SeniorEngineer" → "Senior Engineer".
pub fn decamel(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_lower = false;
    for c in s.chars() {
        if prev_lower && c.is_uppercase() {
            out.push(' ');
        }
        prev_lower = c.is_lowercase();
        out.push(c);
    }
    out.trim().to_string()
}

/// Phone normalization for the Polish national format.
///
/// Known limitation: this is a single-country heuristic. Digit strings with
/// a leading "48" country code (≥11 digits) use digits 2–11; bare 9-digit
/// strings are assumed national. Everything else is returned unchanged
/// rather than guessing at E.164.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.starts_with("48") && digits.len() >= 11 {
        return format!("+48 {} {} {}", &digits[2..5], &digits[5..8], &digits[8..11]);
    }
    if digits.len() == 9 {
        return format!("+48 {} {} {}", &digits[..3], &digits[3..6], &digits[6..9]);
    }
    raw.to_string()
}

/// Turns a free-text description (string, or list of strings joined with
/// spaces) into bullet sentences. Empty fragments are discarded and each
/// survivor is decameled.
pub fn split_bullets(raw: &Value) -> Vec<String> {
    let text = match raw {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    };
    BULLET_SPLIT
        .split(text.trim())
        .filter(|frag| !frag.trim().is_empty())
        .map(decamel)
        .collect()
}

/// Best-effort cleanup of a parsed resume into the canonical schema.
pub fn normalize(raw: &Value) -> ResumeRecord {
    let contact = raw.get("contact");
    let record = ResumeRecord {
        name: decamel(str_field(raw, &["name"])),
        headline: decamel(str_field(raw, &["headline"])),
        contact: Contact {
            email: opt_str(contact, "email"),
            phone: normalize_phone(&opt_str(contact, "phone")),
            github: opt_str(contact, "github"),
            linkedin: opt_str(contact, "linkedin"),
        },
        summary: str_field(raw, &["summary"]).to_string(),
        experience: array_of(raw, "experience")
            .into_iter()
            .map(normalize_experience)
            .filter(|j| !j.title.is_empty())
            .collect(),
        education: array_of(raw, "education")
            .into_iter()
            .map(normalize_education)
            .filter(|e| !e.degree.is_empty())
            .collect(),
        skills: normalize_skills(raw.get("skills")),
        projects: array_of(raw, "projects")
            .into_iter()
            .map(normalize_project)
            .filter(|p| !p.title.is_empty())
            .collect(),
    };
    record
}

fn normalize_experience(entry: &Value) -> Experience {
    Experience {
        title: decamel(str_field(entry, &["title", "position"])),
        company: decamel(str_field(entry, &["company"])),
        location: decamel(str_field(entry, &["location"])),
        start: str_field(entry, &["start", "startDate"]).to_string(),
        end: str_field(entry, &["end", "endDate"]).to_string(),
        bullets: bullets_or_description(entry),
    }
}

fn normalize_education(entry: &Value) -> Education {
    // Degree and field of study arrive as a composite in some parses.
    let degree = str_field(entry, &["degree"]);
    let field = str_field(entry, &["fieldOfStudy"]);
    let composite = format!("{degree} {field}");
    Education {
        degree: decamel(composite.trim()),
        school: decamel(str_field(entry, &["school"])),
        location: decamel(str_field(entry, &["location"])),
        start: str_field(entry, &["start", "startDate"]).to_string(),
        end: str_field(entry, &["end", "endDate"]).to_string(),
        bullets: bullets_or_description(entry),
    }
}

fn normalize_project(entry: &Value) -> Project {
    // A project may arrive as a bare string: treat it as a title.
    if let Some(title) = entry.as_str() {
        return Project {
            title: decamel(title),
            url: String::new(),
            bullets: vec![],
        };
    }
    Project {
        title: decamel(str_field(entry, &["title", "name"])),
        url: str_field(entry, &["url", "link"]).to_string(),
        bullets: bullets_or_description(entry),
    }
}

fn normalize_skills(skills: Option<&Value>) -> Skills {
    Skills {
        core: clean_skill_list(skills, "core"),
        languages: clean_skill_list(skills, "languages"),
        tools: clean_skill_list(skills, "tools"),
        soft: clean_skill_list(skills, "soft"),
    }
}

/// Drops entries that are empty, overlong, or contain the literal substring
/// "skill" — section headers leaking into the list.
fn clean_skill_list(skills: Option<&Value>, category: &str) -> Vec<String> {
    skills
        .and_then(|s| s.get(category))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter(|x| {
                    !x.is_empty() && x.len() < MAX_SKILL_LEN && !x.to_lowercase().contains("skill")
                })
                .map(decamel)
                .collect()
        })
        .unwrap_or_default()
}

/// Existing bullets win; otherwise bullets are synthesized from a
/// `description` field when one is present.
fn bullets_or_description(entry: &Value) -> Vec<String> {
    let existing: Vec<String> = entry
        .get("bullets")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if !existing.is_empty() {
        return existing;
    }
    entry.get("description").map(split_bullets).unwrap_or_default()
}

/// First present string field among the aliases, defaulting to "".
fn str_field<'a>(obj: &'a Value, keys: &[&str]) -> &'a str {
    keys.iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
        .unwrap_or("")
}

fn opt_str(obj: Option<&Value>, key: &str) -> String {
    obj.and_then(|o| o.get(key))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

fn array_of<'a>(obj: &'a Value, key: &str) -> Vec<&'a Value> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|a| a.iter().collect())
        .unwrap_or_default()
}
