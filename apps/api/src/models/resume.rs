//! Canonical resume schema.
//!
//! A `ResumeRecord` is produced by the parser, normalized once by the
//! cleaner, and never mutated afterwards. All fields default to empty so a
//! sparse record is always representable.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeRecord {
    pub name: String,
    pub headline: String,
    pub contact: Contact,
    pub summary: String,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Skills,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub email: String,
    pub phone: String,
    pub github: String,
    pub linkedin: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub title: String,
    pub company: String,
    pub location: String,
    pub start: String,
    pub end: String,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub degree: String,
    pub school: String,
    pub location: String,
    pub start: String,
    pub end: String,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skills {
    pub core: Vec<String>,
    pub languages: Vec<String>,
    pub tools: Vec<String>,
    pub soft: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub title: String,
    pub url: String,
    pub bullets: Vec<String>,
}

impl ResumeRecord {
    /// The empty canonical schema, rendered as JSON. Embedded in the parser
    /// system prompt so the model sees the exact shape it must return.
    pub fn schema_json() -> String {
        serde_json::to_string_pretty(&ResumeRecord::default())
            .unwrap_or_else(|_| "{}".to_string())
    }
}
