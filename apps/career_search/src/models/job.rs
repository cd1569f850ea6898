use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::llm_client::strip_json_fences;

/// A single job posting as the crew is asked to report it. Every field is optional:
/// the schema is a prompt hint, not a contract the model is held to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    pub id: Option<String>,
    pub location: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub provider: Option<String>,
    pub url: Option<String>,
    pub rating: Option<i64>,
    pub rating_notes: Option<String>,
    pub company_rating: Option<i64>,
    pub company_notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobResults {
    pub jobs: Option<Vec<Job>>,
}

/// (field, JSON type) in declaration order of `Job`.
const JOB_FIELDS: &[(&str, &str)] = &[
    ("id", "string"),
    ("location", "string"),
    ("title", "string"),
    ("company", "string"),
    ("description", "string"),
    ("provider", "string"),
    ("url", "string"),
    ("rating", "integer"),
    ("rating_notes", "string"),
    ("company_rating", "integer"),
    ("company_notes", "string"),
];

impl JobResults {
    /// JSON schema of `JobResults`, injected into the evaluate/structure task prompts.
    pub fn json_schema() -> Value {
        let mut properties = Map::new();
        for (field, ty) in JOB_FIELDS {
            properties.insert(
                field.to_string(),
                json!({
                    "anyOf": [{ "type": ty }, { "type": "null" }],
                    "title": title_case(field),
                }),
            );
        }
        let required: Vec<&str> = JOB_FIELDS.iter().map(|(field, _)| *field).collect();

        json!({
            "$defs": {
                "Job": {
                    "properties": properties,
                    "required": required,
                    "title": "Job",
                    "type": "object"
                }
            },
            "properties": {
                "jobs": {
                    "anyOf": [
                        { "items": { "$ref": "#/$defs/Job" }, "type": "array" },
                        { "type": "null" }
                    ],
                    "title": "Jobs"
                }
            },
            "required": ["jobs"],
            "title": "JobResults",
            "type": "object"
        })
    }

    /// Pretty-printed (2-space) schema string, as substituted for `{output_schema}`.
    pub fn schema_string() -> String {
        // Serializing a `Value` built from literals cannot fail.
        serde_json::to_string_pretty(&Self::json_schema()).unwrap_or_default()
    }
}

/// Lenient decode of crew output for display: strips markdown fences, takes the `jobs`
/// array, and degrades to an empty list on a missing key or any decode error.
pub fn decode_jobs(raw: &str) -> Vec<Job> {
    let value: Value = match serde_json::from_str(strip_json_fences(raw)) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("Error decoding results: {e}");
            return vec![];
        }
    };

    match value.get("jobs") {
        Some(jobs) => serde_json::from_value::<Vec<Job>>(jobs.clone()).unwrap_or_else(|e| {
            tracing::warn!("Error decoding jobs array: {e}");
            vec![]
        }),
        None => vec![],
    }
}

fn title_case(field: &str) -> String {
    field
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
