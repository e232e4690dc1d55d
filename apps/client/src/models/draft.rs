use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::generation::TemplateStyle;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DraftType {
    Resume,
    CoverLetter,
}

/// A row of `GET /drafts/drafts/`, newest `updated_at` first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedDraft {
    pub id: i64,
    pub draft_type: DraftType,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub summary_line: String,
    pub job_description: String,
    pub template_style: String,
    /// The generated document as returned by the generation endpoint.
    pub content: Value,
    #[serde(default)]
    pub resume_filename: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SavedDraft {
    /// Title shown in draft listings.
    pub fn label(&self) -> String {
        match (self.job_title.trim(), self.company.trim()) {
            ("", "") => "Draft".to_string(),
            (title, "") => title.to_string(),
            ("", company) => company.to_string(),
            (title, company) => format!("{title} at {company}"),
        }
    }
}

/// Body of `POST /drafts/drafts/`. The backend fills in missing job title,
/// company and summary line from the job description.
#[derive(Debug, Clone, Serialize)]
pub struct NewDraft {
    pub draft_type: DraftType,
    pub job_title: String,
    pub company: String,
    pub job_description: String,
    pub template_style: TemplateStyle,
    pub content: Value,
}
