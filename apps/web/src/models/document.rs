use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two kinds of document the generator produces. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Resume,
    CoverLetter,
}

impl DocumentType {
    /// Human-facing label, also used as the title prefix.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::Resume => "Resume",
            DocumentType::CoverLetter => "Cover Letter",
        }
    }

    /// Wire value, as stored in the `type` column and posted by the form.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Resume => "resume",
            DocumentType::CoverLetter => "cover_letter",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "resume" => Ok(DocumentType::Resume),
            "cover_letter" => Ok(DocumentType::CoverLetter),
            other => Err(format!("unknown document type '{other}'")),
        }
    }
}

/// Generation metadata stored next to the text. Field names are camelCase on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMetadata {
    pub job_title: String,
    pub company: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentContent {
    pub text: String,
    pub metadata: ContentMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDetails {
    pub title: String,
    pub company: String,
    pub description: String,
}

/// A row of the hosted `documents` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub title: String,
    pub content: DocumentContent,
    pub job_details: JobDetails,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for the store. `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewDocument {
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub title: String,
    pub content: DocumentContent,
    pub job_details: JobDetails,
}

/// Builds the display title: `"<Resume|Cover Letter> for <job title> at <company>"`.
pub fn compose_title(doc_type: DocumentType, job_title: &str, company: &str) -> String {
    format!("{} for {} at {}", doc_type.label(), job_title, company)
}
