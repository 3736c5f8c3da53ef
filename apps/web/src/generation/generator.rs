//! Document generation: validate the form, call the model, persist the result.
//!
//! Flow: validate → build_prompt → TextGenerator::generate → DocumentStore::create.
//! The store is only touched after the model has answered, so a failed generation
//! never leaves a partial document behind. Nothing is retried.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::generation::prompts::build_prompt;
use crate::llm_client::TextGenerator;
use crate::models::{
    compose_title, ContentMetadata, Document, DocumentContent, DocumentType, JobDetails,
    NewDocument,
};
use crate::store::{DocumentStore, Owner};

/// Raw generator form as submitted. Every field is a string so that a missing or
/// blank field becomes a validation message instead of an extractor rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationForm {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub job_title: String,
    pub company: String,
    pub job_description: String,
    pub experience: String,
    pub skills: String,
}

/// A validated generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationInput {
    pub doc_type: DocumentType,
    pub job_title: String,
    pub company: String,
    pub job_description: String,
    pub experience: String,
    pub skills: String,
}

impl GenerationForm {
    /// Checks that all six fields are present and the type is one of the two variants.
    pub fn validate(&self) -> Result<GenerationInput, AppError> {
        let doc_type = self
            .doc_type
            .parse::<DocumentType>()
            .map_err(|_| AppError::Validation("Choose a document type.".to_string()))?;

        let required = [
            ("Job title", &self.job_title),
            ("Company", &self.company),
            ("Job description", &self.job_description),
            ("Experience", &self.experience),
            ("Skills", &self.skills),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(label, _)| *label)
            .collect();

        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "All fields are required. Missing: {}.",
                missing.join(", ")
            )));
        }

        Ok(GenerationInput {
            doc_type,
            job_title: self.job_title.trim().to_string(),
            company: self.company.trim().to_string(),
            job_description: self.job_description.trim().to_string(),
            experience: self.experience.trim().to_string(),
            skills: self.skills.trim().to_string(),
        })
    }
}

/// Assembles the record to insert from the validated input and the generated text.
pub fn build_new_document(owner: Owner<'_>, input: &GenerationInput, text: String) -> NewDocument {
    NewDocument {
        user_id: owner.user_id,
        doc_type: input.doc_type,
        title: compose_title(input.doc_type, &input.job_title, &input.company),
        content: DocumentContent {
            text,
            metadata: ContentMetadata {
                job_title: input.job_title.clone(),
                company: input.company.clone(),
                generated_at: Utc::now(),
            },
        },
        job_details: JobDetails {
            title: input.job_title.clone(),
            company: input.company.clone(),
            description: input.job_description.clone(),
        },
    }
}

/// Runs one generation request end to end and returns the stored document.
///
/// Exactly one document is created on success. A generation failure returns
/// `AppError::Generation` before the store is called; a store failure returns
/// `AppError::Store` and is never reported as success.
pub async fn generate_document(
    generator: &dyn TextGenerator,
    store: &dyn DocumentStore,
    owner: Owner<'_>,
    input: &GenerationInput,
) -> Result<Document, AppError> {
    info!(
        "Generating {} for user {} ({} at {})",
        input.doc_type, owner.user_id, input.job_title, input.company
    );

    let prompt = build_prompt(input);
    let text = generator.generate(&prompt).await.map_err(|e| {
        warn!("Generation failed for user {}: {e}", owner.user_id);
        AppError::Generation(e)
    })?;

    let document = build_new_document(owner, input, text);
    let stored = store.create(owner, document).await?;

    info!("Generated document {} for user {}", stored.id, owner.user_id);
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::GenerationError;
    use crate::store::memory::MemoryStore;
    use crate::store::StoreError;
    use crate::testing::ScriptedGenerator;
    use uuid::Uuid;

    fn form() -> GenerationForm {
        GenerationForm {
            doc_type: "resume".to_string(),
            job_title: "Site Reliability Engineer".to_string(),
            company: "Initech".to_string(),
            job_description: "Keep the TPS reports flowing".to_string(),
            experience: "5 years on-call".to_string(),
            skills: "Linux, Rust".to_string(),
        }
    }

    fn owner(user_id: Uuid) -> Owner<'static> {
        Owner {
            user_id,
            access_token: "token",
        }
    }

    #[test]
    fn test_validate_accepts_complete_form() {
        let input = form().validate().unwrap();
        assert_eq!(input.doc_type, DocumentType::Resume);
        assert_eq!(input.company, "Initech");
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let mut f = form();
        f.skills = "   ".to_string();
        f.company = String::new();
        match f.validate() {
            Err(AppError::Validation(msg)) => {
                assert!(msg.contains("Company"));
                assert!(msg.contains("Skills"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_unknown_type() {
        let mut f = form();
        f.doc_type = "memo".to_string();
        assert!(matches!(f.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_form_deserializes_camel_case_fields() {
        let f: GenerationForm = serde_json::from_value(serde_json::json!({
            "type": "cover_letter",
            "jobTitle": "Analyst",
            "company": "Globex",
            "jobDescription": "Analyse",
            "experience": "Some",
            "skills": "Excel"
        }))
        .unwrap();
        assert_eq!(f.validate().unwrap().doc_type, DocumentType::CoverLetter);
    }

    #[tokio::test]
    async fn test_successful_generation_creates_exactly_one_matching_document() {
        let store = MemoryStore::new();
        let generator = ScriptedGenerator::ok("Generated resume\n\nwith breaks");
        let user_id = Uuid::new_v4();
        let input = form().validate().unwrap();

        let doc = generate_document(&generator, &store, owner(user_id), &input)
            .await
            .unwrap();

        assert_eq!(store.all().len(), 1);
        assert_eq!(doc.user_id, user_id);
        assert_eq!(doc.doc_type, DocumentType::Resume);
        assert_eq!(
            doc.title,
            "Resume for Site Reliability Engineer at Initech"
        );
        assert_eq!(doc.content.text, "Generated resume\n\nwith breaks");
        assert_eq!(doc.content.metadata.job_title, input.job_title);
        assert_eq!(doc.content.metadata.company, input.company);
        assert_eq!(doc.job_details.title, input.job_title);
        assert_eq!(doc.job_details.company, input.company);
        assert_eq!(doc.job_details.description, input.job_description);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_listing_returns_only_the_owners_documents_newest_first() {
        let store = MemoryStore::new();
        let generator = ScriptedGenerator::ok("text");
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let mut created = Vec::new();
        for job_title in ["Analyst", "Engineer", "Manager"] {
            let mut f = form();
            f.job_title = job_title.to_string();
            let input = f.validate().unwrap();
            created.push(
                generate_document(&generator, &store, owner(alice), &input)
                    .await
                    .unwrap(),
            );
        }
        let bobs = generate_document(&generator, &store, owner(bob), &form().validate().unwrap())
            .await
            .unwrap();

        let listed = store.list(owner(alice)).await.unwrap();
        assert_eq!(listed.len(), 3);
        let listed_ids: Vec<Uuid> = listed.iter().map(|d| d.id).collect();
        let newest_first: Vec<Uuid> = created.iter().rev().map(|d| d.id).collect();
        assert_eq!(listed_ids, newest_first);
        assert!(listed.windows(2).all(|w| w[0].created_at > w[1].created_at));
        assert!(listed.iter().all(|d| d.user_id == alice));
        assert!(!listed_ids.contains(&bobs.id));
        assert_eq!(listed[0].title, "Resume for Manager at Initech");
    }

    #[tokio::test]
    async fn test_quota_failure_leaves_store_unchanged() {
        let store = MemoryStore::new();
        let generator = ScriptedGenerator::err(GenerationError::QuotaExhausted);
        let input = form().validate().unwrap();

        let err = generate_document(&generator, &store, owner(Uuid::new_v4()), &input)
            .await
            .unwrap_err();

        assert!(store.all().is_empty(), "no partial document may be created");
        assert_eq!(
            err.user_message(),
            "OpenAI API quota exceeded. Please check your API key billing status."
        );
        assert_eq!(generator.calls(), 1, "no automatic retry");
    }

    #[tokio::test]
    async fn test_store_failure_is_not_reported_as_success() {
        let store = MemoryStore::new();
        store.fail_next();
        let generator = ScriptedGenerator::ok("text");
        let input = form().validate().unwrap();

        let result = generate_document(&generator, &store, owner(Uuid::new_v4()), &input).await;
        assert!(matches!(result, Err(AppError::Store(StoreError::Api { .. }))));
        assert!(store.all().is_empty());
    }
}
