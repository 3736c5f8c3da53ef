// Prompt constants for document generation.
// The document type only changes the system instruction and the user template.

use crate::generation::generator::GenerationInput;
use crate::llm_client::PromptPair;
use crate::models::DocumentType;

/// System prompt for resumes.
pub const RESUME_SYSTEM: &str = "You are a professional resume writer. \
    Create clear, concise, and impactful resumes.";

/// System prompt for cover letters.
pub const COVER_LETTER_SYSTEM: &str = "You are a professional cover letter writer. \
    Create compelling and personalized cover letters.";

/// Resume prompt template.
/// Replace: {job_title}, {company}, {job_description}, {experience}, {skills}
pub const RESUME_PROMPT_TEMPLATE: &str = r#"Create a professional resume for a {job_title} position at {company}.
Job Description: {job_description}
Candidate Experience: {experience}
Skills: {skills}
Format the resume in a clear, professional structure."#;

/// Cover letter prompt template. Same placeholders as the resume template.
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"Write a compelling cover letter for a {job_title} position at {company}.
Job Description: {job_description}
Candidate Experience: {experience}
Skills: {skills}
Make it professional and engaging."#;

/// Builds the system/user prompt pair for one generation request.
pub fn build_prompt(input: &GenerationInput) -> PromptPair {
    let (system, template) = match input.doc_type {
        DocumentType::Resume => (RESUME_SYSTEM, RESUME_PROMPT_TEMPLATE),
        DocumentType::CoverLetter => (COVER_LETTER_SYSTEM, COVER_LETTER_PROMPT_TEMPLATE),
    };

    // Placeholders are filled in a single pass so user text containing
    // "{company}" and friends is never expanded twice.
    let user = fill_template(
        template,
        &[
            ("{job_title}", &input.job_title),
            ("{company}", &input.company),
            ("{job_description}", &input.job_description),
            ("{experience}", &input.experience),
            ("{skills}", &input.skills),
        ],
    );

    PromptPair {
        system: system.to_string(),
        user,
    }
}

fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + 256);
    let mut rest = template;

    'scan: while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        for (placeholder, value) in values {
            if tail.starts_with(placeholder) {
                out.push_str(value);
                rest = &tail[placeholder.len()..];
                continue 'scan;
            }
        }
        out.push('{');
        rest = &tail[1..];
    }
    out.push_str(rest);
    out
}
