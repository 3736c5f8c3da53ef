pub mod document;

pub use document::{
    compose_title, ContentMetadata, Document, DocumentContent, DocumentType, JobDetails,
    NewDocument,
};
