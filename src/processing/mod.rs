//! Document processing pipeline: extraction, analysis, entities, retrieval, and persistence.

pub mod chunking;
mod mappers;
pub mod retrieval;
pub mod sanitize;
mod service;
pub mod types;
mod workspace;

pub use retrieval::DocumentIndexer;
pub use service::{ProcessingApi, ProcessingService, ServiceComponents};
pub use types::{
    AnalysisReport, ChatAnswer, ChunkingError, ExtractedDocument, HealthSnapshot, LoadedDocument,
    ProcessingError, RetrievedContext,
};
pub use workspace::{StagedUpload, UploadWorkspace};
