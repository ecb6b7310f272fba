//! LLM capability: structured extraction, comparison and subject writing.
//!
//! All intelligence is delegated to a hosted model; this module owns the
//! prompts, the HTTP round trip and the validation of returned JSON.

pub mod client;
pub mod error;
pub mod extractor;
pub mod prompts;
pub mod schemas;
pub mod service;

pub use client::GeminiClient;
pub use error::AiError;
pub use extractor::{EmailWriter, ProposalExtractor, ProposalRanker};
pub use schemas::{
    ComparisonInput, ComparisonResult, ProposalItem, Recommendation, RfpItem, RfpStructure,
    StructuredProposal, VendorScore,
};
pub use service::AiService;
