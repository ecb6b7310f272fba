//! Seams through which the mail pipeline consumes the LLM.

use async_trait::async_trait;

use super::error::Result;
use super::schemas::{ComparisonInput, ComparisonResult, StructuredProposal};
use super::service::AiService;

/// Turns a free-text vendor reply into a [`StructuredProposal`].
#[async_trait]
pub trait ProposalExtractor: Send + Sync {
    async fn extract(&self, email_body: &str) -> Result<StructuredProposal>;
}

/// Writes the model-generated parts of an outbound RFP email.
///
/// Neither method may fail: implementations fall back to a fixed subject and
/// to the special requests as the buyer wrote them.
#[async_trait]
pub trait EmailWriter: Send + Sync {
    async fn subject_for(&self, description: &str) -> String;

    async fn rephrase_requests(&self, special_requests: &str) -> String;
}

/// Scores the proposals received for one RFP against each other.
#[async_trait]
pub trait ProposalRanker: Send + Sync {
    async fn rank(&self, proposals: &[ComparisonInput]) -> Result<ComparisonResult>;
}

#[async_trait]
impl ProposalExtractor for AiService {
    async fn extract(&self, email_body: &str) -> Result<StructuredProposal> {
        self.parse_vendor_email(email_body).await
    }
}

#[async_trait]
impl EmailWriter for AiService {
    async fn subject_for(&self, description: &str) -> String {
        self.generate_email_subject(description).await
    }

    async fn rephrase_requests(&self, special_requests: &str) -> String {
        self.rephrase_special_requests(special_requests).await
    }
}

#[async_trait]
impl ProposalRanker for AiService {
    async fn rank(&self, proposals: &[ComparisonInput]) -> Result<ComparisonResult> {
        self.compare_proposals(proposals).await
    }
}
