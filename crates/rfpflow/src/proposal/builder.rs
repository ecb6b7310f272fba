//! Turns a correlated reply into a stored proposal.

use std::sync::Arc;

use tracing::info;

use crate::ai::ProposalExtractor;
use crate::db::proposal_repo::{self, NewProposal, ProposalPatch, ProposalRow};
use crate::db::{rfp_repo, vendor_repo, Database};

use super::error::{ProposalError, Result};

/// Creates, lists and edits vendor proposals.
#[derive(Clone)]
pub struct ProposalBuilder {
    db: Database,
    extractor: Arc<dyn ProposalExtractor>,
}

impl ProposalBuilder {
    pub fn new(db: Database, extractor: Arc<dyn ProposalExtractor>) -> Self {
        Self { db, extractor }
    }

    /// Extracts a structured proposal from `email_body` and stores it.
    ///
    /// Vendor and RFP are looked up again here; either missing is
    /// [`ProposalError::NotFound`]. Every call inserts a new row, even when
    /// the vendor already answered the same RFP.
    pub async fn create_from_email(
        &self,
        vendor_email: &str,
        rfp_id: &str,
        email_body: &str,
    ) -> Result<ProposalRow> {
        let sender = vendor_repo::normalize_email(vendor_email);
        let vendor = vendor_repo::find_by_email(&self.db, &sender)?
            .ok_or_else(|| ProposalError::not_found("Vendor", vendor_email))?;
        let rfp = rfp_repo::find_by_id(&self.db, rfp_id)?
            .ok_or_else(|| ProposalError::not_found("RFP", rfp_id))?;

        let structured = self.extractor.extract(email_body).await?;
        let score = structured.completeness;

        let row = proposal_repo::insert(
            &self.db,
            NewProposal {
                vendor_id: vendor.id,
                rfp_id: rfp.id,
                raw_email: email_body.to_string(),
                structured_proposal: structured,
                score,
            },
        )?;

        info!(
            proposal_id = %row.id,
            rfp_id = %row.rfp_id,
            vendor = %vendor.email,
            "created proposal from vendor email"
        );
        Ok(row)
    }

    pub fn list_all(&self) -> Result<Vec<ProposalRow>> {
        Ok(proposal_repo::list_all(&self.db)?)
    }

    pub fn list_for_rfp(&self, rfp_id: &str) -> Result<Vec<ProposalRow>> {
        Ok(proposal_repo::list_for_rfp(&self.db, rfp_id)?)
    }

    pub fn find(&self, id: &str) -> Result<ProposalRow> {
        proposal_repo::find_by_id(&self.db, id)?
            .ok_or_else(|| ProposalError::not_found("Proposal", id))
    }

    /// Manual edit of the structured payload, summary or score.
    pub fn update(&self, id: &str, patch: &ProposalPatch) -> Result<ProposalRow> {
        proposal_repo::update(&self.db, id, patch)?
            .ok_or_else(|| ProposalError::not_found("Proposal", id))
    }
}
