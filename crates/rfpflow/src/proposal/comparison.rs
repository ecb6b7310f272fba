//! LLM ranking of all proposals received for an RFP.

use tracing::{info, warn};

use crate::ai::{ComparisonInput, ComparisonResult, ProposalRanker};
use crate::db::{proposal_repo, rfp_repo, vendor_repo, Database};

use super::error::{ProposalError, Result};

/// Ranks the proposals for `rfp_id` and stores each vendor's score and
/// reasoning on that vendor's proposals.
///
/// With no proposals the LLM is not called and an empty result is returned.
pub async fn compare_proposals(
    db: &Database,
    ranker: &dyn ProposalRanker,
    rfp_id: &str,
) -> Result<ComparisonResult> {
    let rfp = rfp_repo::find_by_id(db, rfp_id)?
        .ok_or_else(|| ProposalError::not_found("RFP", rfp_id))?;

    let proposals = proposal_repo::list_for_rfp(db, &rfp.id)?;
    if proposals.is_empty() {
        return Ok(ComparisonResult::empty());
    }

    let mut inputs = Vec::with_capacity(proposals.len());
    for proposal in proposals {
        let vendor = vendor_repo::find_by_id(db, &proposal.vendor_id)?
            .ok_or_else(|| ProposalError::not_found("Vendor", &proposal.vendor_id))?;
        inputs.push(ComparisonInput {
            id: proposal.id,
            vendor_id: vendor.id,
            vendor_name: vendor.name,
            vendor_email: vendor.email,
            structured_proposal: proposal.structured_proposal,
            existing_score: proposal.score,
        });
    }

    let result = ranker.rank(&inputs).await?;

    for (vendor_id, score) in &result.scores {
        let touched =
            proposal_repo::update_score_summary(db, &rfp.id, vendor_id, score.score, &score.reasoning)?;
        if touched == 0 {
            warn!(rfp_id = %rfp.id, vendor_id = %vendor_id, "comparison scored a vendor with no proposal");
        }
    }

    info!(
        rfp_id = %rfp.id,
        proposals = inputs.len(),
        recommended = result
            .recommended_vendor
            .as_ref()
            .map(|r| r.vendor_id.as_str())
            .unwrap_or("none"),
        "compared proposals"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiError, Recommendation, RfpStructure, StructuredProposal, VendorScore};
    use crate::db::proposal_repo::NewProposal;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedRanker {
        result: ComparisonResult,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ProposalRanker for ScriptedRanker {
        async fn rank(&self, proposals: &[ComparisonInput]) -> crate::ai::error::Result<ComparisonResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if proposals.is_empty() {
                return Err(AiError::EmptyResponse);
            }
            Ok(self.result.clone())
        }
    }

    fn ranker(scores: &[(&str, f64)]) -> ScriptedRanker {
        let scores: BTreeMap<String, VendorScore> = scores
            .iter()
            .map(|(id, score)| {
                (
                    id.to_string(),
                    VendorScore {
                        score: *score,
                        reasoning: format!("score {}", score),
                    },
                )
            })
            .collect();
        ScriptedRanker {
            result: ComparisonResult {
                summary: "ranked".to_string(),
                recommended_vendor: scores.keys().next().map(|id| Recommendation {
                    vendor_id: id.clone(),
                    reason: "best".to_string(),
                }),
                scores,
            },
            calls: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn test_no_proposals_skips_llm() {
        let db = Database::open_in_memory().unwrap();
        let rfp = rfp_repo::insert(&db, "chairs", &RfpStructure::default(), false).unwrap();
        let ranker = ranker(&[]);

        let result = compare_proposals(&db, &ranker, &rfp.id).await.unwrap();
        assert_eq!(result.summary, "No proposals found for this RFP");
        assert!(result.scores.is_empty());
        assert!(result.recommended_vendor.is_none());
        assert_eq!(ranker.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_scores_written_back() {
        let db = Database::open_in_memory().unwrap();
        let rfp = rfp_repo::insert(&db, "laptops", &RfpStructure::default(), false).unwrap();
        let acme = vendor_repo::insert(&db, "Acme", "a@acme.test", None).unwrap();
        let zeta = vendor_repo::insert(&db, "Zeta", "z@zeta.test", None).unwrap();
        for vendor in [&acme, &zeta] {
            proposal_repo::insert(
                &db,
                NewProposal {
                    vendor_id: vendor.id.clone(),
                    rfp_id: rfp.id.clone(),
                    raw_email: "offer".to_string(),
                    structured_proposal: StructuredProposal::default(),
                    score: Some(50.0),
                },
            )
            .unwrap();
        }

        let ranker = ranker(&[(acme.id.as_str(), 91.0), (zeta.id.as_str(), 64.0)]);
        compare_proposals(&db, &ranker, &rfp.id).await.unwrap();

        let rows = proposal_repo::list_for_rfp(&db, &rfp.id).unwrap();
        let acme_row = rows.iter().find(|p| p.vendor_id == acme.id).unwrap();
        assert_eq!(acme_row.score, Some(91.0));
        assert_eq!(acme_row.ai_summary.as_deref(), Some("score 91"));
        let zeta_row = rows.iter().find(|p| p.vendor_id == zeta.id).unwrap();
        assert_eq!(zeta_row.score, Some(64.0));
    }

    #[tokio::test]
    async fn test_unknown_rfp() {
        let db = Database::open_in_memory().unwrap();
        let err = compare_proposals(&db, &ranker(&[]), "missing").await.unwrap_err();
        assert!(matches!(err, ProposalError::NotFound { kind: "RFP", .. }));
    }
}
