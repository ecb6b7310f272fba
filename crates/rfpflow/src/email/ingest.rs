//! Raw message in, proposal out: parse, correlate, build.

use tracing::{info, warn};

use crate::db::proposal_repo::ProposalRow;
use crate::proposal::{ProposalBuilder, ProposalError};

use super::correlator::{Correlator, Unresolved};
use super::parser::InboundEmail;

#[derive(Debug)]
pub enum IngestOutcome {
    ProposalCreated(ProposalRow),
    /// Nothing was stored; the reply needs manual linking.
    Unresolved(Unresolved),
}

/// The per-message pipeline run by the poller.
#[derive(Clone)]
pub struct InboundProcessor {
    correlator: Correlator,
    builder: ProposalBuilder,
}

impl InboundProcessor {
    pub fn new(correlator: Correlator, builder: ProposalBuilder) -> Self {
        Self {
            correlator,
            builder,
        }
    }

    /// Processes one raw RFC 822 message.
    ///
    /// Correlation failures are logged with sender and subject and reported
    /// as [`IngestOutcome::Unresolved`]. Extraction and persistence failures
    /// are returned as errors.
    pub async fn process(&self, raw: &[u8]) -> Result<IngestOutcome, ProposalError> {
        let email = InboundEmail::parse(raw);

        let correlation = match self.correlator.correlate(&email) {
            Ok(correlation) => correlation,
            Err(reason) => {
                warn!(
                    sender = email.from.as_deref().unwrap_or("<none>"),
                    subject = %email.subject,
                    reason = %reason,
                    "could not determine RFP for inbound email, manual linking may be required"
                );
                return Ok(IngestOutcome::Unresolved(reason));
            }
        };

        info!(
            sender = %correlation.vendor.email,
            rfp_id = %correlation.rfp_id,
            matched_by = %correlation.source,
            "correlated inbound email"
        );

        let row = self
            .builder
            .create_from_email(&correlation.vendor.email, &correlation.rfp_id, &email.body)
            .await?;
        Ok(IngestOutcome::ProposalCreated(row))
    }
}
