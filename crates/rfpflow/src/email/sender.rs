//! Outbound RFP dispatch over SMTP.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::future::join_all;
use lettre::message::{Mailbox as Address, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::{info, warn};

use crate::ai::EmailWriter;
use crate::config::SmtpConfig;
use crate::db::email_record_repo::{self, NewEmailRecord};
use crate::db::rfp_repo::{self, RfpRow};
use crate::db::vendor_repo::{self, VendorRow};
use crate::db::Database;

use super::error::{EmailError, Result};
use super::template::{render_html, render_text};

/// Delivers a fully built message.
#[async_trait]
pub trait OutboundTransport: Send + Sync {
    async fn send(&self, message: Message) -> Result<()>;
}

#[async_trait]
impl OutboundTransport for AsyncSmtpTransport<Tokio1Executor> {
    async fn send(&self, message: Message) -> Result<()> {
        AsyncTransport::send(self, message)
            .await
            .map(|_| ())
            .map_err(|e| EmailError::Smtp(e.to_string()))
    }
}

/// Builds a STARTTLS relay transport from the SMTP section.
pub fn build_smtp_transport(config: &SmtpConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
    let password = config
        .password
        .resolve()
        .map_err(|e| EmailError::CredentialsNotFound(e.to_string()))?;

    let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        .map_err(|e| EmailError::Smtp(e.to_string()))?
        .port(config.port)
        .credentials(Credentials::new(
            config.username.clone(),
            password.expose_secret().to_string(),
        ))
        .build();

    Ok(transport)
}

/// Result of sending one RFP to one vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub vendor_id: String,
    pub success: bool,
    pub message: String,
}

/// Rendered email as a vendor would receive it.
#[derive(Debug, Clone, Serialize)]
pub struct EmailPreview {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Sends RFPs to vendors and records every attempt in `email_records`.
pub struct RfpMailer {
    db: Database,
    transport: Arc<dyn OutboundTransport>,
    writer: Arc<dyn EmailWriter>,
    from: Address,
}

impl RfpMailer {
    pub fn new(
        db: Database,
        transport: Arc<dyn OutboundTransport>,
        writer: Arc<dyn EmailWriter>,
        from: &str,
    ) -> Result<Self> {
        let from = from
            .parse::<Address>()
            .map_err(|e| EmailError::ConfigError(format!("invalid from address '{}': {}", from, e)))?;
        Ok(Self {
            db,
            transport,
            writer,
            from,
        })
    }

    fn load_rfp(&self, rfp_id: &str) -> Result<RfpRow> {
        rfp_repo::find_by_id(&self.db, rfp_id)?.ok_or_else(|| EmailError::NotFound {
            kind: "RFP",
            id: rfp_id.to_string(),
        })
    }

    async fn special_requests(&self, rfp: &RfpRow) -> Option<String> {
        let raw = rfp.structured_data.special_requests.as_deref()?;
        if raw.trim().is_empty() {
            return None;
        }
        Some(self.writer.rephrase_requests(raw).await)
    }

    /// Sends the RFP to each vendor concurrently.
    ///
    /// Every RFP and vendor id is resolved before anything is sent, so an
    /// unknown id aborts the whole dispatch. Individual delivery failures
    /// are reported per vendor instead. A draft RFP is marked as sent once
    /// at least one delivery succeeds.
    pub async fn send_rfp_to_vendors(
        &self,
        rfp_id: &str,
        vendor_ids: &[String],
    ) -> Result<Vec<DispatchOutcome>> {
        let rfp = self.load_rfp(rfp_id)?;

        let mut vendors = Vec::with_capacity(vendor_ids.len());
        for id in vendor_ids {
            let vendor = vendor_repo::find_by_id(&self.db, id)?.ok_or_else(|| {
                EmailError::NotFound {
                    kind: "Vendor",
                    id: id.clone(),
                }
            })?;
            vendors.push(vendor);
        }

        let subject = self.writer.subject_for(&rfp.description_raw).await;
        let requests = self.special_requests(&rfp).await;
        let text = render_text(&rfp);

        let outcomes = join_all(vendors.iter().map(|vendor| {
            self.dispatch(&rfp, vendor, &subject, requests.as_deref(), &text)
        }))
        .await;

        if rfp.is_draft && outcomes.iter().any(|o| o.success) {
            rfp_repo::mark_draft_as_sent(&self.db, &rfp.id)?;
        }

        let sent = outcomes.iter().filter(|o| o.success).count();
        info!(rfp_id = %rfp.id, sent, failed = outcomes.len() - sent, "RFP dispatch finished");

        Ok(outcomes)
    }

    async fn dispatch(
        &self,
        rfp: &RfpRow,
        vendor: &VendorRow,
        subject: &str,
        special_requests: Option<&str>,
        text: &str,
    ) -> DispatchOutcome {
        let html = render_html(rfp, &vendor.name, special_requests);

        let result = self.deliver(rfp, vendor, subject, text, &html).await;
        let (success, message) = match result {
            Ok(()) => (true, format!("Email sent successfully to {}", vendor.email)),
            Err(e) => {
                warn!(vendor = %vendor.email, error = %e, "RFP email failed");
                (false, format!("Failed to send email to {}: {}", vendor.email, e))
            }
        };

        DispatchOutcome {
            vendor_id: vendor.id.clone(),
            success,
            message,
        }
    }

    async fn deliver(
        &self,
        rfp: &RfpRow,
        vendor: &VendorRow,
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<()> {
        let record = email_record_repo::insert_pending(
            &self.db,
            &NewEmailRecord {
                rfp_id: &rfp.id,
                vendor_id: &vendor.id,
                recipient_email: &vendor.email,
                subject,
                email_body: html,
            },
        )?;

        let sent = self.send_message(vendor, subject, text, html).await;
        match &sent {
            Ok(()) => email_record_repo::mark_sent(&self.db, &record.id, Utc::now())?,
            Err(e) => email_record_repo::mark_failed(&self.db, &record.id, &e.to_string())?,
        }
        sent
    }

    async fn send_message(
        &self,
        vendor: &VendorRow,
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<()> {
        let to = vendor
            .email
            .parse::<Address>()
            .map_err(|e| EmailError::Smtp(format!("invalid recipient '{}': {}", vendor.email, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(
                text.to_string(),
                html.to_string(),
            ))?;

        self.transport.send(message).await
    }

    /// Renders what `send_rfp_to_vendors` would send, with a placeholder
    /// vendor name.
    pub async fn preview(&self, rfp_id: &str) -> Result<EmailPreview> {
        let rfp = self.load_rfp(rfp_id)?;
        let requests = self.special_requests(&rfp).await;
        Ok(EmailPreview {
            subject: self.writer.subject_for(&rfp.description_raw).await,
            html: render_html(&rfp, "Vendor Name", requests.as_deref()),
            text: render_text(&rfp),
        })
    }
}
