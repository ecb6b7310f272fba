//! Prompt-level operations built on top of [`GeminiClient`].

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::{error, warn};

use super::client::GeminiClient;
use super::error::{AiError, Result};
use super::prompts::{
    COMPARE_PROPOSALS_PROMPT, GENERATE_EMAIL_SUBJECT_PROMPT, GENERATE_RFP_PROMPT,
    PARSE_PROPOSAL_PROMPT, REPHRASE_SPECIAL_REQUESTS_PROMPT,
};
use super::schemas::{ComparisonInput, ComparisonResult, RfpStructure, StructuredProposal};

/// Subject used whenever the model cannot produce one.
pub const FALLBACK_SUBJECT: &str = "RFP Request";

static RE_JSON_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Returns the outermost `{...}` span of a model reply, or the whole reply.
///
/// Models often wrap JSON in prose or code fences; the greedy match keeps
/// nested objects intact.
pub fn extract_json(content: &str) -> &str {
    RE_JSON_OBJECT
        .find(content)
        .map(|m| m.as_str())
        .unwrap_or(content)
}

fn parse_reply<T: DeserializeOwned>(content: &str) -> Result<T> {
    serde_json::from_str(extract_json(content)).map_err(|e| AiError::InvalidJson(e.to_string()))
}

/// LLM-backed structuring, extraction and ranking.
pub struct AiService {
    client: GeminiClient,
}

impl AiService {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    /// Turns a procurement description into a structured RFP.
    pub async fn generate_structured_rfp(&self, description: &str) -> Result<RfpStructure> {
        let prompt = format!(
            "{}\n\nUser description: {}\n\nReturn ONLY valid JSON, no other text.",
            GENERATE_RFP_PROMPT, description
        );
        let result = async {
            let reply = self.client.generate(&prompt).await?;
            let structure: RfpStructure = parse_reply(&reply)?;
            structure.validate().map_err(AiError::SchemaViolation)?;
            Ok(structure)
        }
        .await;

        if let Err(e) = &result {
            error!(error = %e, "failed to generate structured RFP");
        }
        result
    }

    /// Extracts price, items, delivery, warranty and completeness from a reply body.
    pub async fn parse_vendor_email(&self, email_body: &str) -> Result<StructuredProposal> {
        let prompt = format!(
            "{}\n\nEmail body:\n{}\n\nReturn ONLY valid JSON, no other text.",
            PARSE_PROPOSAL_PROMPT, email_body
        );
        let result = async {
            let reply = self.client.generate(&prompt).await?;
            let proposal: StructuredProposal = parse_reply(&reply)?;
            proposal.validate().map_err(AiError::SchemaViolation)?;
            Ok(proposal)
        }
        .await;

        if let Err(e) = &result {
            error!(error = %e, "failed to parse vendor email");
        }
        result
    }

    /// Scores every proposal and picks a recommended vendor.
    pub async fn compare_proposals(&self, proposals: &[ComparisonInput]) -> Result<ComparisonResult> {
        let payload = serde_json::to_string_pretty(proposals)
            .map_err(|e| AiError::InvalidJson(e.to_string()))?;
        let prompt = format!(
            "{}\n\nProposals data:\n{}\n\nReturn ONLY valid JSON, no other text.",
            COMPARE_PROPOSALS_PROMPT, payload
        );
        let result = async {
            let reply = self.client.generate(&prompt).await?;
            let comparison: ComparisonResult = parse_reply(&reply)?;
            comparison.validate().map_err(AiError::SchemaViolation)?;
            Ok(comparison)
        }
        .await;

        if let Err(e) = &result {
            error!(error = %e, "failed to compare proposals");
        }
        result
    }

    /// Produces an email subject for an RFP. Never fails.
    pub async fn generate_email_subject(&self, description: &str) -> String {
        let prompt = format!(
            "{}\n\nRFP Description: {}\n\nReturn ONLY the subject line, no other text.",
            GENERATE_EMAIL_SUBJECT_PROMPT, description
        );
        match self.client.generate(&prompt).await {
            Ok(reply) => clean_subject(&reply),
            Err(e) => {
                warn!(error = %e, "subject generation failed, using fallback");
                FALLBACK_SUBJECT.to_string()
            }
        }
    }

    /// Rewrites special requests as formal prose for the RFP email. Never
    /// fails; any error or empty reply returns the trimmed input.
    pub async fn rephrase_special_requests(&self, special_requests: &str) -> String {
        let original = special_requests.trim();
        if original.is_empty() {
            return String::new();
        }
        let prompt = format!(
            "{}\n\nSpecial requests: {}\n\nReturn ONLY the rephrased text, no other text.",
            REPHRASE_SPECIAL_REQUESTS_PROMPT, original
        );
        match self.client.generate(&prompt).await {
            Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
            Ok(_) => {
                warn!("empty rephrasing reply, using special requests as written");
                original.to_string()
            }
            Err(e) => {
                warn!(error = %e, "special request rephrasing failed, using original text");
                original.to_string()
            }
        }
    }
}

/// Strips whitespace and one layer of surrounding quotes from a model subject.
fn clean_subject(reply: &str) -> String {
    let trimmed = reply.trim();
    let trimmed = trimmed.strip_prefix(['"', '\'']).unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(['"', '\'']).unwrap_or(trimmed).trim();
    if trimmed.is_empty() {
        FALLBACK_SUBJECT.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use secrecy::SecretString;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn service_replying(text: &str) -> (MockServer, AiService) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": text}]}}]
            })))
            .mount(&server)
            .await;
        let config = LlmConfig {
            base_url: server.uri(),
            ..LlmConfig::default()
        };
        let client = GeminiClient::new(&config, SecretString::from("test-key")).unwrap();
        (server, AiService::new(client))
    }

    #[test]
    fn test_extract_json_from_fenced_reply() {
        let reply = "Here you go:\n```json\n{\"price\": 10, \"items\": [{\"name\": \"a\"}]}\n```";
        assert_eq!(
            extract_json(reply),
            "{\"price\": 10, \"items\": [{\"name\": \"a\"}]}"
        );
    }

    #[test]
    fn test_extract_json_without_braces_returns_input() {
        assert_eq!(extract_json("no json here"), "no json here");
    }

    #[test]
    fn test_clean_subject() {
        assert_eq!(clean_subject("  \"RFP for Laptops\"\n"), "RFP for Laptops");
        assert_eq!(clean_subject("'RFP for Chairs'"), "RFP for Chairs");
        assert_eq!(clean_subject("   "), FALLBACK_SUBJECT);
    }

    #[tokio::test]
    async fn test_parse_vendor_email() {
        let (_server, service) = service_replying(
            "```json\n{\"price\": 140500, \"items\": [], \"delivery_days\": 10, \"warranty\": null, \"notes\": null, \"completeness\": 60}\n```",
        )
        .await;

        let proposal = service
            .parse_vendor_email("Price: 1,40,500. Delivery: 10 days.")
            .await
            .unwrap();
        assert_eq!(proposal.price, Some(140500.0));
        assert_eq!(proposal.delivery_days, Some(10.0));
        assert_eq!(proposal.completeness, Some(60.0));
    }

    #[tokio::test]
    async fn test_parse_vendor_email_rejects_bad_completeness() {
        let (_server, service) =
            service_replying("{\"price\": 1, \"items\": [], \"completeness\": 250}").await;
        let err = service.parse_vendor_email("body").await.unwrap_err();
        assert!(matches!(err, AiError::SchemaViolation(_)));
    }

    #[tokio::test]
    async fn test_parse_vendor_email_rejects_prose() {
        let (_server, service) = service_replying("Sorry, I cannot help with that.").await;
        let err = service.parse_vendor_email("body").await.unwrap_err();
        assert!(matches!(err, AiError::InvalidJson(_)));
    }

    #[tokio::test]
    async fn test_generate_structured_rfp() {
        let (_server, service) = service_replying(
            "{\"budget\": 50000, \"budget_currency\": \"USD\", \"items\": [{\"name\": \"Laptop\", \"quantity\": 20}], \"quantities\": {\"Laptop\": 20}, \"delivery_timeline\": null, \"payment_terms\": null, \"warranty\": \"1 year\", \"category\": \"Laptops\"}",
        )
        .await;

        let rfp = service
            .generate_structured_rfp("20 laptops, $50k, 1 year warranty")
            .await
            .unwrap();
        assert_eq!(rfp.category.as_deref(), Some("Laptops"));
        assert_eq!(rfp.items.len(), 1);
    }

    #[tokio::test]
    async fn test_compare_proposals() {
        let (_server, service) = service_replying(
            "{\"summary\": \"Acme is cheaper\", \"scores\": {\"v1\": {\"score\": 82, \"reasoning\": \"cheap\"}}, \"recommended_vendor\": {\"vendor_id\": \"v1\", \"reason\": \"price\"}}",
        )
        .await;

        let result = service.compare_proposals(&[]).await.unwrap();
        assert_eq!(result.scores["v1"].score, 82.0);
        assert_eq!(result.recommended_vendor.unwrap().vendor_id, "v1");
    }

    #[tokio::test]
    async fn test_rephrase_special_requests() {
        let (_server, service) = service_replying(
            "  We are expecting a discount of 20% on the final invoice amount.\n",
        )
        .await;

        assert_eq!(
            service
                .rephrase_special_requests("expecting 20% discount")
                .await,
            "We are expecting a discount of 20% on the final invoice amount."
        );
    }

    #[tokio::test]
    async fn test_rephrase_keeps_original_on_empty_reply() {
        let (_server, service) = service_replying("   ").await;
        assert_eq!(
            service
                .rephrase_special_requests(" expecting 20% discount ")
                .await,
            "expecting 20% discount"
        );
    }

    #[tokio::test]
    async fn test_rephrase_keeps_original_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let config = LlmConfig {
            base_url: server.uri(),
            ..LlmConfig::default()
        };
        let service = AiService::new(GeminiClient::new(&config, SecretString::from("k")).unwrap());

        assert_eq!(
            service
                .rephrase_special_requests("net 30 payment terms")
                .await,
            "net 30 payment terms"
        );
    }

    #[tokio::test]
    async fn test_subject_falls_back_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let config = LlmConfig {
            base_url: server.uri(),
            ..LlmConfig::default()
        };
        let service = AiService::new(GeminiClient::new(&config, SecretString::from("k")).unwrap());

        assert_eq!(
            service.generate_email_subject("laptops").await,
            FALLBACK_SUBJECT
        );
    }
}
