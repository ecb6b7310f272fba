//! Typed shapes of the JSON documents exchanged with the LLM.
//!
//! The same types double as the stored payloads of the `rfps` and
//! `proposals` tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One requested line item of an RFP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfpItem {
    pub name: String,
    pub quantity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifications: Option<String>,
}

/// Structured form of a natural-language procurement request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RfpStructure {
    pub budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_per_unit: Option<f64>,
    #[serde(default)]
    pub items: Vec<RfpItem>,
    #[serde(default)]
    pub quantities: BTreeMap<String, f64>,
    pub delivery_timeline: Option<String>,
    pub payment_terms: Option<String>,
    pub warranty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl RfpStructure {
    /// Checks numeric fields the deserializer cannot constrain.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(budget) = self.budget {
            if !budget.is_finite() || budget < 0.0 {
                return Err(format!("budget must be a non-negative number, got {}", budget));
            }
        }
        for item in &self.items {
            if !item.quantity.is_finite() || item.quantity < 0.0 {
                return Err(format!(
                    "item '{}' has invalid quantity {}",
                    item.name, item.quantity
                ));
            }
        }
        Ok(())
    }
}

/// One priced line of a vendor proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalItem {
    pub name: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub total_price: Option<f64>,
}

/// Fields extracted from a vendor's reply email.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredProposal {
    pub price: Option<f64>,
    #[serde(default)]
    pub items: Vec<ProposalItem>,
    pub delivery_days: Option<f64>,
    pub warranty: Option<String>,
    pub notes: Option<String>,
    /// 0-100 heuristic of how many expected fields the reply covered.
    #[serde(default)]
    pub completeness: Option<f64>,
}

impl StructuredProposal {
    /// Enforces the 0-100 completeness range.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(completeness) = self.completeness {
            if !(0.0..=100.0).contains(&completeness) {
                return Err(format!(
                    "completeness must be within 0..=100, got {}",
                    completeness
                ));
            }
        }
        Ok(())
    }
}

/// A proposal as handed to the comparison prompt.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonInput {
    pub id: String,
    #[serde(rename = "vendorId")]
    pub vendor_id: String,
    #[serde(rename = "vendorName")]
    pub vendor_name: String,
    #[serde(rename = "vendorEmail")]
    pub vendor_email: String,
    pub structured_proposal: StructuredProposal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorScore {
    pub score: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub vendor_id: String,
    pub reason: String,
}

/// Ranked comparison of all proposals for one RFP, keyed by vendor id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub summary: String,
    #[serde(default)]
    pub scores: BTreeMap<String, VendorScore>,
    pub recommended_vendor: Option<Recommendation>,
}

impl ComparisonResult {
    /// Result reported when an RFP has no proposals yet.
    pub fn empty() -> Self {
        Self {
            summary: "No proposals found for this RFP".to_string(),
            scores: BTreeMap::new(),
            recommended_vendor: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for (vendor_id, score) in &self.scores {
            if !(0.0..=100.0).contains(&score.score) {
                return Err(format!(
                    "score for vendor '{}' must be within 0..=100, got {}",
                    vendor_id, score.score
                ));
            }
        }
        Ok(())
    }
}
