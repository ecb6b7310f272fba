//! Vendor proposals: creation from correlated replies, manual edits and
//! LLM comparison.

pub mod builder;
pub mod comparison;
pub mod error;

pub use builder::ProposalBuilder;
pub use comparison::compare_proposals;
pub use error::ProposalError;
