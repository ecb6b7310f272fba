//! Fixed prompt texts sent to the LLM.

pub const PARSE_PROPOSAL_PROMPT: &str = r#"You extract structured proposal data from a vendor's reply to a Request for Proposal.

Read the email body and report:
- price: total quoted price as a number, or null
- items: every quoted item as {"name", "quantity", "unit_price", "total_price"} (prices may be null)
- delivery_days: days until delivery as a number, or null
- warranty: warranty terms as text, or null
- notes: any other conditions or remarks, or null
- completeness: 0-100, awarding 30 for pricing, 30 for covering the requested items,
  20 for a delivery timeline, 10 for warranty and 10 for further detail

Amounts written with regional digit grouping (for example 1,40,500) are plain numbers (140500).
Use null for anything the email does not state. Respond with a single JSON object:
{"price": number|null, "items": [...], "delivery_days": number|null, "warranty": string|null, "notes": string|null, "completeness": number}"#;

pub const COMPARE_PROPOSALS_PROMPT: &str = r#"You compare vendor proposals received for one Request for Proposal.

Score every proposal from 0 to 100:
- price, up to 30 (lowest valid price scores highest, missing price scores low)
- delivery, up to 20 (fastest scores highest, missing timeline scores low)
- warranty, up to 15
- completeness, up to 20 (from structured_proposal.completeness)
- additional value such as discounts, payment flexibility or included services, up to 15

Key the scores by the vendorId given in the input and recommend exactly one vendor.
Respond with a single JSON object and nothing else:
{"summary": string, "scores": {"<vendorId>": {"score": number, "reasoning": string}}, "recommended_vendor": {"vendor_id": string, "reason": string}}"#;

pub const GENERATE_RFP_PROMPT: &str = r#"You turn a natural-language procurement request into a structured RFP.

Report budget (number or null), budget_currency (ISO code inferred from symbols, or null),
budget_per_unit (number or null), items as {"name", "quantity", "specifications"} with
professional wording, quantities (item name to quantity), delivery_timeline, payment_terms,
warranty, special_requests and category (a short product or service family, e.g. "Laptops").
Leave fields null when the description is too vague to determine them.
Respond with a single JSON object and nothing else."#;

pub const GENERATE_EMAIL_SUBJECT_PROMPT: &str = r#"Write a short professional email subject (at most 60 characters) for an RFP email
in the form "RFP for <main item or service>", e.g. "RFP for Office Chairs".
Respond with the subject line only, without quotes."#;

pub const REPHRASE_SPECIAL_REQUESTS_PROMPT: &str = r#"Rewrite a buyer's special requests so they read well in a formal RFP email sent to vendors.

Keep every requirement and figure exactly as given. Turn shorthand into complete, polite
sentences addressed to the vendor; do not add new conditions or commentary.
Example: "expecting 20% discount" becomes
"We are expecting a discount of 20% on the final invoice amount."
Respond with the rewritten text only, without quotes or headings."#;
