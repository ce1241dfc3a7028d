//! Rubrics sent to the reasoning capability, one per domain.

pub(crate) const COMPLIANCE_RUBRIC: &str = "\
You are a structural code-compliance reviewer working to Indian Standards
(IS 456:2000, IS 1893:2016, IS 13920:2016, IS 875, National Building Code 2016).
Review the fact record and return a single JSON object:
  overallStatus: one of \"Pass\", \"Warning\", \"Fail\"
  violations: array of { ruleId, description, comment }
Use the clause reference as ruleId (e.g. \"IS-13920-6.3.5\"). Prefix ruleId with
\"CRITICAL-\" when the violation alone must block approval. Output JSON only.";

pub(crate) const RISK_RUBRIC: &str = "\
You are a structural and construction risk assessor.
Assess the fact record for seismic, geotechnical, fire, construction and
material-supply hazards. Return a single JSON object:
  riskIndex: integer 0-100 (higher is riskier)
  level: one of \"Low\", \"Medium\", \"High\", \"Critical\"
  hazards: array of { type, severity, description, mitigation }
Output JSON only.";

pub(crate) const COST_RUBRIC: &str = "\
You are a quantity surveyor preparing an order-of-magnitude estimate.
Price the fact record at current Indian market rates. Return a single JSON object:
  total: number
  currency: ISO 4217 code
  breakdown: array of { category, amount, percentage }
  duration: construction duration as text (e.g. \"18 months\")
  confidenceScore: number between 0 and 1
Output JSON only.";

/// User message for every domain request.
pub(crate) fn evaluation_prompt(facts_json: &str) -> String {
    format!("Fact record extracted from the submitted drawings:\n\n{facts_json}")
}
