//! Advisory ranking backend.
//!
//! Before each stage the scheduler may consult a [`PriorityOracle`]
//! with the stage's queue and candidate drivers. The oracle answers
//! with ranked pairing proposals. Advice is strictly advisory:
//!
//! - every proposal is re-screened against the hard constraints at
//!   commit time; an infeasible proposal is dropped without a trace
//! - proposals naming ids outside the stage are ignored
//! - a slow, failing, or malformed oracle degrades the stage to the
//!   deterministic ordering and the run records a notice
//!
//! The wire schema is strict JSON. Because typical backends wrap JSON
//! in markdown code fences, [`parse_response_json`] strips one fence
//! pair before deserializing; everything else is rejected.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::StrategyMode;
use crate::models::{CapabilitySet, TimeWindow};

/// Ranking consultation failures. All of them degrade the stage; none
/// abort the run.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The backend missed the configured deadline.
    #[error("oracle timed out")]
    Timeout,
    /// The backend could not be reached or refused the request.
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
    /// The response was not valid against the schema.
    #[error("oracle response malformed: {0}")]
    Malformed(String),
}

/// One stage's consultation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleRequest {
    /// Name of the tier being processed.
    pub tier: String,
    /// Risk posture the caller wants the ranking to take.
    pub strategy: StrategyMode,
    /// The stage's queue, already tie-broken.
    pub orders: Vec<OracleOrder>,
    /// Candidate drivers for the stage.
    pub drivers: Vec<OracleDriver>,
}

/// Order facts exposed to the oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleOrder {
    pub id: String,
    pub region: String,
    pub party_size: u32,
    pub required: CapabilitySet,
    pub window: TimeWindow,
    /// Drivers currently feasible for this order, precomputed so the
    /// oracle never has to re-derive constraints.
    pub feasible_drivers: Vec<String>,
}

/// Driver facts exposed to the oracle, including live load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleDriver {
    pub id: String,
    pub preferred_region: String,
    pub capabilities: CapabilitySet,
    /// Orders already committed this run.
    pub load: u32,
    pub max_orders: u32,
}

/// The oracle's answer: proposals in descending priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OracleResponse {
    pub proposals: Vec<OracleProposal>,
}

/// One suggested pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OracleProposal {
    pub order_id: String,
    pub driver_id: String,
    /// Free-form justification, carried into the assignment when the
    /// proposal survives re-screening.
    #[serde(default)]
    pub rationale: String,
}

/// Ranks pairings for one stage.
///
/// Implementations must be safe to call concurrently. The scheduler
/// enforces the deadline around this call, so implementations need not
/// time themselves.
#[async_trait]
pub trait PriorityOracle: Send + Sync {
    async fn propose(&self, request: &OracleRequest) -> Result<OracleResponse, OracleError>;
}

/// Deserializes an oracle response, tolerating one markdown code fence.
///
/// Accepts the raw JSON object, or the same wrapped in ` ```json ... ``` `
/// or plain ` ``` ... ``` ` fences. Anything else is [`OracleError::Malformed`].
pub fn parse_response_json(raw: &str) -> Result<OracleResponse, OracleError> {
    let body = strip_fence(raw)?;
    serde_json::from_str(body).map_err(|e| OracleError::Malformed(e.to_string()))
}

/// A fence must open the payload, and nothing may follow its closer.
fn strip_fence(raw: &str) -> Result<&str, OracleError> {
    let trimmed = raw.trim();
    for opener in ["```json", "```"] {
        if let Some(rest) = trimmed.strip_prefix(opener) {
            let inner = match rest.find("```") {
                Some(at) => {
                    if !rest[at + 3..].trim().is_empty() {
                        return Err(OracleError::Malformed(
                            "text after closing fence".to_string(),
                        ));
                    }
                    &rest[..at]
                }
                None => rest,
            };
            return Ok(inner.trim());
        }
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Capability;

    #[test]
    fn test_parse_bare_json() {
        let raw = r#"{"proposals":[{"order_id":"Q1","driver_id":"D2","rationale":"best fit"}]}"#;
        let response = parse_response_json(raw).unwrap();
        assert_eq!(response.proposals.len(), 1);
        assert_eq!(response.proposals[0].order_id, "Q1");
        assert_eq!(response.proposals[0].driver_id, "D2");
        assert_eq!(response.proposals[0].rationale, "best fit");
    }

    #[test]
    fn test_parse_json_fence() {
        let raw = "```json\n{\"proposals\":[{\"order_id\":\"Q1\",\"driver_id\":\"D1\"}]}\n```";
        let response = parse_response_json(raw).unwrap();
        assert_eq!(response.proposals[0].rationale, "");
    }

    #[test]
    fn test_parse_anonymous_fence() {
        let raw = "```\n{\"proposals\":[]}\n```";
        let response = parse_response_json(raw).unwrap();
        assert!(response.proposals.is_empty());
    }

    #[test]
    fn test_parse_fence_with_prose_around_it() {
        let raw = "Here is the ranking:\n```json\n{\"proposals\":[]}\n```\nHope this helps!";
        // prose before the fence is not tolerated
        assert!(matches!(
            parse_response_json(raw),
            Err(OracleError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_prose_after_closing_fence() {
        let raw = "```json\n{\"proposals\":[]}\n```\nHope this helps!";
        assert!(matches!(
            parse_response_json(raw),
            Err(OracleError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_unterminated_fence() {
        let raw = "```json\n{\"proposals\":[]}";
        let response = parse_response_json(raw).unwrap();
        assert!(response.proposals.is_empty());
    }

    #[test]
    fn test_parse_rejects_unknown_fields() {
        let raw = r#"{"proposals":[],"confidence":0.9}"#;
        assert!(matches!(
            parse_response_json(raw),
            Err(OracleError::Malformed(_))
        ));

        let raw = r#"{"proposals":[{"order_id":"Q1","driver_id":"D1","score":3}]}"#;
        assert!(matches!(
            parse_response_json(raw),
            Err(OracleError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_missing_ids() {
        let raw = r#"{"proposals":[{"order_id":"Q1"}]}"#;
        assert!(matches!(
            parse_response_json(raw),
            Err(OracleError::Malformed(_))
        ));
    }

    #[test]
    fn test_request_wire_shape() {
        let request = OracleRequest {
            tier: "wedding".into(),
            strategy: StrategyMode::Conservative,
            orders: vec![OracleOrder {
                id: "Q1".into(),
                region: "east".into(),
                party_size: 4,
                required: CapabilitySet::of(Capability::Wedding),
                window: TimeWindow::new(0, 3_600_000),
                feasible_drivers: vec!["D1".into()],
            }],
            drivers: vec![OracleDriver {
                id: "D1".into(),
                preferred_region: "east".into(),
                capabilities: CapabilitySet::of(Capability::Wedding),
                load: 1,
                max_orders: 3,
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["tier"], "wedding");
        assert_eq!(json["strategy"], "conservative");
        assert_eq!(json["orders"][0]["required"][0], "wedding");
        assert_eq!(json["orders"][0]["feasible_drivers"][0], "D1");
        assert_eq!(json["drivers"][0]["load"], 1);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(OracleError::Timeout.to_string(), "oracle timed out");
        assert_eq!(
            OracleError::Unavailable("connection refused".into()).to_string(),
            "oracle unavailable: connection refused"
        );
    }
}
