//! Request plans and case expansion
//!
//! Every (endpoint, account) pair becomes one [`RequestPlan`]. Expansion is
//! endpoint-major, so cases of one endpoint stay together in the run order.

use crate::account::Account;
use crate::endpoint::{EndpointDefinition, Method, Params};
use crate::error::ParityError;
use crate::AUTHORIZATION_HEADER;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Fixed header telling both targets the call is internal traffic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalMarker {
    pub header: String,
    pub value: String,
}

impl Default for InternalMarker {
    fn default() -> Self {
        Self {
            header: "X-Internal-Call".to_string(),
            value: "DELAY".to_string(),
        }
    }
}

/// A fully resolved, ready-to-dispatch test case
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestPlan {
    /// Endpoint name plus account suffix
    pub case_id: String,
    pub endpoint: String,
    pub account: Account,
    pub method: Method,
    pub headers: BTreeMap<String, String>,
    pub path: String,
    pub primary_params: Params,
    pub secondary_params: Params,
    pub ignore_fields: Vec<String>,
}

/// Output of [`CaseExpander::expand`]
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    pub plans: Vec<RequestPlan>,
    /// Recovered catalogue problems, one per malformed cell
    pub warnings: Vec<ParityError>,
}

/// Turns endpoint definitions and accounts into request plans
#[derive(Debug, Clone)]
pub struct CaseExpander {
    token_prefix: String,
    marker: InternalMarker,
}

impl CaseExpander {
    /// Create an expander for one environment's token prefix
    pub fn new(token_prefix: impl Into<String>) -> Self {
        Self {
            token_prefix: token_prefix.into(),
            marker: InternalMarker::default(),
        }
    }

    pub fn with_marker(mut self, marker: InternalMarker) -> Self {
        self.marker = marker;
        self
    }

    /// Build the cross product of `endpoints` and `accounts`.
    ///
    /// Pure and deterministic: the same inputs always give the same plans.
    pub fn expand(&self, endpoints: &[EndpointDefinition], accounts: &[Account]) -> Expansion {
        let mut expansion = Expansion {
            plans: Vec::with_capacity(endpoints.len() * accounts.len()),
            warnings: Vec::new(),
        };

        for endpoint in endpoints {
            for warning in endpoint.parse_warnings() {
                warn!("{}, using an empty mapping", warning);
                expansion.warnings.push(warning);
            }

            let base_headers = endpoint.headers();
            let (primary_params, secondary_params) = endpoint.effective_params();

            for account in accounts {
                expansion.plans.push(RequestPlan {
                    case_id: format!("{}_acc{}", endpoint.name, account),
                    endpoint: endpoint.name.clone(),
                    account: account.clone(),
                    method: endpoint.method.clone(),
                    headers: self.headers_for(&base_headers, account),
                    path: endpoint.path.clone(),
                    primary_params: primary_params.clone(),
                    secondary_params: secondary_params.clone(),
                    ignore_fields: endpoint.ignore_fields.clone(),
                });
            }
        }

        debug!(
            "Expanded {} endpoints x {} accounts into {} cases",
            endpoints.len(),
            accounts.len(),
            expansion.plans.len()
        );
        expansion
    }

    /// Base headers plus the injected ones. Injected entries replace base
    /// entries of the same name, compared case-insensitively.
    fn headers_for(
        &self,
        base: &BTreeMap<String, String>,
        account: &Account,
    ) -> BTreeMap<String, String> {
        let mut headers: BTreeMap<String, String> = base
            .iter()
            .filter(|(k, _)| {
                !k.eq_ignore_ascii_case(AUTHORIZATION_HEADER)
                    && !k.eq_ignore_ascii_case(&self.marker.header)
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        headers.insert(
            AUTHORIZATION_HEADER.to_string(),
            format!("{}{}", self.token_prefix, account),
        );
        headers.insert(self.marker.header.clone(), self.marker.value.clone());
        headers
    }
}

/// Case ids that occur more than once, in first-seen order
pub fn duplicate_case_ids(plans: &[RequestPlan]) -> Vec<&str> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut duplicates = Vec::new();
    for plan in plans {
        let count = seen.entry(plan.case_id.as_str()).or_default();
        *count += 1;
        if *count == 2 {
            duplicates.push(plan.case_id.as_str());
        }
    }
    duplicates
}
