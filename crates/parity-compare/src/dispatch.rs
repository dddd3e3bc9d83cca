//! Dual dispatch: one plan, both targets

use crate::client::{OutboundRequest, Transport};
use crate::error::TransportError;
use parity_core::{Params, RequestPlan, ResponseSnapshot};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Which of the two backends a call went to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The legacy system
    Primary,
    /// The replacement system
    Secondary,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Primary => write!(f, "primary"),
            Side::Secondary => write!(f, "secondary"),
        }
    }
}

/// Both snapshots of one plan
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub primary: ResponseSnapshot,
    pub secondary: ResponseSnapshot,
}

/// Issues each plan against the primary and the secondary target
#[derive(Clone)]
pub struct DualDispatcher {
    transport: Arc<dyn Transport>,
    primary_base_url: String,
    secondary_base_url: String,
}

impl DualDispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        primary_base_url: impl Into<String>,
        secondary_base_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            primary_base_url: primary_base_url.into(),
            secondary_base_url: secondary_base_url.into(),
        }
    }

    /// Full URL of `path` on one target: plain concatenation, no templating
    pub fn url(&self, side: Side, path: &str) -> String {
        let base = match side {
            Side::Primary => &self.primary_base_url,
            Side::Secondary => &self.secondary_base_url,
        };
        format!("{}{}", base, path)
    }

    /// Call both targets concurrently and wait for both.
    ///
    /// Never fails: transport problems come back as error snapshots, and a
    /// failure on one side does not affect the other.
    pub async fn dispatch(&self, plan: &RequestPlan) -> DispatchOutcome {
        let (primary, secondary) = tokio::join!(
            self.call(Side::Primary, plan, &plan.primary_params),
            self.call(Side::Secondary, plan, &plan.secondary_params),
        );
        DispatchOutcome { primary, secondary }
    }

    async fn call(&self, side: Side, plan: &RequestPlan, params: &Params) -> ResponseSnapshot {
        if !plan.method.is_supported() {
            let error = TransportError::UnsupportedMethod {
                method: plan.method.to_string(),
            };
            warn!("{} [{}]: {}", plan.case_id, side, error);
            return ResponseSnapshot::error(error);
        }

        let request = OutboundRequest {
            method: plan.method.clone(),
            url: self.url(side, &plan.path),
            headers: plan.headers.clone(),
            params: params.clone(),
        };

        match self.transport.send(&request).await {
            Ok(body) => {
                debug!("{} [{}]: response received", plan.case_id, side);
                ResponseSnapshot::Parsed(body)
            }
            Err(error) => {
                warn!("{} [{}] {} failed: {}", plan.case_id, side, request.url, error);
                ResponseSnapshot::error(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parity_core::{Account, CaseExpander, EndpointDefinition, Method};
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Answers from a fixed table keyed by URL and records every request
    #[derive(Default)]
    struct TableTransport {
        answers: Vec<(String, Value)>,
        seen: Mutex<Vec<OutboundRequest>>,
    }

    #[async_trait]
    impl Transport for TableTransport {
        async fn send(&self, request: &OutboundRequest) -> Result<Value, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            self.answers
                .iter()
                .find(|(url, _)| *url == request.url)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| TransportError::InvalidBody {
                    status: 502,
                    reason: "expected value at line 1 column 1".into(),
                })
        }
    }

    fn plan(endpoint: EndpointDefinition) -> RequestPlan {
        CaseExpander::new("Bearer ")
            .expand(&[endpoint], &[Account::from("492")])
            .plans
            .remove(0)
    }

    #[tokio::test]
    async fn test_dispatch_both_targets() {
        let transport = Arc::new(TableTransport {
            answers: vec![
                ("http://legacy/v1/x".into(), json!({"from": "legacy"})),
                ("http://new/api/v1/x".into(), json!({"from": "new"})),
            ],
            ..Default::default()
        });
        let dispatcher = DualDispatcher::new(transport.clone(), "http://legacy", "http://new/api");

        let endpoint = EndpointDefinition::new("x", "/v1/x")
            .with_target_params(json!({"page": 1}), json!({"pageNo": 1}));
        let outcome = dispatcher.dispatch(&plan(endpoint)).await;

        assert_eq!(outcome.primary, ResponseSnapshot::Parsed(json!({"from": "legacy"})));
        assert_eq!(outcome.secondary, ResponseSnapshot::Parsed(json!({"from": "new"})));

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        let legacy = seen.iter().find(|r| r.url == "http://legacy/v1/x").unwrap();
        assert_eq!(Value::Object(legacy.params.clone()), json!({"page": 1}));
        assert_eq!(legacy.headers["Authorization"], "Bearer 492");
        let new = seen.iter().find(|r| r.url == "http://new/api/v1/x").unwrap();
        assert_eq!(Value::Object(new.params.clone()), json!({"pageNo": 1}));
    }

    #[tokio::test]
    async fn test_one_side_failure_is_contained() {
        let transport = Arc::new(TableTransport {
            answers: vec![("http://legacy/v1/x".into(), json!({"ok": true}))],
            ..Default::default()
        });
        let dispatcher = DualDispatcher::new(transport.clone(), "http://legacy", "http://new");

        let outcome = dispatcher
            .dispatch(&plan(EndpointDefinition::new("x", "/v1/x")))
            .await;

        assert_eq!(outcome.primary, ResponseSnapshot::Parsed(json!({"ok": true})));
        match &outcome.secondary {
            ResponseSnapshot::Error(message) => assert!(message.contains("not JSON")),
            other => panic!("expected error snapshot, got {:?}", other),
        }
        assert_eq!(transport.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unsupported_method_never_reaches_transport() {
        let transport = Arc::new(TableTransport::default());
        let dispatcher = DualDispatcher::new(transport.clone(), "http://a", "http://b");

        let endpoint =
            EndpointDefinition::new("x", "/v1/x").with_method(Method::Other("PATCH".into()));
        let outcome = dispatcher.dispatch(&plan(endpoint)).await;

        assert!(outcome.primary.is_error());
        assert_eq!(outcome.primary, outcome.secondary);
        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_url_is_literal_concatenation() {
        let dispatcher =
            DualDispatcher::new(Arc::new(TableTransport::default()), "http://a/", "http://b");
        assert_eq!(dispatcher.url(Side::Primary, "/x"), "http://a//x");
        assert_eq!(dispatcher.url(Side::Secondary, "x?y=1"), "http://bx?y=1");
    }
}
