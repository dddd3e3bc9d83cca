//! Comparison runner: dispatch, filter, diff, verdict

use crate::client::HttpTransport;
use crate::compare::{diff, DiffReport};
use crate::config::RunConfig;
use crate::dispatch::{DispatchOutcome, DualDispatcher};
use crate::error::TransportError;
use crate::remove::FieldRemover;
use crate::report::{attachment, Reporter};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use parity_core::{duplicate_case_ids, RequestPlan, ResponseSnapshot};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Outcome of comparing one case
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Pass,
    Fail { reason: String, diff: DiffReport },
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// Everything recorded for one case
#[derive(Debug, Clone)]
pub struct CaseOutcome {
    pub case_id: String,
    /// Raw snapshots, before field removal
    pub primary: ResponseSnapshot,
    pub secondary: ResponseSnapshot,
    pub verdict: Verdict,
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        self.verdict.is_pass()
    }
}

/// Totals of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    fn start() -> Self {
        let now = Utc::now();
        Self {
            total: 0,
            passed: 0,
            failed: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    fn record(&mut self, outcome: &CaseOutcome) {
        self.total += 1;
        if outcome.passed() {
            self.passed += 1;
        } else {
            self.failed.push(outcome.case_id.clone());
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Filter both snapshots with the plan's ignore list and diff them.
///
/// Any error snapshot makes the case fail, whatever the diff says.
pub fn evaluate(plan: &RequestPlan, outcome: DispatchOutcome, remover: &FieldRemover) -> CaseOutcome {
    let primary = remover.remove(&outcome.primary.to_tree(), &plan.ignore_fields);
    let secondary = remover.remove(&outcome.secondary.to_tree(), &plan.ignore_fields);
    let report = diff(&primary, &secondary);

    // A failed call never passes, even when both targets failed alike
    let call_failed = outcome.primary.is_error() || outcome.secondary.is_error();

    let verdict = if !report.is_empty() {
        Verdict::Fail {
            reason: format!("endpoint {} responses differ", plan.case_id),
            diff: report,
        }
    } else if call_failed {
        Verdict::Fail {
            reason: format!("endpoint {} request failed", plan.case_id),
            diff: report,
        }
    } else {
        Verdict::Pass
    };

    CaseOutcome {
        case_id: plan.case_id.clone(),
        primary: outcome.primary,
        secondary: outcome.secondary,
        verdict,
    }
}

/// Drives request plans through dispatch and comparison
pub struct ComparisonRunner {
    dispatcher: DualDispatcher,
    remover: FieldRemover,
    concurrency: usize,
}

impl ComparisonRunner {
    /// Create a runner processing one case at a time
    pub fn new(dispatcher: DualDispatcher) -> Self {
        Self {
            dispatcher,
            remover: FieldRemover::default(),
            concurrency: 1,
        }
    }

    /// Build the HTTP-backed runner described by `config`
    pub fn from_config(config: &RunConfig) -> Result<Self, TransportError> {
        let transport = Arc::new(HttpTransport::new(config.timeout())?);
        let dispatcher =
            DualDispatcher::new(transport, config.primary_url.clone(), config.secondary_url.clone());
        Ok(Self::new(dispatcher)
            .with_remover(FieldRemover::new(config.mismatch_policy))
            .with_concurrency(config.concurrency))
    }

    pub fn with_remover(mut self, remover: FieldRemover) -> Self {
        self.remover = remover;
        self
    }

    /// Cases in flight at once; clamped to at least one
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// One dispatch-compare cycle. No retries.
    pub async fn run_case(&self, plan: &RequestPlan) -> CaseOutcome {
        let outcome = self.dispatcher.dispatch(plan).await;
        let result = evaluate(plan, outcome, &self.remover);
        match &result.verdict {
            Verdict::Pass => info!("{} - PASS", result.case_id),
            Verdict::Fail { diff, .. } => {
                warn!("{} - FAIL ({} differences)", result.case_id, diff.len())
            }
        }
        result
    }

    /// Run every plan, reporting outcomes in plan order.
    ///
    /// A failing case never stops the run.
    pub async fn run_all(&self, plans: &[RequestPlan], reporter: &mut dyn Reporter) -> RunSummary {
        let duplicates = duplicate_case_ids(plans);
        if !duplicates.is_empty() {
            warn!("Duplicate case ids (cases still run): {}", duplicates.join(", "));
        }

        let mut summary = RunSummary::start();
        let mut outcomes = stream::iter(plans)
            .map(|plan| async move { (plan, self.run_case(plan).await) })
            .buffered(self.concurrency);

        while let Some((plan, outcome)) = outcomes.next().await {
            report_case(reporter, plan, &outcome);
            summary.record(&outcome);
        }

        summary.finished_at = Utc::now();
        if let Err(e) = reporter.finish(&summary) {
            error!("Failed to write run summary: {}", e);
        }
        summary
    }
}

fn report_case(reporter: &mut dyn Reporter, plan: &RequestPlan, outcome: &CaseOutcome) {
    let case_id = outcome.case_id.as_str();
    let mut steps = vec![
        reporter.start_case(plan),
        reporter.attach(case_id, attachment::PRIMARY_RESPONSE, &outcome.primary.to_tree()),
        reporter.attach(case_id, attachment::SECONDARY_RESPONSE, &outcome.secondary.to_tree()),
    ];
    match &outcome.verdict {
        Verdict::Pass => steps.push(reporter.case_passed(case_id)),
        Verdict::Fail { reason, diff } => {
            steps.push(reporter.attach(case_id, attachment::DIFF_DETAIL, &diff.to_json()));
            steps.push(reporter.case_failed(case_id, reason));
        }
    }
    for e in steps.into_iter().filter_map(Result::err) {
        error!("Failed to report case {}: {}", case_id, e);
    }
}
