//! Reporting of case outcomes
//!
//! For every case the runner hands a reporter the two raw responses and, on
//! failure, the diff detail, then signals pass or fail.

use crate::error::{ReportError, ReportResult};
use crate::harness::RunSummary;
use parity_core::RequestPlan;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Attachment names
pub mod attachment {
    pub const PRIMARY_RESPONSE: &str = "primary_response";
    pub const SECONDARY_RESPONSE: &str = "secondary_response";
    pub const DIFF_DETAIL: &str = "diff_detail";
}

/// Receives case results from the runner
pub trait Reporter: Send {
    fn start_case(&mut self, _plan: &RequestPlan) -> ReportResult<()> {
        Ok(())
    }

    fn attach(&mut self, case_id: &str, name: &str, body: &Value) -> ReportResult<()>;

    fn case_passed(&mut self, case_id: &str) -> ReportResult<()>;

    fn case_failed(&mut self, case_id: &str, message: &str) -> ReportResult<()>;

    fn finish(&mut self, _summary: &RunSummary) -> ReportResult<()> {
        Ok(())
    }
}

/// Prints one line per case and a closing summary
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    /// Diff detail of the current case, printed on failure
    pending_diff: Option<Value>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reporter for ConsoleReporter {
    fn attach(&mut self, _case_id: &str, name: &str, body: &Value) -> ReportResult<()> {
        if name == attachment::DIFF_DETAIL {
            self.pending_diff = Some(body.clone());
        }
        Ok(())
    }

    fn case_passed(&mut self, case_id: &str) -> ReportResult<()> {
        println!("✅ {} - PASS", case_id);
        self.pending_diff = None;
        Ok(())
    }

    fn case_failed(&mut self, case_id: &str, message: &str) -> ReportResult<()> {
        println!("❌ {} - FAIL: {}", case_id, message);
        if let Some(Value::Object(groups)) = self.pending_diff.take() {
            for (category, entries) in groups {
                for entry in entries.as_array().into_iter().flatten() {
                    println!(
                        "   [{:>18}] {} : primary={} secondary={}",
                        category,
                        entry["path"].as_str().unwrap_or_default(),
                        entry.get("primary").map(Value::to_string).unwrap_or_else(|| "(missing)".into()),
                        entry.get("secondary").map(Value::to_string).unwrap_or_else(|| "(missing)".into()),
                    );
                }
            }
        }
        Ok(())
    }

    fn finish(&mut self, summary: &RunSummary) -> ReportResult<()> {
        println!();
        println!("Results: {}/{} passed", summary.passed, summary.total);
        if summary.all_passed() {
            println!("✅ All cases passed!");
        } else {
            println!("❌ {} cases failed", summary.failed.len());
        }
        Ok(())
    }
}

/// Writes `<root>/<case_id>/<attachment>.json` and `<root>/summary.json`.
///
/// Every started case gets its own directory. When a case id repeats, or two
/// ids sanitize to the same name, later cases get `-2`, `-3`, ... suffixes.
#[derive(Debug)]
pub struct DirectoryReporter {
    root: PathBuf,
    /// Directory names handed out so far
    used: HashSet<String>,
    /// Case id and directory of the case in progress
    current: Option<(String, PathBuf)>,
}

impl DirectoryReporter {
    /// Create the reporter, clearing any results of a previous run
    pub fn create(root: impl Into<PathBuf>) -> ReportResult<Self> {
        let root = root.into();
        if root.exists() {
            fs::remove_dir_all(&root).map_err(|e| write_error(&root, e))?;
        }
        fs::create_dir_all(&root).map_err(|e| write_error(&root, e))?;
        debug!("Writing case results to {:?}", root);
        Ok(Self {
            root,
            used: HashSet::new(),
            current: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of one case: the one assigned by `start_case` while that
    /// case is in progress, otherwise the plain sanitized id
    pub fn case_dir(&self, case_id: &str) -> PathBuf {
        match &self.current {
            Some((id, dir)) if id == case_id => dir.clone(),
            _ => self.root.join(sanitize(case_id)),
        }
    }

    fn claim_dir(&mut self, case_id: &str) -> PathBuf {
        let base = sanitize(case_id);
        let mut name = base.clone();
        let mut n = 1;
        while !self.used.insert(name.clone()) {
            n += 1;
            name = format!("{}-{}", base, n);
        }
        if n > 1 {
            debug!("Case {} reported under {}", case_id, name);
        }
        self.root.join(name)
    }

    fn write_json(&self, path: PathBuf, name: &str, body: &Value) -> ReportResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;
        }
        let text = serde_json::to_string_pretty(body).map_err(|e| ReportError::Serialize {
            name: name.to_string(),
            source: e,
        })?;
        fs::write(&path, text).map_err(|e| write_error(&path, e))
    }
}

impl Reporter for DirectoryReporter {
    fn start_case(&mut self, plan: &RequestPlan) -> ReportResult<()> {
        let dir = self.claim_dir(&plan.case_id);
        self.current = Some((plan.case_id.clone(), dir));
        Ok(())
    }

    fn attach(&mut self, case_id: &str, name: &str, body: &Value) -> ReportResult<()> {
        let path = self.case_dir(case_id).join(format!("{}.json", name));
        self.write_json(path, name, body)
    }

    fn case_passed(&mut self, case_id: &str) -> ReportResult<()> {
        let status = serde_json::json!({"case_id": case_id, "status": "passed"});
        self.write_json(self.case_dir(case_id).join("status.json"), "status", &status)
    }

    fn case_failed(&mut self, case_id: &str, message: &str) -> ReportResult<()> {
        let status = serde_json::json!({
            "case_id": case_id,
            "status": "failed",
            "message": message,
        });
        self.write_json(self.case_dir(case_id).join("status.json"), "status", &status)
    }

    fn finish(&mut self, summary: &RunSummary) -> ReportResult<()> {
        let body = serde_json::to_value(summary).map_err(|e| ReportError::Serialize {
            name: "summary".to_string(),
            source: e,
        })?;
        self.write_json(self.root.join("summary.json"), "summary", &body)
    }
}

/// Sends every event to each inner reporter, continuing past failures
#[derive(Default)]
pub struct FanoutReporter {
    reporters: Vec<Box<dyn Reporter>>,
}

impl FanoutReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporters.push(Box::new(reporter));
        self
    }

    fn each(
        &mut self,
        mut f: impl FnMut(&mut dyn Reporter) -> ReportResult<()>,
    ) -> ReportResult<()> {
        let mut first_error = None;
        for reporter in &mut self.reporters {
            if let Err(e) = f(reporter.as_mut()) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Reporter for FanoutReporter {
    fn start_case(&mut self, plan: &RequestPlan) -> ReportResult<()> {
        self.each(|r| r.start_case(plan))
    }

    fn attach(&mut self, case_id: &str, name: &str, body: &Value) -> ReportResult<()> {
        self.each(|r| r.attach(case_id, name, body))
    }

    fn case_passed(&mut self, case_id: &str) -> ReportResult<()> {
        self.each(|r| r.case_passed(case_id))
    }

    fn case_failed(&mut self, case_id: &str, message: &str) -> ReportResult<()> {
        self.each(|r| r.case_failed(case_id, message))
    }

    fn finish(&mut self, summary: &RunSummary) -> ReportResult<()> {
        self.each(|r| r.finish(summary))
    }
}

fn write_error(path: &Path, source: std::io::Error) -> ReportError {
    ReportError::Write {
        path: path.to_path_buf(),
        source,
    }
}

/// Case ids become directory names
fn sanitize(case_id: &str) -> String {
    case_id
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
