//! API parity comparison library
//!
//! Issues the same request plan against a legacy (primary) and a replacement
//! (secondary) backend and checks that both answer with structurally equal
//! JSON once the plan's ignored fields are removed.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐      ┌─────────────────┐
//! │  Primary        │      │  Secondary      │
//! │  (legacy)       │      │  (replacement)  │
//! └────────┬────────┘      └────────┬────────┘
//!          │   DualDispatcher       │
//!          └──────────┬─────────────┘
//!                     │
//!         ┌───────────▼───────────┐
//!         │ FieldRemover -> diff  │
//!         │   ComparisonRunner    │
//!         └───────────┬───────────┘
//!                     │
//!               ┌─────▼─────┐
//!               │  Reporter │
//!               └───────────┘
//! ```

pub mod client;
pub mod compare;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod harness;
pub mod remove;
pub mod report;

pub use client::{HttpTransport, OutboundRequest, Transport};
pub use compare::{diff, DiffCategory, DiffReport, Difference};
pub use config::RunConfig;
pub use dispatch::{DispatchOutcome, DualDispatcher, Side};
pub use error::{ReportError, TransportError};
pub use harness::{CaseOutcome, ComparisonRunner, RunSummary, Verdict};
pub use remove::{remove_fields, FieldRemover, MismatchPolicy};
pub use report::{ConsoleReporter, DirectoryReporter, FanoutReporter, Reporter};
