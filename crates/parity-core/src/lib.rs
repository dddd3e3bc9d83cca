//! Core types for API parity runs
//!
//! This crate provides the data model shared by every other parity crate:
//! [`Account`], [`EndpointDefinition`], [`RequestPlan`] and
//! [`ResponseSnapshot`], together with the two pure stages that turn the
//! tabular case catalogue into ready-to-dispatch plans:
//!
//! - account resolution ([`AccountSelection::resolve`])
//! - case expansion ([`CaseExpander::expand`])
//!
//! Nothing in here performs network or file I/O.

mod account;
mod endpoint;
mod error;
mod plan;
mod snapshot;

pub use account::{Account, AccountSelection};
pub use endpoint::{columns, EndpointDefinition, Method, ParamCell, Params};
pub use error::{ParityError, ParityResult};
pub use plan::{duplicate_case_ids, CaseExpander, Expansion, InternalMarker, RequestPlan};
pub use snapshot::ResponseSnapshot;

/// One row of a tabular source. `None` marks an empty cell.
pub type Row = Vec<Option<String>>;

/// Header name carrying the per-account bearer value
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Returns the trimmed, non-empty text of cell `index`, if any
pub fn cell(row: &Row, index: usize) -> Option<&str> {
    row.get(index)
        .and_then(|c| c.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_trims_and_skips_blank() {
        let row: Row = vec![Some("  a ".into()), Some("   ".into()), None];
        assert_eq!(cell(&row, 0), Some("a"));
        assert_eq!(cell(&row, 1), None);
        assert_eq!(cell(&row, 2), None);
        assert_eq!(cell(&row, 7), None);
    }
}
