use std::path::Path;

use hgcollect_types::{ErrorEvent, Results};

use crate::parser::parse_log;
use crate::{HgClient, Result};

/// Source of raw log text for one repository.
///
/// Seam between the collection pipeline and the hg subprocess, so the
/// pipeline can be exercised without spawning processes.
pub trait QueryLogs {
    fn query_logs(&self, repo: &Path) -> Result<String>;
}

impl QueryLogs for HgClient {
    fn query_logs(&self, repo: &Path) -> Result<String> {
        HgClient::query_logs(self, repo)
    }
}

/// Composes the invoker and the parser into a non-failing obtain step.
pub struct LogReader<Q> {
    source: Q,
}

impl<Q: QueryLogs> LogReader<Q> {
    pub fn new(source: Q) -> Self {
        Self { source }
    }

    /// Collect and parse the history of one repository.
    ///
    /// Never fails: an invocation error is folded into the returned
    /// `Results` as a single `ErrorEvent`, and parsing proceeds on empty
    /// text, so an unqueryable repository still yields a well-formed
    /// aggregate with one error and zero records.
    pub fn obtain(&self, repo: &Path) -> Results {
        match self.source.query_logs(repo) {
            Ok(raw) => parse_log(&raw, repo),
            Err(err) => {
                let mut results = parse_log("", repo);
                results.events.push(ErrorEvent::capture(err.to_string(), repo));
                results
            }
        }
    }
}
