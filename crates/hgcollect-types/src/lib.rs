// Domain types for the collection pipeline.
// Records carry raw text only; nothing here interprets hg metadata.

mod record;

pub use record::{ErrorEvent, LogRecord, RepoList, Results};
