// Mercurial access layer: subprocess invocation, wire-format parsing, and
// the non-failing obtain step that composes the two.

mod error;
mod invoker;
mod parser;
mod reader;

pub use error::{Error, Result};
pub use invoker::HgClient;
pub use parser::parse_log;
pub use reader::{LogReader, QueryLogs};
