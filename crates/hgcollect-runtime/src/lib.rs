// Collection scheduling: fans per-repository pipelines out over a bounded
// worker pool and aggregates the run outcome.

mod collector;
mod discovery;
mod pool;

pub use collector::{CollectProgress, Collector, Obtain, Persist, RunSummary};
pub use discovery::discover_repos;
pub use pool::WorkerPool;
