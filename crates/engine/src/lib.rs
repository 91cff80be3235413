//! The decision engine: walks the catalog, allocates variations, and
//! maintains the process-wide active-modification table.

pub mod engine;
pub mod resolver;
pub mod table;

pub use engine::{FlagEngine, SyncOutcome};
pub use resolver::resolve_all;
pub use table::ActiveModificationTable;
