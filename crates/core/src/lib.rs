pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod value;

pub use config::{DecisionMode, SdkConfig};
pub use context::{VisitorContext, RESERVED_PREFIX};
pub use error::{FlagError, FlagResult};
pub use events::{ActivationEvent, ActivationSink, CaptureSink, NoOpSink};
pub use value::{FlagValue, FromFlagValue};
