pub mod conditions;
pub mod config;
pub mod error;
pub mod outputs;
pub mod pipeline;
pub mod summary;
pub mod swap;
pub mod timeline;

pub use conditions::{ConditionsError, ConditionsKey};
pub use config::{ConfigError, LayoutChoice, RunConfig, TriggerSettings};
pub use error::{PipelineError, Result};
pub use outputs::{OutputError, OutputFormat};
pub use pipeline::{process_plate, ProcessedPlate};
pub use swap::{
    SwapEvent, SwapParseError, SwapSchedule, TriggerComparison, TriggerPolicy, TriggerUnit,
};
pub use timeline::{
    reconstruct_timeline, LabeledRecord, LookupError, TimeSource, TimelineBuilder,
    TimelineError, DEFAULT_PLATE_LABEL,
};
