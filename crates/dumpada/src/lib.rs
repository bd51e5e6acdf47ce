pub mod actor;
pub mod app;
pub mod audit;
pub mod codes;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod front_type;
pub mod ranges;
mod retry;
pub mod sample;
pub mod telemetry;
pub mod validation;
pub mod work_front;

pub use actor::{Actor, DEFAULT_ACTOR};
pub use app::Dumpada;
pub use audit::{AuditAction, AuditEntry, FieldDiff, HistoryItem, SnapshotField, SnapshotValue};
pub use codes::{build_front_code, build_sample_code};
pub use config::{load_config, load_config_from_str, Config, LoggingConfig};
pub use db::{Database, DatabaseError};
pub use error::{ConfigError, DumpadaError, ErrorKind, Result, ServiceError};
pub use front_type::{FrontType, FrontTypeInput, FrontTypeManager};
pub use ranges::{CoverageIssue, RangeBand, RangeTable};
pub use sample::{
    CodePreview, NewSample, SampleFilter, SampleManager, SampleRecord, SampleStatus, SampleUpdate,
    Shift, StatusPolicy,
};
pub use telemetry::{init_logging, TelemetryError};
pub use work_front::{WorkFront, WorkFrontFilter, WorkFrontInput, WorkFrontManager, WorkFrontStatus};
