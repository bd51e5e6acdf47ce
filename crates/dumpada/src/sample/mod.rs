//! Sample records ("dumpadas"): registration, lab completion and listing.

mod manager;
mod model;

pub use manager::SampleManager;
pub use model::{
    CodePreview, LabResults, NewSample, SampleFilter, SampleRecord, SampleStatus, SampleUpdate,
    Shift, StatusPolicy,
};
