//! Work fronts: code building, uniqueness, audited lifecycle and revert.

mod manager;
mod model;
mod revert;

pub use manager::WorkFrontManager;
pub(crate) use model::clean_segment;
pub use model::{WorkFront, WorkFrontFilter, WorkFrontInput, WorkFrontStatus};
pub use revert::{merge_revert_fields, RevertFields};
