//! Settings model: values, schema validation, and immutable snapshots

pub mod schema;
pub mod snapshot;
pub mod value;

pub use schema::{Checked, Schema, SettingKind, SettingSpec};
pub use snapshot::Snapshot;
pub use value::SettingValue;
