//! Error module orchestrator.
//!
//! Hard failures live in [`LayoutError`]; anomalies the engine absorbs and
//! reports alongside a successful layout live in [`LayoutWarning`].

mod types;

pub use types::{LayoutError, LayoutWarning, Result};
