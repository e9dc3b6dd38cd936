//! Building module orchestrator.
//!
//! Turns a file's line metrics into a stack of tiers: total height from the
//! line count, tier count from a second breakpoint table, and one width per
//! tier from the character density of that slice of the file.

mod core;

pub use core::{
    MAX_TIERS, Tier, TierPlan, calculate_num_tiers, calculate_tier_widths, interpolate_height,
    plan_tiers, trimmed_average, width_for_average,
};
