use serde::Serialize;

/// Upper bound on the number of stacked tiers for a single file.
pub const MAX_TIERS: usize = 10;

/// Maximum building height, reached at the last breakpoint.
const MAX_HEIGHT: f64 = 100.0;

/// `(lines_of_code, height)` breakpoints. Slopes shrink from one segment to
/// the next so large files keep growing but ever more slowly.
const HEIGHT_BREAKPOINTS: [(u64, f64); 11] = [
    (0, 2.0),
    (50, 12.0),
    (100, 20.0),
    (200, 32.0),
    (400, 46.0),
    (700, 58.0),
    (1000, 66.0),
    (1500, 75.0),
    (2500, 84.0),
    (4000, 92.0),
    (6000, MAX_HEIGHT),
];

/// Inclusive line-count ceilings for 1..=9 tiers; anything larger gets [`MAX_TIERS`].
const TIER_BREAKPOINTS: [u64; 9] = [50, 100, 200, 400, 700, 1000, 1500, 2500, 4000];

/// Average characters per world unit of building width.
const CHARS_PER_WIDTH_UNIT: f64 = 3.0;

/// Average line length assumed when a file carries no per-line data.
const DEFAULT_AVG_LINE_LENGTH: f64 = 40.0;

/// Total building height for a file, linearly interpolated between breakpoints.
pub fn interpolate_height(lines_of_code: u64) -> f64 {
    let mut previous = HEIGHT_BREAKPOINTS[0];
    for point in HEIGHT_BREAKPOINTS.iter().skip(1) {
        if lines_of_code <= point.0 {
            let span = (point.0 - previous.0) as f64;
            let t = (lines_of_code - previous.0) as f64 / span;
            return previous.1 + (point.1 - previous.1) * t;
        }
        previous = *point;
    }
    MAX_HEIGHT
}

pub fn calculate_num_tiers(lines_of_code: u64) -> usize {
    TIER_BREAKPOINTS
        .iter()
        .position(|ceiling| lines_of_code <= *ceiling)
        .map(|idx| idx + 1)
        .unwrap_or(MAX_TIERS)
}

/// Mean after discarding the lowest and highest 10% of values.
///
/// Fewer than ten values are averaged untrimmed; no values yields the default
/// line length.
pub fn trimmed_average(values: &[u32]) -> f64 {
    if values.is_empty() {
        return DEFAULT_AVG_LINE_LENGTH;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let trim = sorted.len() / 10;
    let kept = &sorted[trim..sorted.len() - trim];
    kept.iter().map(|v| *v as f64).sum::<f64>() / kept.len() as f64
}

/// Maps an average line length onto a tier width. The flag reports whether the
/// raw value was degenerate (non-positive or not finite) and had to be clamped.
pub fn width_for_average(avg_line_length: f64, min_width: f64, max_width: f64) -> (f64, bool) {
    let raw = avg_line_length / CHARS_PER_WIDTH_UNIT;
    if !raw.is_finite() || raw <= 0.0 {
        return (min_width, true);
    }
    (raw.clamp(min_width, max_width), false)
}

/// One width per tier, bottom tier first.
///
/// `line_lengths` is split into `num_tiers` contiguous chunks (the last one
/// absorbs the remainder). Chunks left empty because the file has fewer lines
/// than tiers fall back to the file-wide mean; a file with no per-line data
/// uses `fallback_avg` for every tier.
pub fn calculate_tier_widths(
    line_lengths: &[u32],
    num_tiers: usize,
    fallback_avg: f64,
    min_width: f64,
    max_width: f64,
) -> Vec<f64> {
    let num_tiers = num_tiers.max(1);
    if line_lengths.is_empty() {
        let (width, _) = width_for_average(fallback_avg, min_width, max_width);
        return vec![width; num_tiers];
    }

    let overall = mean(line_lengths);
    let n = line_lengths.len();
    (0..num_tiers)
        .map(|tier| {
            let start = tier * n / num_tiers;
            let end = if tier + 1 == num_tiers {
                n
            } else {
                (tier + 1) * n / num_tiers
            };
            let avg = if start < end {
                mean(&line_lengths[start..end])
            } else {
                overall
            };
            width_for_average(avg, min_width, max_width).0
        })
        .collect()
}

fn mean(values: &[u32]) -> f64 {
    values.iter().map(|v| *v as f64).sum::<f64>() / values.len() as f64
}

/// One stacked sub-volume of a building.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tier {
    pub index: usize,
    pub width: f64,
    pub base_height: f64,
    pub top_height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TierPlan {
    pub tiers: Vec<Tier>,
    pub total_height: f64,
    /// Set when a width had to be clamped up from a non-positive value.
    pub degenerate_width: bool,
}

/// Full tier stack for a file. Tier boundaries are shared, so each tier's top
/// is exactly the next tier's base and the last top equals the total height.
pub fn plan_tiers(
    lines_of_code: u64,
    line_lengths: &[u32],
    avg_line_length: f64,
    min_width: f64,
    max_width: f64,
) -> TierPlan {
    let num_tiers = calculate_num_tiers(lines_of_code);
    let total_height = interpolate_height(lines_of_code);
    let widths = calculate_tier_widths(
        line_lengths,
        num_tiers,
        avg_line_length,
        min_width,
        max_width,
    );

    let degenerate_width = if line_lengths.is_empty() {
        width_for_average(avg_line_length, min_width, max_width).1
    } else {
        line_lengths.iter().all(|len| *len == 0)
    };

    let boundary = |k: usize| {
        if k == num_tiers {
            total_height
        } else {
            total_height * k as f64 / num_tiers as f64
        }
    };
    let tiers = widths
        .into_iter()
        .enumerate()
        .map(|(index, width)| Tier {
            index,
            width,
            base_height: boundary(index),
            top_height: boundary(index + 1),
        })
        .collect();

    TierPlan {
        tiers,
        total_height,
        degenerate_width,
    }
}
