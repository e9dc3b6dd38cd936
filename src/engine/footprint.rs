//! Bottom-up footprint planning.
//!
//! Every folder street runs along +x. Slots sit two cells apart, starting two
//! cells from the street start; a slot's file (if any) takes one side of the
//! road and its subfolder branch (if any) the other. Buildings are one cell
//! wide and two cells deep, so each street owns a five-row band: the road plus
//! two rows on either side.
//!
//! Every subfolder subtree sits just outside that band, so all children on
//! one side share the same rows. A branch is pushed along the street until it
//! clears the previous subtree on its side; the subtree never extends left of
//! its own branch column, so each straight connector runs through free cells.

use crate::geometry::{GridPos, GridRect};
use crate::tree::FolderNode;

/// Rows between a street and the first row of a neighbouring subtree.
pub const BAND_CLEARANCE: i32 = 3;

/// Rows of the building band on each side of a street.
pub const BAND_HALF_HEIGHT: i32 = 2;

/// Which side of a horizontal street something sits on. `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Up,
    Down,
}

impl Side {
    pub fn sign(self) -> i32 {
        match self {
            Side::Up => -1,
            Side::Down => 1,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Up => Side::Down,
            Side::Down => Side::Up,
        }
    }

    /// Side of the `k`th subfolder branch for a folder that itself sits on
    /// `arrival` relative to its parent. The first branch goes back the other way.
    pub fn for_subfolder(arrival: Side, k: usize) -> Side {
        if k % 2 == 0 { arrival.opposite() } else { arrival }
    }

    /// Files take the side their slot's branch does not.
    pub fn for_file(arrival: Side, k: usize) -> Side {
        Side::for_subfolder(arrival, k).opposite()
    }
}

/// Offset of the first slot from the street start.
pub const FIRST_SLOT_OFFSET: i32 = 2;

/// Minimum distance between neighbouring slots.
pub const SLOT_SPACING: i32 = 2;

/// Space a folder's whole subtree needs, relative to its street start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footprint {
    pub slots: usize,
    /// Column offset of each slot from the street start.
    pub offsets: Vec<i32>,
    pub street_len: i32,
    /// Columns from the street start to the right edge of the subtree.
    pub width: i32,
    /// Rows above the street row.
    pub up: i32,
    /// Rows below the street row.
    pub down: i32,
    pub children: Vec<ChildPlan>,
}

/// Where a subfolder goes relative to its parent's street start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildPlan {
    pub slot: usize,
    pub side: Side,
    pub branch_offset: i32,
    /// Row of the child's street relative to the parent's street row.
    pub street_row: i32,
    pub footprint: Footprint,
}

impl Footprint {
    pub fn height(&self) -> i32 {
        self.up + self.down + 1
    }

    /// Rectangle of the subtree when its street starts at `start`.
    pub fn rect(&self, start: GridPos) -> GridRect {
        GridRect::new(start.x, start.y - self.up, self.width, self.height())
    }
}

/// Plans `folder`'s subtree, bottom-up. `min_street_cells` applies to this
/// street only; descendants use their natural length.
pub fn plan_footprint(folder: &FolderNode, arrival: Side, min_street_cells: i32) -> Footprint {
    let slots = folder.file_count().max(folder.subfolder_count()).max(1);
    let planned: Vec<(Side, Footprint)> = folder
        .folders
        .iter()
        .enumerate()
        .map(|(slot, child)| {
            let side = Side::for_subfolder(arrival, slot);
            (side, plan_footprint(child, side, 0))
        })
        .collect();

    // First free column on each side, past the last subtree placed there.
    let mut reach_up = 0;
    let mut reach_down = 0;
    let mut offsets = Vec::with_capacity(slots);
    let mut next = FIRST_SLOT_OFFSET;
    for slot in 0..slots {
        let mut offset = next;
        if let Some((side, fp)) = planned.get(slot) {
            let reach = match side {
                Side::Up => &mut reach_up,
                Side::Down => &mut reach_down,
            };
            offset = offset.max(*reach);
            *reach = offset + fp.width;
        }
        offsets.push(offset);
        next = offset + SLOT_SPACING;
    }
    // One spacing past the last slot leaves the trailing margin.
    let street_len = next.max(min_street_cells);

    let mut up = BAND_HALF_HEIGHT;
    let mut down = BAND_HALF_HEIGHT;
    let children: Vec<ChildPlan> = planned
        .into_iter()
        .enumerate()
        .map(|(slot, (side, footprint))| {
            let extent = BAND_CLEARANCE - 1 + footprint.height();
            let street_row = match side {
                Side::Down => {
                    down = down.max(extent);
                    BAND_CLEARANCE + footprint.up
                }
                Side::Up => {
                    up = up.max(extent);
                    -(BAND_CLEARANCE + footprint.down)
                }
            };
            ChildPlan {
                slot,
                side,
                branch_offset: offsets[slot],
                street_row,
                footprint,
            }
        })
        .collect();

    let width = children
        .iter()
        .map(|c| c.branch_offset + c.footprint.width)
        .fold(street_len, i32::max);

    Footprint {
        slots,
        offsets,
        street_len,
        width,
        up,
        down,
        children,
    }
}
