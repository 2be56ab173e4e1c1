//! Witness layouts produced by the exact solver.
//!
//! A layout never leaves the crate: it exists so that a "fits" answer from
//! the search can be checked independently of the propagation that built it,
//! and rendered into trace logs.

use std::fmt;

use crate::geometry::Rotation;

/// One item placed at a lower corner in a chosen orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Placement {
    /// Index into the caller's item list.
    pub item: usize,
    pub rotation: Rotation,
    /// Extents along the container's `[width, height, length]` axes.
    pub extent: [u32; 3],
    /// Lower corner `[x, y, z]`.
    pub origin: [u32; 3],
}

impl Placement {
    /// Whether the two boxes share interior volume.
    ///
    /// Boxes that only touch along a face are disjoint.
    #[inline]
    pub fn overlaps(&self, other: &Placement) -> bool {
        (0..3).all(|axis| {
            let (a_start, a_end) = (self.origin[axis], self.origin[axis] + self.extent[axis]);
            let (b_start, b_end) = (other.origin[axis], other.origin[axis] + other.extent[axis]);
            a_start < b_end && b_start < a_end
        })
    }

    /// Whether the box lies entirely within `[0, bound)` on every axis.
    #[inline]
    pub fn inside(&self, bound: [u32; 3]) -> bool {
        (0..3).all(|axis| self.origin[axis] + self.extent[axis] <= bound[axis])
    }
}

/// The first reason a layout is not a packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Conflict {
    /// Placement at this position pokes out of the container.
    OutOfBounds(usize),
    /// Placements at these two positions overlap.
    Overlap(usize, usize),
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::OutOfBounds(index) => write!(f, "placement {index} leaves the container"),
            Conflict::Overlap(first, second) => {
                write!(f, "placements {first} and {second} overlap")
            }
        }
    }
}

/// Checks a layout against the container; `None` means it is a packing.
pub(crate) fn find_conflict(container: [u32; 3], layout: &[Placement]) -> Option<Conflict> {
    for (index, placement) in layout.iter().enumerate() {
        if !placement.inside(container) {
            return Some(Conflict::OutOfBounds(index));
        }
    }
    for (first, a) in layout.iter().enumerate() {
        for (offset, b) in layout[first + 1..].iter().enumerate() {
            if a.overlaps(b) {
                return Some(Conflict::Overlap(first, first + 1 + offset));
            }
        }
    }
    None
}

/// Formats a layout as one line per item, ordered by lower corner.
pub(crate) fn format_layout(layout: &[Placement]) -> String {
    let mut ordered: Vec<&Placement> = layout.iter().collect();
    ordered.sort_by_key(|placement| (placement.origin, placement.item));

    let mut output = String::new();
    for placement in ordered {
        let [x, y, z] = placement.origin;
        let [w, h, l] = placement.extent;
        output.push_str(&format!(
            "item {:>2} {:?} at ({x}, {y}, {z}) size {w}x{h}x{l}\n",
            placement.item, placement.rotation
        ));
    }
    output
}
