//! Sufficient conditions.
//!
//! Each check builds (at least implicitly) a concrete arrangement, so a
//! `true` proves the load fits. A `false` proves nothing. All of them
//! assume the dominance check has passed: every item fits on its own with
//! its sorted edges matched against the container's sorted edges.

use std::cmp::Reverse;

use crate::cuboid::Cuboid;

/// Stacks every item along the container's shortest axis.
///
/// Each item lies with its shortest edge on that axis; the other two edges
/// are bounded by dominance, so the stack fits whenever its height does.
pub(crate) fn min_edge_stack(container: &Cuboid, items: &[Cuboid]) -> bool {
    let height: u64 = items.iter().map(|item| u64::from(item.min_edge())).sum();
    height <= u64::from(container.min_edge())
}

/// Gives every item its own cell in a grid of cubes.
///
/// Cells have the largest edge of any item, so each item fits in a cell in
/// any orientation.
pub(crate) fn cube_grid(container: &Cuboid, items: &[Cuboid]) -> bool {
    let Some(cell) = items.iter().map(Cuboid::max_edge).max() else {
        return true;
    };
    let cells: u64 = container
        .edges()
        .iter()
        .map(|&edge| u64::from(edge / cell))
        .product();
    cells >= items.len() as u64
}

/// Multi-stack shelf packing.
///
/// The container is cut into shelves across its longest axis. Inside a
/// shelf, items stand side by side along the shortest axis, each with its
/// shortest edge there, its middle edge on the container's middle axis and
/// its longest edge across the shelf. A shelf is as thick as the longest
/// edge placed on it.
pub(crate) fn shelf(container: &Cuboid, items: &[Cuboid]) -> bool {
    let mut order: Vec<&Cuboid> = items.iter().collect();
    order.sort_by_key(|item| Reverse(item.edge_sum()));

    let depth = container.min_edge();
    // depth used in the current shelf
    let mut stack_h = 0u32;
    // thickness of the current shelf
    let mut stack_max = 0u32;
    // room left along the longest axis, current shelf included
    let mut cur_max = container.max_edge();

    for item in order {
        if stack_h + item.min_edge() > depth {
            cur_max -= stack_max;
            stack_h = 0;
            stack_max = 0;
        }

        let thickness = stack_max.max(item.max_edge());
        if thickness > cur_max {
            return false;
        }

        stack_h += item.min_edge();
        stack_max = thickness;
    }

    true
}
