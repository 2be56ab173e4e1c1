//! Necessary conditions.
//!
//! Each check here can prove that a load does not fit, never that it does.
//! All of them are linear in the number of items.

use rustc_hash::FxHashMap;

use crate::cuboid::Cuboid;

/// Index of the first item that does not fit in the container on its own.
pub(crate) fn dominance_violation(container: &Cuboid, items: &[Cuboid]) -> Option<usize> {
    items.iter().position(|item| !item.fits_alone_in(container))
}

/// Combined volume of the items.
pub(crate) fn total_volume(items: &[Cuboid]) -> u128 {
    items.iter().map(|item| u128::from(item.volume())).sum()
}

/// Whether the items hold more volume than the container.
pub(crate) fn exceeds_volume(container: &Cuboid, items: &[Cuboid]) -> bool {
    total_volume(items) > u128::from(container.volume())
}

/// Fekete-Schepers dual feasible function `u^(k)`, scaled by `k` to stay integral.
///
/// `k == 0` selects the identity. For `k >= 1` a length `x` on an axis of
/// `capacity` maps onto an axis of `k * capacity`: to `k * x` when
/// `(k + 1) * x` is a multiple of the capacity, otherwise to
/// `floor((k + 1) * x / capacity) * capacity`. Lengths that fit side by
/// side still fit side by side after mapping.
#[inline]
fn dual(x: u64, capacity: u64, k: u64) -> u64 {
    if k == 0 {
        x
    } else if ((k + 1) * x) % capacity == 0 {
        k * x
    } else {
        ((k + 1) * x / capacity) * capacity
    }
}

/// Axis capacity after `dual` with the same `k`.
#[inline]
fn dual_capacity(capacity: u64, k: u64) -> u64 {
    if k == 0 {
        capacity
    } else {
        k * capacity
    }
}

/// Volume bound under per-axis dual feasible functions.
///
/// Tries every `(k_w, k_h, k_l)` in `0..=depth` on the container's width,
/// height and length axes. An item contributes the smallest transformed
/// volume over its orientations that fit the container, since the packing
/// may use any of them. Returns the first `k` triple whose transformed
/// volume exceeds the transformed container.
pub(crate) fn dual_bound_violation(
    container: &Cuboid,
    items: &[Cuboid],
    depth: u32,
) -> Option<[u32; 3]> {
    // identical shapes transform identically, so work on a multiset
    let mut shapes: FxHashMap<[u32; 3], (Cuboid, u128)> = FxHashMap::default();
    for item in items {
        shapes.entry(item.sorted()).or_insert((*item, 0)).1 += 1;
    }

    let bound = container.edges().map(u64::from);
    for k_w in 0..=depth {
        for k_h in 0..=depth {
            for k_l in 0..=depth {
                let ks = [k_w, k_h, k_l].map(u64::from);
                let capacity: u128 = (0..3)
                    .map(|axis| u128::from(dual_capacity(bound[axis], ks[axis])))
                    .product();

                let mut load: u128 = 0;
                for (shape, count) in shapes.values() {
                    let Some(smallest) = smallest_dual_volume(shape, bound, ks) else {
                        return Some([k_w, k_h, k_l]);
                    };
                    load += smallest * count;
                }

                if load > capacity {
                    return Some([k_w, k_h, k_l]);
                }
            }
        }
    }
    None
}

/// Smallest transformed volume over the orientations of `shape` that fit `bound`.
fn smallest_dual_volume(shape: &Cuboid, bound: [u64; 3], ks: [u64; 3]) -> Option<u128> {
    shape
        .distinct_rotations()
        .iter()
        .map(|&rotation| shape.oriented(rotation).map(u64::from))
        .filter(|extent| (0..3).all(|axis| extent[axis] <= bound[axis]))
        .map(|extent| {
            (0..3)
                .map(|axis| u128::from(dual(extent[axis], bound[axis], ks[axis])))
                .product()
        })
        .min()
}
