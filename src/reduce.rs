//! Common-divisor scaling.
//!
//! When every edge of the container and of the items is a multiple of `g`,
//! any packing can be pushed onto the `g`-spaced grid (slide every box
//! towards the origin until it touches a wall or another box), so dividing
//! all edges by `g` preserves the answer and shrinks the search domains.

use crate::cuboid::{gcd, Cuboid};
use crate::error::Result;

/// Largest integer dividing every edge of the container and the items.
pub(crate) fn common_divisor(container: &Cuboid, items: &[Cuboid]) -> u32 {
    items
        .iter()
        .map(Cuboid::gcd)
        .fold(container.gcd(), gcd)
}

/// A copy of the instance with every edge divided by `divisor`.
pub(crate) fn scale_down(
    container: &Cuboid,
    items: &[Cuboid],
    divisor: u32,
) -> Result<(Cuboid, Vec<Cuboid>)> {
    let container = container.scale_down(divisor)?;
    let items = items
        .iter()
        .map(|item| item.scale_down(divisor))
        .collect::<Result<Vec<_>>>()?;
    Ok((container, items))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cuboid(w: u32, h: u32, l: u32) -> Cuboid {
        Cuboid::new(w, h, l).unwrap()
    }

    #[test]
    fn test_common_divisor() {
        let container = cuboid(10, 10, 2);
        assert_eq!(common_divisor(&container, &[cuboid(6, 4, 2), cuboid(4, 6, 2)]), 2);
        assert_eq!(common_divisor(&container, &[cuboid(6, 4, 2), cuboid(1, 2, 2)]), 1);
        assert_eq!(common_divisor(&cuboid(12, 12, 12), &[cuboid(6, 6, 6)]), 6);
        assert_eq!(common_divisor(&cuboid(12, 18, 24), &[]), 6);
    }

    #[test]
    fn test_scale_down() {
        let (container, items) =
            scale_down(&cuboid(10, 10, 2), &[cuboid(6, 4, 2), cuboid(4, 6, 2)], 2).unwrap();
        assert_eq!(container.edges(), [5, 5, 1]);
        assert_eq!(items[0].edges(), [3, 2, 1]);
        assert_eq!(items[1].edges(), [2, 3, 1]);
    }

    #[test]
    fn test_scale_down_rejects_non_divisors() {
        assert!(scale_down(&cuboid(10, 10, 2), &[cuboid(3, 4, 2)], 2).is_err());
    }
}
