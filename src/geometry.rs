//! Axis-aligned rotations of a cuboid.
//!
//! A box with three distinct edges has 6 axis-aligned orientations, one per
//! way of assigning its edges to the container's width, height and length
//! axes. Equal edges make some of those assignments coincide.

/// All 6 edge permutations, indexed by `Rotation::index`.
///
/// Entry `[r][axis]` names the source edge (0 = width, 1 = height,
/// 2 = length) that ends up on container axis `axis` under rotation `r`.
pub const PERMUTATIONS: [[usize; 3]; 6] = [
    [0, 1, 2], // R0: identity
    [2, 1, 0], // R1: width <-> length
    [2, 0, 1], // R2
    [1, 0, 2], // R3: width <-> height
    [0, 2, 1], // R4: height <-> length
    [1, 2, 0], // R5
];

/// One of the six axis-aligned orientations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rotation {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
}

/// Every rotation, in table order.
pub const ALL_ROTATIONS: [Rotation; 6] = [
    Rotation::R0,
    Rotation::R1,
    Rotation::R2,
    Rotation::R3,
    Rotation::R4,
    Rotation::R5,
];

// Minimal rotation sets for boxes with repeated edges. Each set produces
// every distinct oriented triple exactly once.
const CUBE_ROTATIONS: [Rotation; 1] = [Rotation::R0];
const WIDTH_EQ_HEIGHT: [Rotation; 3] = [Rotation::R0, Rotation::R1, Rotation::R4];
const WIDTH_EQ_LENGTH: [Rotation; 3] = [Rotation::R0, Rotation::R2, Rotation::R3];
const HEIGHT_EQ_LENGTH: [Rotation; 3] = [Rotation::R0, Rotation::R1, Rotation::R3];

impl Rotation {
    /// Position of this rotation in `PERMUTATIONS`.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Maps `(width, height, length)` edges onto the container axes.
    #[inline(always)]
    pub const fn apply(self, edges: [u32; 3]) -> [u32; 3] {
        let permutation = PERMUTATIONS[self.index()];
        [
            edges[permutation[0]],
            edges[permutation[1]],
            edges[permutation[2]],
        ]
    }
}

/// Returns the smallest rotation set covering every distinct orientation.
pub fn distinct_rotations(edges: [u32; 3]) -> &'static [Rotation] {
    let [width, height, length] = edges;
    if width == height && height == length {
        &CUBE_ROTATIONS
    } else if width == height {
        &WIDTH_EQ_HEIGHT
    } else if width == length {
        &WIDTH_EQ_LENGTH
    } else if height == length {
        &HEIGHT_EQ_LENGTH
    } else {
        &ALL_ROTATIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut triple: [u32; 3]) -> [u32; 3] {
        triple.sort_unstable();
        triple
    }

    #[test]
    fn test_every_entry_is_a_permutation() {
        for (rot, permutation) in PERMUTATIONS.iter().enumerate() {
            let mut seen = [false; 3];
            for &source in permutation {
                assert!(!seen[source], "Rotation {rot} uses edge {source} twice");
                seen[source] = true;
            }
        }
    }

    #[test]
    fn test_table_entries_are_all_different() {
        for a in 0..6 {
            for b in (a + 1)..6 {
                assert_ne!(PERMUTATIONS[a], PERMUTATIONS[b], "R{a} and R{b} coincide");
            }
        }
    }

    #[test]
    fn test_identity_rotation_is_unchanged() {
        assert_eq!(Rotation::R0.apply([2, 3, 5]), [2, 3, 5]);
        assert_eq!(Rotation::R1.apply([2, 3, 5]), [5, 3, 2]);
        assert_eq!(Rotation::R5.apply([2, 3, 5]), [3, 5, 2]);
    }

    #[test]
    fn test_distinct_rotation_counts() {
        assert_eq!(distinct_rotations([4, 4, 4]).len(), 1);
        assert_eq!(distinct_rotations([4, 4, 2]).len(), 3);
        assert_eq!(distinct_rotations([4, 2, 4]).len(), 3);
        assert_eq!(distinct_rotations([2, 4, 4]).len(), 3);
        assert_eq!(distinct_rotations([2, 3, 4]).len(), 6);
    }

    #[test]
    fn test_distinct_rotations_cover_every_orientation_once() {
        for edges in [[4, 4, 4], [4, 4, 2], [4, 2, 4], [2, 4, 4], [2, 3, 4], [7, 1, 3]] {
            let mut reduced: Vec<[u32; 3]> = distinct_rotations(edges)
                .iter()
                .map(|rotation| rotation.apply(edges))
                .collect();
            reduced.sort_unstable();
            let before = reduced.len();
            reduced.dedup();
            assert_eq!(before, reduced.len(), "{edges:?} has duplicate orientations");

            let mut full: Vec<[u32; 3]> = ALL_ROTATIONS
                .iter()
                .map(|rotation| rotation.apply(edges))
                .collect();
            full.sort_unstable();
            full.dedup();
            assert_eq!(reduced, full, "{edges:?} misses an orientation");

            for oriented in &reduced {
                assert_eq!(sorted(*oriented), sorted(edges));
            }
        }
    }
}
