//! Named packing scenarios with known answers.
//!
//! Shared by the binary, the pipeline tests and the benchmarks.

use crate::cuboid::Cuboid;
use crate::error::Result;

/// A container, a load given as `(edges, count)` groups, and whether it fits.
#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub container: [u32; 3],
    pub items: &'static [([u32; 3], usize)],
    pub expected: bool,
}

impl Scenario {
    /// The container as a validated cuboid.
    pub fn container(&self) -> Result<Cuboid> {
        Cuboid::from_edges(self.container)
    }

    /// The load with every group expanded into individual items.
    pub fn items(&self) -> Result<Vec<Cuboid>> {
        let mut items = Vec::with_capacity(self.item_count());
        for &(edges, count) in self.items {
            let item = Cuboid::from_edges(edges)?;
            items.extend(std::iter::repeat(item).take(count));
        }
        Ok(items)
    }

    pub fn item_count(&self) -> usize {
        self.items.iter().map(|&(_, count)| count).sum()
    }

    /// Compact description of the load, e.g. `4x(3x2x1) + 1x(1x1x1)`.
    pub fn describe_items(&self) -> String {
        let groups: Vec<String> = self
            .items
            .iter()
            .map(|&([w, h, l], count)| format!("{count}x({w}x{h}x{l})"))
            .collect();
        if groups.is_empty() {
            "nothing".to_string()
        } else {
            groups.join(" + ")
        }
    }
}

/// Looks up a scenario by name.
pub fn find(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|scenario| scenario.name == name)
}

pub const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "needles",
        container: [10, 10, 10],
        items: &[([9, 1, 1], 2)],
        expected: true,
    },
    Scenario {
        name: "overfull",
        container: [3, 3, 3],
        items: &[([3, 3, 3], 1), ([1, 1, 1], 1)],
        expected: false,
    },
    Scenario {
        name: "oversized_slab",
        container: [10, 5, 5],
        items: &[([9, 9, 1], 1)],
        expected: false,
    },
    Scenario {
        name: "three_cubes",
        container: [5, 5, 5],
        items: &[([3, 3, 3], 3)],
        expected: false,
    },
    Scenario {
        name: "rotation_required",
        container: [6, 4, 4],
        items: &[([4, 4, 2], 1), ([4, 2, 4], 1)],
        expected: true,
    },
    Scenario {
        name: "twenty_sevens",
        container: [20, 20, 20],
        items: &[([7, 7, 7], 20)],
        expected: false,
    },
    Scenario {
        name: "twin_cubes",
        container: [10, 5, 5],
        items: &[([5, 5, 5], 2)],
        expected: true,
    },
    Scenario {
        name: "dimension_mismatch",
        container: [6, 4, 4],
        items: &[([5, 4, 4], 1), ([2, 4, 4], 1)],
        expected: false,
    },
    Scenario {
        name: "four_slices",
        container: [10, 5, 5],
        items: &[([5, 5, 1], 4)],
        expected: true,
    },
    Scenario {
        name: "octet",
        container: [4, 4, 4],
        items: &[([2, 2, 2], 4)],
        expected: true,
    },
    Scenario {
        name: "unit_cubes_and_bar",
        container: [5, 5, 5],
        items: &[([1, 1, 1], 8), ([1, 1, 3], 1)],
        expected: true,
    },
    Scenario {
        name: "small_cubes",
        container: [10, 10, 10],
        items: &[([2, 2, 2], 20)],
        expected: true,
    },
    Scenario {
        name: "medium_cubes",
        container: [10, 10, 10],
        items: &[([3, 3, 3], 20)],
        expected: true,
    },
    Scenario {
        name: "slice_stack",
        container: [20, 5, 5],
        items: &[([5, 5, 1], 20)],
        expected: true,
    },
    Scenario {
        name: "big_cubes",
        container: [50, 50, 50],
        items: &[([10, 10, 10], 20)],
        expected: true,
    },
    Scenario {
        name: "crowded_cubes",
        container: [40, 40, 40],
        items: &[([14, 14, 14], 20)],
        expected: false,
    },
    Scenario {
        name: "pinwheel",
        container: [5, 5, 1],
        items: &[([3, 2, 1], 4)],
        expected: true,
    },
    Scenario {
        name: "pinwheel_with_centre",
        container: [5, 5, 1],
        items: &[([3, 2, 1], 4), ([1, 1, 1], 1)],
        expected: true,
    },
    Scenario {
        name: "scaled_pinwheel",
        container: [10, 10, 2],
        items: &[([6, 4, 2], 4)],
        expected: true,
    },
    Scenario {
        name: "mixed_bars",
        container: [3, 3, 3],
        items: &[
            ([3, 1, 1], 1),
            ([1, 1, 1], 6),
            ([1, 1, 3], 1),
            ([1, 2, 1], 3),
            ([1, 1, 2], 1),
            ([2, 1, 1], 1),
            ([1, 3, 1], 1),
        ],
        expected: true,
    },
    // fills all 27 cells
    Scenario {
        name: "mixed_bars_full",
        container: [3, 3, 3],
        items: &[
            ([3, 1, 1], 1),
            ([1, 1, 1], 6),
            ([1, 1, 3], 1),
            ([1, 2, 1], 3),
            ([2, 1, 2], 1),
            ([2, 1, 1], 1),
            ([1, 3, 1], 1),
        ],
        expected: true,
    },
    Scenario {
        name: "twenty_variants",
        container: [20, 20, 20],
        items: &[
            ([7, 7, 6], 1),
            ([7, 6, 7], 1),
            ([6, 7, 7], 1),
            ([6, 6, 6], 1),
            ([5, 7, 7], 1),
            ([7, 5, 7], 2),
            ([7, 7, 5], 1),
            ([5, 4, 7], 1),
            ([6, 7, 5], 1),
            ([6, 5, 7], 1),
            ([7, 5, 5], 1),
            ([6, 6, 7], 1),
            ([7, 7, 7], 7),
        ],
        expected: true,
    },
];
