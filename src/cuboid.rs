//! The cuboid value type shared by containers and items.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::geometry::{distinct_rotations, Rotation};

/// Longest edge accepted by `Cuboid::new`.
///
/// Keeps `w * h * l` inside a `u64` and leaves headroom for position
/// arithmetic in the exact solver.
pub const MAX_EDGE: u32 = (1 << 21) - 1;

/// Greatest common divisor; `gcd(0, n) == n`.
pub const fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let remainder = a % b;
        a = b;
        b = remainder;
    }
    a
}

/// An immutable axis-aligned box with positive integer edges.
///
/// Derived statistics are computed once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cuboid {
    edges: [u32; 3],
    sorted: [u32; 3],
    volume: u64,
}

impl Cuboid {
    /// Creates a cuboid, rejecting zero or oversized edges.
    pub fn new(width: u32, height: u32, length: u32) -> Result<Self> {
        for value in [width, height, length] {
            if value == 0 || value > MAX_EDGE {
                return Err(Error::InvalidDimension { value });
            }
        }

        let edges = [width, height, length];
        let mut sorted = edges;
        sorted.sort_unstable();

        Ok(Self {
            edges,
            sorted,
            volume: u64::from(width) * u64::from(height) * u64::from(length),
        })
    }

    /// Creates a cuboid from a `[width, height, length]` triple.
    pub fn from_edges(edges: [u32; 3]) -> Result<Self> {
        Self::new(edges[0], edges[1], edges[2])
    }

    pub fn width(&self) -> u32 {
        self.edges[0]
    }

    pub fn height(&self) -> u32 {
        self.edges[1]
    }

    pub fn length(&self) -> u32 {
        self.edges[2]
    }

    /// Edges in construction order: `[width, height, length]`.
    pub fn edges(&self) -> [u32; 3] {
        self.edges
    }

    /// Edges in ascending order: `[min, med, max]`.
    pub fn sorted(&self) -> [u32; 3] {
        self.sorted
    }

    pub fn min_edge(&self) -> u32 {
        self.sorted[0]
    }

    pub fn med_edge(&self) -> u32 {
        self.sorted[1]
    }

    pub fn max_edge(&self) -> u32 {
        self.sorted[2]
    }

    pub fn volume(&self) -> u64 {
        self.volume
    }

    /// Sum of the three edges.
    pub fn edge_sum(&self) -> u64 {
        self.edges.iter().map(|&edge| u64::from(edge)).sum()
    }

    /// Greatest common divisor of the three edges.
    pub fn gcd(&self) -> u32 {
        gcd(gcd(self.edges[0], self.edges[1]), self.edges[2])
    }

    /// Extents along the container's `[width, height, length]` axes
    /// when this box is turned by `rotation`.
    #[inline]
    pub fn oriented(&self, rotation: Rotation) -> [u32; 3] {
        rotation.apply(self.edges)
    }

    /// The minimal rotation set: 1 for a cube, 3 with two equal edges, else 6.
    pub fn distinct_rotations(&self) -> &'static [Rotation] {
        distinct_rotations(self.edges)
    }

    /// Whether this box fits inside `container` in some orientation.
    ///
    /// Comparing sorted triples is exact for a single box.
    pub fn fits_alone_in(&self, container: &Cuboid) -> bool {
        self.sorted
            .iter()
            .zip(container.sorted.iter())
            .all(|(item, bound)| item <= bound)
    }

    /// Multiplies every edge by `factor`.
    pub fn scale_up(&self, factor: u32) -> Result<Self> {
        if factor == 0 {
            return Err(Error::InvalidArgument("scale factor must be positive".into()));
        }
        let mut edges = [0u32; 3];
        for (scaled, &edge) in edges.iter_mut().zip(self.edges.iter()) {
            let product = u64::from(edge) * u64::from(factor);
            *scaled = u32::try_from(product)
                .ok()
                .filter(|&value| value <= MAX_EDGE)
                .ok_or_else(|| {
                    Error::InvalidArgument(format!(
                        "scaling edge {edge} by {factor} gives {product}, above {MAX_EDGE}"
                    ))
                })?;
        }
        Self::from_edges(edges)
    }

    /// Divides every edge by `factor`, which must divide all of them.
    pub fn scale_down(&self, factor: u32) -> Result<Self> {
        if factor == 0 {
            return Err(Error::InvalidArgument("scale factor must be positive".into()));
        }
        if self.edges.iter().any(|edge| edge % factor != 0) {
            return Err(Error::InvalidArgument(format!(
                "{factor} does not divide every edge of {self}"
            )));
        }
        Self::new(
            self.edges[0] / factor,
            self.edges[1] / factor,
            self.edges[2] / factor,
        )
    }
}

impl fmt::Display for Cuboid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.edges[0], self.edges[1], self.edges[2])
    }
}

impl FromStr for Cuboid {
    type Err = Error;

    /// Parses `WIDTHxHEIGHTxLENGTH`, e.g. `10x5x5`.
    fn from_str(text: &str) -> Result<Self> {
        let mut edges = [0u32; 3];
        let mut parts = text.trim().split(['x', 'X']);
        for edge in &mut edges {
            *edge = parts
                .next()
                .and_then(|part| part.trim().parse().ok())
                .ok_or_else(|| Error::Parse(text.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(Error::Parse(text.to_string()));
        }
        Self::from_edges(edges)
    }
}
