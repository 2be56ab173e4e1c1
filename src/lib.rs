//! 3-D Orthogonal Packing Feasibility
//!
//! Decides whether a multiset of cuboid items can be placed inside a cuboid
//! container without overlap, each item in any of its axis-aligned
//! orientations. Cheap bounds and constructive heuristics answer most
//! instances; the rest go to an exact search with an optional time budget.
//!
//! ```
//! use std::time::Duration;
//! use boxfit::{decide, Config, Cuboid, Verdict};
//!
//! let container = Cuboid::new(5, 5, 1)?;
//! let items = vec![Cuboid::new(3, 2, 1)?; 4];
//! let config = Config::new().with_time_budget(Duration::from_secs(1));
//! assert_eq!(decide(&container, &items, &config)?.verdict, Verdict::Fits);
//! # Ok::<(), boxfit::Error>(())
//! ```

pub mod cuboid;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod scenarios;

mod bounds;
mod heuristics;
mod placement;
mod reduce;
mod solver;

pub use cuboid::{gcd, Cuboid, MAX_EDGE};
pub use error::{Error, Result};
pub use geometry::Rotation;
pub use pipeline::{can_fit, decide, Config, Decision, Stage, Verdict};
pub use scenarios::{Scenario, SCENARIOS};
