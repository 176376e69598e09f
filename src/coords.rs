//! Block coordinates and the rank order used to present them.
//!
//! Results are ranked by squared euclidean distance to the origin. Ties are
//! broken by ascending `x`, then `z`, then `y`, which makes the order total over
//! distinct coordinates.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An immutable `(x, y, z)` triple reported by a search engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    x: i32,
    y: i32,
    z: i32,
}

impl Coordinate {
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    #[must_use]
    pub const fn z(&self) -> i32 {
        self.z
    }

    /// Squared distance to the origin.
    ///
    /// Three squared `i32` components can reach `3 * 2^62`, past `i64::MAX`,
    /// so the sum is carried in `i128`.
    #[must_use]
    pub const fn distance_squared(&self) -> i128 {
        let x = self.x as i128;
        let y = self.y as i128;
        let z = self.z as i128;
        x * x + y * y + z * z
    }

    /// The full ordering key `(d², x, z, y)`.
    #[must_use]
    pub const fn rank_key(&self) -> (i128, i32, i32, i32) {
        (self.distance_squared(), self.x, self.z, self.y)
    }

    /// Compare two coordinates by rank.
    #[must_use]
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        self.rank_key().cmp(&other.rank_key())
    }
}

/// Returns `true` when `a` must be listed strictly before `b`.
#[must_use]
pub fn precedes(a: &Coordinate, b: &Coordinate) -> bool {
    a.rank_cmp(b) == Ordering::Less
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl From<(i32, i32, i32)> for Coordinate {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

/// One corner of a search region.
pub type BlockPos = Coordinate;
