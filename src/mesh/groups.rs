//! Vertex groups.
//!
//! The template section tags its vertices with named groups. Masking keeps
//! one connector style per side, and the `Corner` group marks the four
//! vertices whose UVs become labels. The two rim groups are not part of a
//! section: solidify tags the outline rings of the shell with them so the
//! bevel can find the rim after subdivision has smoothed it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named vertex group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VertexGroup {
    /// The piece's geometric corners.
    Corner,
    /// Straight (border) side.
    Edge,
    /// Side with a connector cut into the piece.
    Inward,
    /// Side with a connector protruding from the piece.
    Outward,
    /// Outline ring of the top surface of a solidified shell.
    TopRim,
    /// Outline ring of the bottom surface of a solidified shell.
    BottomRim,
}

impl VertexGroup {
    /// All groups in bit order.
    pub const ALL: [VertexGroup; 6] = [
        VertexGroup::Corner,
        VertexGroup::Edge,
        VertexGroup::Inward,
        VertexGroup::Outward,
        VertexGroup::TopRim,
        VertexGroup::BottomRim,
    ];

    /// Groups every template section must populate.
    pub const SECTION: [VertexGroup; 4] = [
        VertexGroup::Corner,
        VertexGroup::Edge,
        VertexGroup::Inward,
        VertexGroup::Outward,
    ];

    /// Group name as used in files and logs.
    pub fn name(self) -> &'static str {
        match self {
            VertexGroup::Corner => "Corner",
            VertexGroup::Edge => "Edge",
            VertexGroup::Inward => "Inward",
            VertexGroup::Outward => "Outward",
            VertexGroup::TopRim => "TopRim",
            VertexGroup::BottomRim => "BottomRim",
        }
    }

    #[inline]
    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for VertexGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of groups a vertex belongs to, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GroupSet(u8);

impl GroupSet {
    /// The empty set.
    pub const EMPTY: GroupSet = GroupSet(0);

    /// Membership in every connector style (shared template vertices).
    pub fn all_sides() -> Self {
        Self::EMPTY
            .with(VertexGroup::Edge)
            .with(VertexGroup::Inward)
            .with(VertexGroup::Outward)
    }

    /// Set containing a single group.
    pub fn only(group: VertexGroup) -> Self {
        GroupSet(group.bit())
    }

    /// Return a copy with `group` added.
    #[must_use]
    pub fn with(self, group: VertexGroup) -> Self {
        GroupSet(self.0 | group.bit())
    }

    /// Return a copy with `group` removed.
    #[must_use]
    pub fn without(self, group: VertexGroup) -> Self {
        GroupSet(self.0 & !group.bit())
    }

    /// Whether the set holds either rim group.
    #[inline]
    pub fn is_rim(self) -> bool {
        self.contains(VertexGroup::TopRim) || self.contains(VertexGroup::BottomRim)
    }

    /// Whether `group` is in the set.
    #[inline]
    pub fn contains(self, group: VertexGroup) -> bool {
        self.0 & group.bit() != 0
    }

    /// Union of two sets (used when vertices are welded together).
    #[inline]
    #[must_use]
    pub fn union(self, other: GroupSet) -> Self {
        GroupSet(self.0 | other.0)
    }

    /// Intersection of two sets (used for points created between vertices).
    #[inline]
    #[must_use]
    pub fn intersection(self, other: GroupSet) -> Self {
        GroupSet(self.0 & other.0)
    }

    /// Raw bitmask, as stored in PLY files.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Rebuild from a raw bitmask, ignoring unknown bits.
    pub fn from_bits(bits: u8) -> Self {
        GroupSet(bits & 0b11_1111)
    }

    /// Iterate over contained groups.
    pub fn iter(self) -> impl Iterator<Item = VertexGroup> {
        VertexGroup::ALL.into_iter().filter(move |g| self.contains(*g))
    }
}
