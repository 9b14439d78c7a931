//! Index types for mesh elements.
//!
//! Vertices, faces and face loops are addressed by type-safe `u32` wrappers so
//! a vertex index can never be passed where a loop index is expected. A
//! [`VertexId`] is also the stable identity of a vertex: every topology edit
//! (mask, join, weld) returns an explicit remap instead of relying on
//! coordinate equality.

use std::fmt::{self, Debug};

const INVALID: u32 = u32::MAX;

/// A type-safe vertex index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId(u32);

/// A type-safe face index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId(u32);

/// A type-safe face-loop (face corner) index.
///
/// Each face owns a contiguous run of loops; per-loop data such as UV
/// coordinates is indexed by this id.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct LoopId(u32);

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl $name {
            /// Create a new index from a raw value.
            ///
            /// # Panics
            /// Panics in debug builds if the value does not fit in `u32`.
            #[inline]
            pub fn new(index: usize) -> Self {
                debug_assert!(index < INVALID as usize, "index {} too large", index);
                Self(index as u32)
            }

            /// Create an invalid/null index.
            #[inline]
            pub fn invalid() -> Self {
                Self(INVALID)
            }

            /// Get the raw index value.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Check if this is a valid (non-null) index.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0 != INVALID
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $display, self.0)
                } else {
                    write!(f, "{}(INVALID)", $display)
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_index_type!(VertexId, "V");
impl_index_type!(FaceId, "F");
impl_index_type!(LoopId, "L");

/// Mapping from vertex ids of a source mesh to vertex ids of a derived mesh.
///
/// Entries are `None` for vertices that were dropped (for example by a mask).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexRemap {
    targets: Vec<Option<VertexId>>,
}

impl VertexRemap {
    /// Identity remap over `n` vertices.
    pub fn identity(n: usize) -> Self {
        Self {
            targets: (0..n).map(|i| Some(VertexId::new(i))).collect(),
        }
    }

    /// Build a remap from raw targets.
    pub fn from_targets(targets: Vec<Option<VertexId>>) -> Self {
        Self { targets }
    }

    /// Where a source vertex ended up, if it survived.
    #[inline]
    pub fn get(&self, v: VertexId) -> Option<VertexId> {
        self.targets.get(v.index()).copied().flatten()
    }

    /// Number of source vertices covered by this remap.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the remap covers no vertices.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Compose `self` (a → b) with `next` (b → c), giving a → c.
    pub fn then(&self, next: &VertexRemap) -> VertexRemap {
        VertexRemap {
            targets: self
                .targets
                .iter()
                .map(|t| t.and_then(|v| next.get(v)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_id() {
        let v = VertexId::new(42);
        assert_eq!(v.index(), 42);
        assert!(v.is_valid());
        assert!(!VertexId::invalid().is_valid());
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", VertexId::new(7)), "V(7)");
        assert_eq!(format!("{:?}", LoopId::invalid()), "L(INVALID)");
    }

    #[test]
    fn test_remap_composition() {
        // 0 -> 1, 1 dropped, 2 -> 0
        let a = VertexRemap::from_targets(vec![
            Some(VertexId::new(1)),
            None,
            Some(VertexId::new(0)),
        ]);
        // 0 -> 0, 1 -> 0 (welded)
        let b = VertexRemap::from_targets(vec![Some(VertexId::new(0)), Some(VertexId::new(0))]);

        let c = a.then(&b);
        assert_eq!(c.get(VertexId::new(0)), Some(VertexId::new(0)));
        assert_eq!(c.get(VertexId::new(1)), None);
        assert_eq!(c.get(VertexId::new(2)), Some(VertexId::new(0)));
    }
}
