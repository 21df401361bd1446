//! # Block-structured AMR
//!
//! An overlapping AMR dataset is a hierarchy of levels. Every level holds a number of
//! rectangular blocks (uniform grids) that are `ratio` times finer than the level below.
//! A block at level `l` is described by a point [`Extent`](crate::Extent) in the index
//! space of level `l`: the index space of level 0 refined `factor(0, l)` times.
//!
//! [`AmrGridConnectivity`] finds which blocks touch or overlap each other, classifies the
//! [`Relationship`] between them, and uses that information to grow every block by a
//! number of ghost layers filled with data from its neighbors:
//!
//! ```
//! use vtk_structured::amr::{AmrGridConnectivity, RefinementRatio, Relationship};
//! use vtk_structured::{Extent, FieldData};
//!
//! let mut amr = AmrGridConnectivity::new(3, RefinementRatio::Constant(2)).unwrap();
//! // two level 0 blocks side by side
//! amr.register_grid(0, 0, Extent::new(0, 4, 0, 4, 0, 0), FieldData::new(), FieldData::new()).unwrap();
//! amr.register_grid(1, 0, Extent::new(4, 8, 0, 4, 0, 0), FieldData::new(), FieldData::new()).unwrap();
//! // a refined block inside the first one
//! amr.register_grid(2, 1, Extent::new(2, 6, 2, 6, 0, 0), FieldData::new(), FieldData::new()).unwrap();
//!
//! amr.compute_neighbors().unwrap();
//!
//! let relationships: Vec<_> = amr.neighbors(0).iter().map(|n| n.relationship).collect();
//! assert_eq!(relationships, vec![Relationship::SameLevelSibling, Relationship::Child]);
//! ```
//!
//! [`ParticleContainer`] bins point particles into the finest block that contains them.

mod connectivity;
mod neighbor;
mod particles;
mod refine;

pub use connectivity::{AmrGridConnectivity, GhostedGrid};
pub use neighbor::{AmrNeighbor, BlockFace, BlockTopology, NeighborSide, Relationship};
pub use particles::{AmrGeometry, ParticleContainer};
pub use refine::{cell_refined_extent, coarsen_extent, refine_extent, RefinementRatio};

use derive_more::{Deref, DerefMut, From, Into};

/// point is owned by another block
pub const DUPLICATE_POINT: u8 = 1;
/// point is not part of the visible geometry
pub const HIDDEN_POINT: u8 = 2;
/// cell is owned by another block
pub const DUPLICATE_CELL: u8 = 1;
/// cell is covered by a finer block
pub const REFINED_CELL: u8 = 8;
/// cell is not part of the visible geometry
pub const HIDDEN_CELL: u8 = 32;

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ConnectivityError {
    #[error("an AMR dataset needs at least one grid")]
    NoGrids,
    #[error("refinement ratios must be at least 2, got {0}")]
    InvalidRefinementRatio(u32),
    #[error("grid id {id} is out of range for {num_grids} grids")]
    GridOutOfRange { id: usize, num_grids: usize },
    #[error("grid {0} has an empty extent")]
    EmptyExtent(usize),
    #[error("grid {id} has {actual} {kind} tuples, its extent needs {expected}")]
    TupleMismatch {
        id: usize,
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("grid {0} was never registered")]
    UnregisteredGrid(usize),
    #[error("the AMR hierarchy has no grid at level 0")]
    MissingRootLevel,
    #[error("grids {grid} and {neighbor} overlap but are on the same level")]
    OverlappingSiblings { grid: usize, neighbor: usize },
    #[error("neighbors must be computed before ghost layers are created")]
    NeighborsNotComputed,
}

/// Per point or per cell ghost flags, see [`DUPLICATE_POINT`], [`REFINED_CELL`] and
/// friends. Several flags may be combined with `|`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut, From, Into)]
pub struct GhostArray(Vec<u8>);

impl GhostArray {
    pub fn zeros(len: usize) -> Self {
        Self(vec![0; len])
    }

    /// number of entries with every bit of `flag` set
    pub fn count(&self, flag: u8) -> usize {
        self.0.iter().filter(|value| **value & flag == flag).count()
    }

    pub fn has_flag(&self, index: usize, flag: u8) -> bool {
        self.0.get(index).map_or(false, |value| value & flag == flag)
    }

    pub fn set_flag(&mut self, index: usize, flag: u8) {
        if let Some(value) = self.0.get_mut(index) {
            *value |= flag;
        }
    }
}
