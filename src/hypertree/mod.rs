//! # Tree-based AMR
//!
//! A [`HyperTreeGrid`] is a rectilinear grid of root cells. Every root cell may hold a
//! [`HyperTree`]: a tree where each refined node is split into `branch_factor` parts along
//! every refined axis, giving `branch_factor ^ dimension` children.
//!
//! Nodes of a tree are stored in a flat vector and the children of a node are always
//! contiguous, so a node is addressed by a plain `usize`.

mod dual;
mod grid;
mod neighborhood;
mod tree;

pub use dual::DualGrid;
pub use grid::{GeometricCursor, HyperTreeGrid, NodeLocation};
pub use neighborhood::{NeighborNode, Neighborhood, NeighborhoodCursor};
pub use tree::{HyperTree, TreeCursor};

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum HyperTreeError {
    #[error("branch factor must be 2 or 3, got {0}")]
    InvalidBranchFactor(usize),
    #[error("dimension must be 1, 2 or 3, got {0}")]
    InvalidDimension(usize),
    #[error("node {0} does not exist in the tree")]
    NodeOutOfRange(usize),
    #[error("node {0} is already refined")]
    NotALeaf(usize),
    #[error("the grid needs at least one root cell along each axis, got {0:?}")]
    InvalidGridSize([usize; 3]),
    #[error("axis {axis} needs {expected} coordinates for its root cells, got {actual}")]
    CoordinatesMismatch {
        axis: usize,
        expected: usize,
        actual: usize,
    },
    #[error("root index {index} is out of range for {num_trees} trees")]
    TreeOutOfRange { index: usize, num_trees: usize },
    #[error("the coordinates of axis {axis} must be finite and strictly increasing")]
    UnorderedCoordinates { axis: usize },
    #[error("the material mask needs one value for each of the {expected} nodes, got {actual}")]
    MaskLength { expected: usize, actual: usize },
}
