use crate::extent::{DataDescription, Extent};
use std::fmt;

/// How a neighboring block relates to a grid in the AMR hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relationship {
    /// same level, sharing a face, edge or corner
    SameLevelSibling,
    /// the neighbor is finer and only touches the grid
    CoarseToFineSibling,
    /// the neighbor is coarser and only touches the grid
    FineToCoarseSibling,
    /// the neighbor is one level finer and lies completely inside the grid
    Child,
    /// the neighbor is one level finer and partially covers the grid
    PartiallyOverlappingChild,
    /// the neighbor is one level coarser and completely covers the grid
    Parent,
    /// the neighbor is one level coarser and partially covers the grid
    PartiallyOverlappingParent,
}

impl Relationship {
    pub fn is_sibling(&self) -> bool {
        matches!(
            self,
            Self::SameLevelSibling | Self::CoarseToFineSibling | Self::FineToCoarseSibling
        )
    }

    pub fn is_child(&self) -> bool {
        matches!(self, Self::Child | Self::PartiallyOverlappingChild)
    }

    pub fn is_parent(&self) -> bool {
        matches!(self, Self::Parent | Self::PartiallyOverlappingParent)
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SameLevelSibling => "same level sibling",
            Self::CoarseToFineSibling => "coarse to fine sibling",
            Self::FineToCoarseSibling => "fine to coarse sibling",
            Self::Child => "child",
            Self::PartiallyOverlappingChild => "partially overlapping child",
            Self::Parent => "parent",
            Self::PartiallyOverlappingParent => "partially overlapping parent",
        };
        write!(f, "{}", name)
    }
}

/// Where a neighbor sits relative to a grid along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NeighborSide {
    /// the neighbor ends where the grid starts
    Low,
    /// the neighbor starts where the grid ends
    High,
    /// the ranges overlap by more than a single index, or the axis is not active
    Overlapping,
}

/// One of the six faces of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockFace {
    Left,
    Right,
    Bottom,
    Top,
    Back,
    Front,
}

impl BlockFace {
    pub const ALL: [BlockFace; 6] = [
        Self::Left,
        Self::Right,
        Self::Bottom,
        Self::Top,
        Self::Back,
        Self::Front,
    ];

    /// the face on the low (`false`) or high (`true`) side of `axis`
    pub fn from_axis(axis: usize, high: bool) -> Self {
        Self::ALL[2 * axis.min(2) + usize::from(high)]
    }

    pub fn axis(&self) -> usize {
        (*self as usize) / 2
    }

    pub fn is_high(&self) -> bool {
        (*self as usize) % 2 == 1
    }

    fn bit(&self) -> u8 {
        1 << (*self as u8)
    }
}

/// The faces of a block that touch another block instead of the domain boundary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BlockTopology(u8);

impl BlockTopology {
    pub fn add_connection(&mut self, face: BlockFace) {
        self.0 |= face.bit();
    }

    pub fn has_connection(&self, face: BlockFace) -> bool {
        self.0 & face.bit() != 0
    }

    pub fn num_connections(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn connected_faces(&self) -> impl Iterator<Item = BlockFace> + '_ {
        BlockFace::ALL.into_iter().filter(move |face| self.has_connection(*face))
    }
}

/// A block adjacent to (or overlapping) a grid of the hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct AmrNeighbor {
    pub neighbor_id: usize,
    pub grid_level: usize,
    pub neighbor_level: usize,
    /// the shared region, in point indices of the grid's level
    pub grid_overlap: Extent,
    /// the shared region, in point indices of the neighbor's level
    pub neighbor_overlap: Extent,
    pub orientation: [NeighborSide; 3],
    pub relationship: Relationship,
}

/// per-axis position of `neighbor` relative to `grid`, both at the same level
pub(crate) fn orientation(
    grid: &Extent,
    neighbor: &Extent,
    overlap: &Extent,
    description: DataDescription,
) -> [NeighborSide; 3] {
    let mut sides = [NeighborSide::Overlapping; 3];
    for axis in description.active_axes() {
        let axis = *axis;
        if overlap.start(axis) != overlap.end(axis) {
            continue;
        }
        if neighbor.end(axis) == grid.start(axis) {
            sides[axis] = NeighborSide::Low;
        } else if neighbor.start(axis) == grid.end(axis) {
            sides[axis] = NeighborSide::High;
        }
    }
    sides
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_topology_bits() {
        let mut topology = BlockTopology::default();
        topology.add_connection(BlockFace::Right);
        topology.add_connection(BlockFace::Back);
        assert!(topology.has_connection(BlockFace::Right));
        assert!(!topology.has_connection(BlockFace::Left));
        assert_eq!(topology.num_connections(), 2);
        assert_eq!(
            topology.connected_faces().collect::<Vec<_>>(),
            vec![BlockFace::Right, BlockFace::Back]
        );
        assert_eq!(BlockFace::from_axis(1, true), BlockFace::Top);
        assert_eq!(BlockFace::Front.axis(), 2);
    }

    #[test]
    fn side_of_touching_neighbor() {
        let grid = Extent::new(0, 4, 0, 4, 0, 0);
        let neighbor = Extent::new(4, 8, 2, 6, 0, 0);
        let overlap = Extent::new(4, 4, 2, 4, 0, 0);
        let sides = orientation(&grid, &neighbor, &overlap, DataDescription::XYPlane);
        assert_eq!(
            sides,
            [NeighborSide::High, NeighborSide::Overlapping, NeighborSide::Overlapping]
        );
    }
}
