use super::grid::{GeometricCursor, HyperTreeGrid};

/// Which neighbors a [`NeighborhoodCursor`] follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighborhood {
    /// the neighbors sharing a face with the center
    VonNeumann,
    /// every neighbor touching the center, corners included
    Moore,
}

/// A node next to the center of a [`NeighborhoodCursor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborNode {
    /// root index of the tree holding the node
    pub tree: usize,
    pub node: usize,
    pub level: usize,
    pub leaf: bool,
}

/// A [`GeometricCursor`] that also tracks the nodes around its center.
///
/// Neighbors descend together with the center. A neighbor that is a leaf stays where it
/// is, so next to a coarse region the neighbor sits at a lower level than the center.
/// Neighbors past the edge of the grid, or in root cells without a tree, are `None`.
#[derive(Debug, Clone)]
pub struct NeighborhoodCursor<'a> {
    grid: &'a HyperTreeGrid,
    center: GeometricCursor<'a>,
    neighborhood: Neighborhood,
    axes: Vec<usize>,
    /// indexed by slot, see `NeighborhoodCursor::slot`
    neighbors: Vec<Option<NeighborNode>>,
    stack: Vec<Vec<Option<NeighborNode>>>,
}

impl HyperTreeGrid {
    /// a cursor at the root of tree `index`, `None` if that root cell holds no tree
    pub fn neighborhood_cursor(&self, index: usize, neighborhood: Neighborhood) -> Option<NeighborhoodCursor<'_>> {
        let tree = self.tree(index)?;
        let center = self.geometric_cursor(index)?;
        let axes = self.refined_axes();

        let mut cursor = NeighborhoodCursor {
            grid: self,
            center,
            neighborhood,
            neighbors: vec![None; 3usize.pow(axes.len() as u32)],
            axes,
            stack: Vec::new(),
        };

        for slot in 0..cursor.neighbors.len() {
            if !cursor.in_stencil(slot) {
                continue;
            }
            let offset = cursor.offset(slot);
            let mut shift = [0i32; 3];
            for (a, axis) in cursor.axes.iter().enumerate() {
                shift[*axis] = offset[a];
            }

            cursor.neighbors[slot] = if slot == cursor.center_slot() {
                Some(NeighborNode {
                    tree: index,
                    node: tree.root(),
                    level: 0,
                    leaf: tree.is_leaf(tree.root()),
                })
            } else {
                self.shifted_root_index(index, shift).and_then(|neighbor| {
                    let neighbor_tree = self.tree(neighbor)?;
                    Some(NeighborNode {
                        tree: neighbor,
                        node: neighbor_tree.root(),
                        level: 0,
                        leaf: neighbor_tree.is_leaf(neighbor_tree.root()),
                    })
                })
            };
        }

        Some(cursor)
    }
}

impl<'a> NeighborhoodCursor<'a> {
    pub fn center(&self) -> &GeometricCursor<'a> {
        &self.center
    }

    pub fn neighborhood(&self) -> Neighborhood {
        self.neighborhood
    }

    pub fn level(&self) -> usize {
        self.center.level()
    }

    pub fn is_leaf(&self) -> bool {
        self.center.is_leaf()
    }

    /// The node at `offset` (each component -1, 0 or 1, in x y z order) from the
    /// center. Offsets along axes that are not refined must be zero.
    pub fn neighbor(&self, offset: [i32; 3]) -> Option<NeighborNode> {
        if offset.iter().any(|o| !(-1..=1).contains(o)) {
            return None;
        }
        let mut flat = (0..3).filter(|axis| !self.axes.contains(axis));
        if flat.any(|axis| offset[axis] != 0) {
            return None;
        }

        let slot = self
            .axes
            .iter()
            .rev()
            .fold(0, |slot, axis| slot * 3 + (offset[*axis] + 1) as usize);
        self.slot_neighbor(slot)
    }

    /// number of slots: `3 ^ dimension`
    pub(crate) fn num_slots(&self) -> usize {
        self.neighbors.len()
    }

    pub(crate) fn center_slot(&self) -> usize {
        self.neighbors.len() / 2
    }

    /// the axes the slot offsets refer to, in slot digit order
    pub(crate) fn axes(&self) -> &[usize] {
        &self.axes
    }

    pub(crate) fn slot_neighbor(&self, slot: usize) -> Option<NeighborNode> {
        self.neighbors.get(slot).copied().flatten()
    }

    /// The offset of a slot along each refined axis. Slots are numbered in base 3 with
    /// the first refined axis varying fastest, digit `o + 1` for offset `o`.
    pub(crate) fn offset(&self, slot: usize) -> Vec<i32> {
        let mut rest = slot;
        self.axes
            .iter()
            .map(|_| {
                let digit = (rest % 3) as i32 - 1;
                rest /= 3;
                digit
            })
            .collect()
    }

    fn slot(offset: &[i32]) -> usize {
        offset.iter().rev().fold(0, |slot, o| slot * 3 + (o + 1) as usize)
    }

    pub(crate) fn in_stencil(&self, slot: usize) -> bool {
        match self.neighborhood {
            Neighborhood::Moore => true,
            Neighborhood::VonNeumann => self.offset(slot).iter().filter(|o| **o != 0).count() <= 1,
        }
    }

    /// Descend the center into child `index` and move the neighbors along. Returns
    /// `false` (and stays put) when the center is a leaf.
    pub fn to_child(&mut self, index: usize) -> bool {
        if !self.center.to_child(index) {
            return false;
        }

        let factor = self.grid.branch_factor() as i32;
        let mut rest = index;
        let digits: Vec<i32> = self
            .axes
            .iter()
            .map(|_| {
                let digit = (rest % factor as usize) as i32;
                rest /= factor as usize;
                digit
            })
            .collect();

        let mut neighbors = vec![None; self.neighbors.len()];
        for (slot, neighbor) in neighbors.iter_mut().enumerate() {
            if !self.in_stencil(slot) {
                continue;
            }

            // position of the neighbor among the children of the parent neighborhood
            let offset = self.offset(slot);
            let mut parent_offset = Vec::with_capacity(offset.len());
            let mut child = 0;
            let mut place = 1;
            for (digit, o) in digits.iter().zip(offset.iter()) {
                let position = digit + o;
                let shift = if position < 0 {
                    -1
                } else if position >= factor {
                    1
                } else {
                    0
                };
                parent_offset.push(shift);
                child += (position - shift * factor) as usize * place;
                place *= factor as usize;
            }

            *neighbor = match self.slot_neighbor(Self::slot(&parent_offset)) {
                Some(parent) if parent.leaf => Some(parent),
                Some(parent) => self.grid.tree(parent.tree).and_then(|tree| {
                    let node = tree.child(parent.node, child)?;
                    Some(NeighborNode {
                        tree: parent.tree,
                        node,
                        level: parent.level + 1,
                        leaf: tree.is_leaf(node),
                    })
                }),
                None => None,
            };
        }

        let parent = std::mem::replace(&mut self.neighbors, neighbors);
        self.stack.push(parent);
        true
    }

    pub fn to_parent(&mut self) -> bool {
        if !self.center.to_parent() {
            return false;
        }
        if let Some(neighbors) = self.stack.pop() {
            self.neighbors = neighbors;
        }
        true
    }

    pub fn to_root(&mut self) {
        self.center.to_root();
        if let Some(neighbors) = self.stack.first().cloned() {
            self.neighbors = neighbors;
        }
        self.stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3 x 2 root cells in the xy plane, the middle bottom one refined
    fn grid() -> HyperTreeGrid {
        let mut grid = HyperTreeGrid::uniform(2, 2, [3, 2, 1]).unwrap().with_orientation(2);
        for index in 0..6 {
            grid.tree_mut(index).unwrap();
        }
        grid.tree_mut(1).unwrap().subdivide_leaf(0).unwrap();
        grid
    }

    #[test]
    fn root_neighbors() {
        let grid = grid();
        let cursor = grid.neighborhood_cursor(0, Neighborhood::Moore).unwrap();

        assert_eq!(cursor.neighbor([-1, 0, 0]), None);
        assert_eq!(cursor.neighbor([1, 0, 0]).map(|n| n.tree), Some(1));
        assert_eq!(cursor.neighbor([1, 1, 0]).map(|n| n.tree), Some(4));
        assert_eq!(cursor.neighbor([0, 0, 0]).map(|n| n.tree), Some(0));
        // z is not refined
        assert_eq!(cursor.neighbor([0, 0, 1]), None);

        let cursor = grid.neighborhood_cursor(0, Neighborhood::VonNeumann).unwrap();
        assert_eq!(cursor.neighbor([0, 1, 0]).map(|n| n.tree), Some(3));
        assert_eq!(cursor.neighbor([1, 1, 0]), None);
    }

    #[test]
    fn neighbors_follow_the_center() {
        let grid = grid();
        let mut cursor = grid.neighborhood_cursor(1, Neighborhood::Moore).unwrap();
        assert!(!cursor.is_leaf());

        // lower right child of tree 1
        assert!(cursor.to_child(1));
        assert_eq!(cursor.level(), 1);

        let west = cursor.neighbor([-1, 0, 0]).unwrap();
        assert_eq!((west.tree, west.node, west.level), (1, 1, 1));

        // tree 2 is a leaf, the neighbor stays at its root
        let east = cursor.neighbor([1, 0, 0]).unwrap();
        assert_eq!((east.tree, east.node, east.level), (2, 0, 0));

        let north = cursor.neighbor([0, 1, 0]).unwrap();
        assert_eq!((north.tree, north.node), (1, 4));
        assert_eq!(cursor.neighbor([0, -1, 0]), None);

        assert!(cursor.to_parent());
        assert_eq!(cursor.neighbor([1, 0, 0]).map(|n| n.tree), Some(2));
        assert!(!cursor.to_parent());
    }

    #[test]
    fn missing_trees_have_no_cursor() {
        let grid = HyperTreeGrid::uniform(2, 2, [2, 1, 1]).unwrap();
        assert!(grid.neighborhood_cursor(0, Neighborhood::Moore).is_none());
    }
}
