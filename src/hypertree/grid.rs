use super::tree::HyperTree;
use super::HyperTreeError;
use std::collections::BTreeMap;

/// A node found by [`HyperTreeGrid::find_point`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLocation {
    /// root index of the tree
    pub tree: usize,
    /// node id inside the tree
    pub node: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HyperTreeGrid {
    dimension: usize,
    branch_factor: usize,
    orientation: usize,
    grid_size: [usize; 3],
    coordinates: [Vec<f64>; 3],
    transposed_root_indexing: bool,
    trees: BTreeMap<usize, HyperTree>,
    material_mask: Vec<bool>,
}

impl HyperTreeGrid {
    /// A grid of `grid_size` root cells. Axis `a` needs `grid_size[a] + 1` coordinates,
    /// the boundaries of its root cells.
    pub fn new(
        dimension: usize,
        branch_factor: usize,
        grid_size: [usize; 3],
        coordinates: [Vec<f64>; 3],
    ) -> Result<Self, HyperTreeError> {
        // validates the factor and dimension
        HyperTree::new(branch_factor, dimension)?;

        if grid_size.iter().any(|size| *size == 0) {
            return Err(HyperTreeError::InvalidGridSize(grid_size));
        }
        for axis in 0..3 {
            if coordinates[axis].len() != grid_size[axis] + 1 {
                return Err(HyperTreeError::CoordinatesMismatch {
                    axis,
                    expected: grid_size[axis] + 1,
                    actual: coordinates[axis].len(),
                });
            }
            // root cells are located by binary search
            let ordered = coordinates[axis].iter().all(|c| c.is_finite())
                && coordinates[axis].windows(2).all(|pair| pair[0] < pair[1]);
            if !ordered {
                return Err(HyperTreeError::UnorderedCoordinates { axis });
            }
        }

        Ok(Self {
            dimension,
            branch_factor,
            orientation: 0,
            grid_size,
            coordinates,
            transposed_root_indexing: false,
            trees: BTreeMap::new(),
            material_mask: Vec::new(),
        })
    }

    /// A uniform grid with unit sized root cells starting at the origin
    pub fn uniform(dimension: usize, branch_factor: usize, grid_size: [usize; 3]) -> Result<Self, HyperTreeError> {
        let coordinates = grid_size.map(|size| (0..=size).map(|c| c as f64).collect::<Vec<_>>());
        Self::new(dimension, branch_factor, grid_size, coordinates)
    }

    /// For 1-D trees the axis that is refined, for 2-D trees the normal of the refined
    /// plane. Ignored by 3-D trees. Values past 2 are clamped.
    pub fn with_orientation(mut self, orientation: usize) -> Self {
        self.orientation = orientation.min(2);
        self
    }

    /// index root cells with `k` varying fastest instead of `i`
    pub fn with_transposed_root_indexing(mut self, transposed: bool) -> Self {
        self.transposed_root_indexing = transposed;
        self
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn branch_factor(&self) -> usize {
        self.branch_factor
    }

    pub fn orientation(&self) -> usize {
        self.orientation
    }

    pub fn grid_size(&self) -> [usize; 3] {
        self.grid_size
    }

    pub fn transposed_root_indexing(&self) -> bool {
        self.transposed_root_indexing
    }

    pub fn coordinates(&self, axis: usize) -> &[f64] {
        &self.coordinates[axis.min(2)]
    }

    /// the axes split by refinement, in child digit order
    pub fn refined_axes(&self) -> Vec<usize> {
        match self.dimension {
            1 => vec![self.orientation],
            2 => (0..3).filter(|axis| *axis != self.orientation).collect(),
            _ => vec![0, 1, 2],
        }
    }

    pub fn num_trees(&self) -> usize {
        self.grid_size.iter().product()
    }

    pub fn root_index(&self, ijk: [usize; 3]) -> Option<usize> {
        if (0..3).any(|axis| ijk[axis] >= self.grid_size[axis]) {
            return None;
        }
        let [nx, ny, nz] = self.grid_size;
        let [i, j, k] = ijk;
        Some(if self.transposed_root_indexing {
            k + j * nz + i * nz * ny
        } else {
            i + j * nx + k * nx * ny
        })
    }

    pub fn level_zero_coordinates(&self, index: usize) -> Option<[usize; 3]> {
        if index >= self.num_trees() {
            return None;
        }
        let [nx, ny, nz] = self.grid_size;
        Some(if self.transposed_root_indexing {
            [index / (nz * ny), (index / nz) % ny, index % nz]
        } else {
            [index % nx, (index / nx) % ny, index / (nx * ny)]
        })
    }

    /// the root index of the cell at offset `shift` from root cell `index`, `None` when
    /// the shifted cell falls outside of the grid
    pub fn shifted_root_index(&self, index: usize, shift: [i32; 3]) -> Option<usize> {
        let ijk = self.level_zero_coordinates(index)?;
        let mut shifted = [0usize; 3];
        for axis in 0..3 {
            let value = ijk[axis] as i64 + shift[axis] as i64;
            shifted[axis] = usize::try_from(value).ok()?;
        }
        self.root_index(shifted)
    }

    pub fn tree(&self, index: usize) -> Option<&HyperTree> {
        self.trees.get(&index)
    }

    /// the tree of root cell `index`, created as a single leaf on first access
    pub fn tree_mut(&mut self, index: usize) -> Result<&mut HyperTree, HyperTreeError> {
        let num_trees = self.num_trees();
        if index >= num_trees {
            return Err(HyperTreeError::TreeOutOfRange { index, num_trees });
        }

        if !self.trees.contains_key(&index) {
            let tree = HyperTree::new(self.branch_factor, self.dimension)?;
            self.trees.insert(index, tree);
        }
        self.trees
            .get_mut(&index)
            .ok_or(HyperTreeError::TreeOutOfRange { index, num_trees })
    }

    /// indices of the root cells that hold a tree, ascending
    pub fn tree_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.trees.keys().copied()
    }

    /// the trees that exist, with their root index, ascending
    pub fn trees(&self) -> impl Iterator<Item = (usize, &HyperTree)> + '_ {
        self.trees.iter().map(|(index, tree)| (*index, tree))
    }

    /// First global node index of every tree. Global indices number the nodes of all
    /// the trees one after the other, in ascending root index order.
    pub fn global_offsets(&self) -> BTreeMap<usize, usize> {
        let mut offset = 0;
        self.trees
            .iter()
            .map(|(index, tree)| {
                let first = offset;
                offset += tree.num_vertices();
                (*index, first)
            })
            .collect()
    }

    pub fn global_node_index(&self, tree: usize, node: usize) -> Option<usize> {
        if node >= self.trees.get(&tree)?.num_vertices() {
            return None;
        }
        let offset: usize = self.trees.range(..tree).map(|(_, tree)| tree.num_vertices()).sum();
        Some(offset + node)
    }

    /// Mask out nodes (`true` is masked), one flag per global node index. Set it once the
    /// trees are built, it must cover every node.
    pub fn set_material_mask(&mut self, mask: Vec<bool>) -> Result<(), HyperTreeError> {
        let expected = self.num_vertices();
        if mask.len() != expected {
            return Err(HyperTreeError::MaskLength {
                expected,
                actual: mask.len(),
            });
        }
        self.material_mask = mask;
        Ok(())
    }

    pub fn has_material_mask(&self) -> bool {
        !self.material_mask.is_empty()
    }

    pub fn material_mask(&self) -> &[bool] {
        &self.material_mask
    }

    pub fn clear_material_mask(&mut self) {
        self.material_mask.clear();
    }

    /// whether the node with the given global index is masked
    pub fn is_masked(&self, global_index: usize) -> bool {
        self.material_mask.get(global_index).copied().unwrap_or(false)
    }

    /// Per global node index: `true` when the node is masked or any of its descendants
    /// is. Empty without a material mask.
    pub fn pure_material_mask(&self) -> Vec<bool> {
        if !self.has_material_mask() {
            return Vec::new();
        }

        let mut pure = vec![false; self.material_mask.len()];
        for (index, offset) in self.global_offsets() {
            if let Some(tree) = self.trees.get(&index) {
                self.pure_mask_below(tree, tree.root(), offset, &mut pure);
            }
        }
        pure
    }

    fn pure_mask_below(&self, tree: &HyperTree, node: usize, offset: usize, pure: &mut [bool]) -> bool {
        let mut mask = self.is_masked(offset + node);
        if !mask && !tree.is_leaf(node) {
            for index in 0..tree.num_children() {
                if let Some(child) = tree.child(node, index) {
                    mask |= self.pure_mask_below(tree, child, offset, pure);
                }
            }
        }
        if let Some(slot) = pure.get_mut(offset + node) {
            *slot = mask;
        }
        mask
    }

    pub fn num_levels(&self) -> usize {
        self.trees.values().map(HyperTree::num_levels).max().unwrap_or(0)
    }

    pub fn num_vertices(&self) -> usize {
        self.trees.values().map(HyperTree::num_vertices).sum()
    }

    pub fn num_leaves(&self) -> usize {
        self.trees.values().map(HyperTree::num_leaves).sum()
    }

    /// `[x_min, x_max, y_min, y_max, z_min, z_max]` of the root grid
    pub fn bounds(&self) -> [f64; 6] {
        let mut bounds = [0.0; 6];
        for axis in 0..3 {
            let coords = &self.coordinates[axis];
            let first = coords.first().copied().unwrap_or(0.0);
            let last = coords.last().copied().unwrap_or(0.0);
            bounds[2 * axis] = first.min(last);
            bounds[2 * axis + 1] = first.max(last);
        }
        bounds
    }

    /// a cursor at the root of the tree of root cell `index`
    pub fn geometric_cursor(&self, index: usize) -> Option<GeometricCursor<'_>> {
        let ijk = self.level_zero_coordinates(index)?;

        let mut origin = [0.0; 3];
        let mut size = [0.0; 3];
        for axis in 0..3 {
            let coords = &self.coordinates[axis];
            origin[axis] = coords[ijk[axis]];
            size[axis] = coords[ijk[axis] + 1] - origin[axis];
        }

        Some(GeometricCursor {
            grid: self,
            tree_index: index,
            tree: self.tree(index),
            node: 0,
            origin,
            size,
            stack: Vec::new(),
        })
    }

    /// Locate the leaf containing `x`. Root cells without a tree are reported as their
    /// root node. `None` outside of the grid.
    pub fn find_point(&self, x: [f64; 3]) -> Option<NodeLocation> {
        let mut ijk = [0usize; 3];
        for axis in 0..3 {
            ijk[axis] = root_cell(&self.coordinates[axis], x[axis])?;
        }

        let index = self.root_index(ijk)?;
        let mut cursor = self.geometric_cursor(index)?;

        while !cursor.is_leaf() {
            let child = cursor.child_containing(x);
            if !cursor.to_child(child) {
                break;
            }
        }

        Some(NodeLocation {
            tree: index,
            node: cursor.node(),
        })
    }
}

/// index of the root cell along one axis whose range contains `x`
fn root_cell(coords: &[f64], x: f64) -> Option<usize> {
    let (first, last) = (*coords.first()?, *coords.last()?);
    if x < first.min(last) || x > first.max(last) {
        return None;
    }
    // number of boundaries strictly below x, minus the lower boundary of the first cell
    let below = coords.partition_point(|c| *c < x);
    Some(below.saturating_sub(1).min(coords.len().saturating_sub(2)))
}

/// A cursor that tracks the origin and size of the node it points at
#[derive(Debug, Clone)]
pub struct GeometricCursor<'a> {
    grid: &'a HyperTreeGrid,
    tree_index: usize,
    tree: Option<&'a HyperTree>,
    node: usize,
    origin: [f64; 3],
    size: [f64; 3],
    stack: Vec<(usize, [f64; 3], [f64; 3])>,
}

impl<'a> GeometricCursor<'a> {
    pub fn tree_index(&self) -> usize {
        self.tree_index
    }

    pub fn node(&self) -> usize {
        self.node
    }

    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    pub fn size(&self) -> [f64; 3] {
        self.size
    }

    pub fn bounds(&self) -> [f64; 6] {
        let mut bounds = [0.0; 6];
        for axis in 0..3 {
            bounds[2 * axis] = self.origin[axis];
            bounds[2 * axis + 1] = self.origin[axis] + self.size[axis];
        }
        bounds
    }

    pub fn center(&self) -> [f64; 3] {
        [0, 1, 2].map(|axis| self.origin[axis] + 0.5 * self.size[axis])
    }

    pub fn level(&self) -> usize {
        self.stack.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.tree.map_or(true, |tree| tree.is_leaf(self.node))
    }

    pub fn is_root(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn to_root(&mut self) {
        if let Some((node, origin, size)) = self.stack.first().copied() {
            self.node = node;
            self.origin = origin;
            self.size = size;
        }
        self.stack.clear();
    }

    /// Descend into child `index`. The digits of `index` in base `branch_factor` select
    /// the part along each refined axis, the first refined axis varying fastest.
    pub fn to_child(&mut self, index: usize) -> bool {
        let child = match self.tree.and_then(|tree| tree.child(self.node, index)) {
            Some(child) => child,
            None => return false,
        };

        self.stack.push((self.node, self.origin, self.size));

        let factor = self.grid.branch_factor;
        let mut digits = index;
        for axis in self.grid.refined_axes() {
            self.size[axis] /= factor as f64;
            self.origin[axis] += (digits % factor) as f64 * self.size[axis];
            digits /= factor;
        }
        self.node = child;
        true
    }

    pub fn to_parent(&mut self) -> bool {
        match self.stack.pop() {
            Some((node, origin, size)) => {
                self.node = node;
                self.origin = origin;
                self.size = size;
                true
            }
            None => false,
        }
    }

    /// the index of the child of the current node whose box contains `x`
    pub fn child_containing(&self, x: [f64; 3]) -> usize {
        let factor = self.grid.branch_factor;
        let mut index = 0;
        let mut place = 1;
        for axis in self.grid.refined_axes() {
            let part = self.size[axis] / factor as f64;
            let digit = if part > 0.0 {
                ((x[axis] - self.origin[axis]) / part).floor().max(0.0) as usize
            } else {
                0
            };
            index += digit.min(factor - 1) * place;
            place *= factor;
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_must_match_grid_size() {
        let err = HyperTreeGrid::new(2, 2, [2, 1, 1], [vec![0.0, 1.0], vec![0.0, 1.0], vec![0.0, 1.0]])
            .unwrap_err();
        assert_eq!(
            err,
            HyperTreeError::CoordinatesMismatch {
                axis: 0,
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn root_indexing() {
        let grid = HyperTreeGrid::uniform(3, 2, [3, 4, 5]).unwrap();
        assert_eq!(grid.root_index([1, 2, 3]), Some(1 + 2 * 3 + 3 * 12));
        assert_eq!(grid.level_zero_coordinates(1 + 2 * 3 + 3 * 12), Some([1, 2, 3]));
        assert_eq!(grid.shifted_root_index(0, [1, 1, 0]), Some(4));
        assert_eq!(grid.shifted_root_index(0, [-1, 0, 0]), None);

        let transposed = grid.with_transposed_root_indexing(true);
        assert_eq!(transposed.root_index([1, 2, 3]), Some(3 + 2 * 5 + 5 * 4));
        assert_eq!(transposed.level_zero_coordinates(3 + 2 * 5 + 5 * 4), Some([1, 2, 3]));
    }

    #[test]
    fn refined_axes_follow_orientation() {
        let line = HyperTreeGrid::uniform(1, 2, [1, 1, 1]).unwrap().with_orientation(1);
        assert_eq!(line.refined_axes(), vec![1]);
        let plane = HyperTreeGrid::uniform(2, 3, [1, 1, 1]).unwrap().with_orientation(0);
        assert_eq!(plane.refined_axes(), vec![1, 2]);
    }

    #[test]
    fn coordinates_must_increase() {
        let err = HyperTreeGrid::new(2, 2, [2, 1, 1], [vec![0.0, 2.0, 1.0], vec![0.0, 1.0], vec![0.0, 1.0]])
            .unwrap_err();
        assert_eq!(err, HyperTreeError::UnorderedCoordinates { axis: 0 });

        let err = HyperTreeGrid::new(2, 2, [1, 1, 1], [vec![0.0, 1.0], vec![f64::NAN, 1.0], vec![0.0, 1.0]])
            .unwrap_err();
        assert_eq!(err, HyperTreeError::UnorderedCoordinates { axis: 1 });
    }

    #[test]
    fn global_indices_and_pure_mask() {
        let mut grid = HyperTreeGrid::uniform(2, 2, [2, 1, 1]).unwrap().with_orientation(2);
        grid.tree_mut(0).unwrap().subdivide_leaf(0).unwrap();
        grid.tree_mut(1).unwrap();

        assert_eq!(grid.global_node_index(1, 0), Some(5));
        assert_eq!(grid.global_node_index(0, 5), None);
        assert_eq!(grid.global_offsets().into_iter().collect::<Vec<_>>(), vec![(0, 0), (1, 5)]);
        assert_eq!(grid.trees().map(|(index, _)| index).collect::<Vec<_>>(), vec![0, 1]);

        assert!(grid.pure_material_mask().is_empty());
        assert_eq!(
            grid.set_material_mask(vec![false; 3]),
            Err(HyperTreeError::MaskLength { expected: 6, actual: 3 })
        );

        grid.set_material_mask(vec![false, false, true, false, false, false]).unwrap();
        assert!(grid.has_material_mask());
        assert!(grid.is_masked(2));
        assert_eq!(grid.pure_material_mask(), vec![true, false, true, false, false, false]);
    }

    #[test]
    fn root_cell_lookup() {
        let coords = [0.0, 1.0, 3.0];
        assert_eq!(root_cell(&coords, 0.0), Some(0));
        assert_eq!(root_cell(&coords, 1.0), Some(0));
        assert_eq!(root_cell(&coords, 2.0), Some(1));
        assert_eq!(root_cell(&coords, 3.0), Some(1));
        assert_eq!(root_cell(&coords, 3.5), None);
    }
}
