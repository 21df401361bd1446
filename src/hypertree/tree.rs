use super::HyperTreeError;

#[derive(Debug, Clone, PartialEq)]
struct Node {
    parent: Option<usize>,
    first_child: Option<usize>,
    level: usize,
}

/// A single refinement tree rooted in one cell of a [`HyperTreeGrid`](super::HyperTreeGrid)
#[derive(Debug, Clone, PartialEq)]
pub struct HyperTree {
    branch_factor: usize,
    dimension: usize,
    nodes: Vec<Node>,
    num_levels: usize,
    num_leaves: usize,
}

impl HyperTree {
    /// a tree made of a single leaf
    pub fn new(branch_factor: usize, dimension: usize) -> Result<Self, HyperTreeError> {
        if !(2..=3).contains(&branch_factor) {
            return Err(HyperTreeError::InvalidBranchFactor(branch_factor));
        }
        if !(1..=3).contains(&dimension) {
            return Err(HyperTreeError::InvalidDimension(dimension));
        }

        Ok(Self {
            branch_factor,
            dimension,
            nodes: vec![Node {
                parent: None,
                first_child: None,
                level: 0,
            }],
            num_levels: 1,
            num_leaves: 1,
        })
    }

    pub fn branch_factor(&self) -> usize {
        self.branch_factor
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// children of every refined node
    pub fn num_children(&self) -> usize {
        self.branch_factor.pow(self.dimension as u32)
    }

    pub fn root(&self) -> usize {
        0
    }

    /// Split a leaf into [`HyperTree::num_children`] new leaves and return the id of the
    /// first child. The remaining children follow it contiguously.
    pub fn subdivide_leaf(&mut self, node: usize) -> Result<usize, HyperTreeError> {
        let level = match self.nodes.get(node) {
            Some(Node { first_child: None, level, .. }) => *level,
            Some(_) => return Err(HyperTreeError::NotALeaf(node)),
            None => return Err(HyperTreeError::NodeOutOfRange(node)),
        };

        let first_child = self.nodes.len();
        let children = self.num_children();
        self.nodes.extend((0..children).map(|_| Node {
            parent: Some(node),
            first_child: None,
            level: level + 1,
        }));
        self.nodes[node].first_child = Some(first_child);

        self.num_leaves += children - 1;
        self.num_levels = self.num_levels.max(level + 2);

        Ok(first_child)
    }

    pub fn num_vertices(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    pub fn num_levels(&self) -> usize {
        self.num_levels
    }

    pub fn is_leaf(&self, node: usize) -> bool {
        self.nodes.get(node).map_or(false, |node| node.first_child.is_none())
    }

    pub fn level(&self, node: usize) -> Option<usize> {
        self.nodes.get(node).map(|node| node.level)
    }

    pub fn parent(&self, node: usize) -> Option<usize> {
        self.nodes.get(node).and_then(|node| node.parent)
    }

    /// the `index`-th child of `node`, `None` for leaves
    pub fn child(&self, node: usize, index: usize) -> Option<usize> {
        if index >= self.num_children() {
            return None;
        }
        let first = self.nodes.get(node)?.first_child?;
        Some(first + index)
    }

    /// ids of the leaves, in depth first order
    pub fn leaves(&self) -> Vec<usize> {
        let mut leaves = Vec::with_capacity(self.num_leaves);
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            match self.nodes[node].first_child {
                None => leaves.push(node),
                Some(first) => stack.extend((first..first + self.num_children()).rev()),
            }
        }
        leaves
    }

    pub fn cursor(&self) -> TreeCursor<'_> {
        TreeCursor {
            tree: self,
            node: self.root(),
        }
    }
}

/// Navigation over the nodes of a [`HyperTree`]
#[derive(Debug, Clone, Copy)]
pub struct TreeCursor<'a> {
    tree: &'a HyperTree,
    node: usize,
}

impl<'a> TreeCursor<'a> {
    pub fn node(&self) -> usize {
        self.node
    }

    pub fn tree(&self) -> &'a HyperTree {
        self.tree
    }

    pub fn is_leaf(&self) -> bool {
        self.tree.is_leaf(self.node)
    }

    pub fn is_root(&self) -> bool {
        self.node == self.tree.root()
    }

    pub fn level(&self) -> usize {
        self.tree.level(self.node).unwrap_or(0)
    }

    pub fn to_root(&mut self) {
        self.node = self.tree.root();
    }

    /// descend into a child, returns `false` (and stays put) at a leaf
    pub fn to_child(&mut self, index: usize) -> bool {
        match self.tree.child(self.node, index) {
            Some(child) => {
                self.node = child;
                true
            }
            None => false,
        }
    }

    /// returns `false` (and stays put) at the root
    pub fn to_parent(&mut self) -> bool {
        match self.tree.parent(self.node) {
            Some(parent) => {
                self.node = parent;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameters() {
        assert_eq!(HyperTree::new(4, 2), Err(HyperTreeError::InvalidBranchFactor(4)));
        assert_eq!(HyperTree::new(2, 0), Err(HyperTreeError::InvalidDimension(0)));
    }

    #[test]
    fn subdivide_counts() {
        let mut tree = HyperTree::new(3, 2).unwrap();
        assert_eq!(tree.num_children(), 9);

        let first = tree.subdivide_leaf(0).unwrap();
        assert_eq!(first, 1);
        assert_eq!(tree.subdivide_leaf(0), Err(HyperTreeError::NotALeaf(0)));

        tree.subdivide_leaf(first + 4).unwrap();
        assert_eq!(tree.num_vertices(), 1 + 9 + 9);
        assert_eq!(tree.num_leaves(), 8 + 9);
        assert_eq!(tree.num_levels(), 3);
        assert_eq!(tree.leaves().len(), tree.num_leaves());
    }

    #[test]
    fn cursor_navigation() {
        let mut tree = HyperTree::new(2, 3).unwrap();
        let first = tree.subdivide_leaf(0).unwrap();
        tree.subdivide_leaf(first + 7).unwrap();

        let mut cursor = tree.cursor();
        assert!(!cursor.is_leaf());
        assert!(cursor.to_child(7));
        assert_eq!(cursor.node(), 8);
        assert!(cursor.to_child(0));
        assert_eq!(cursor.level(), 2);
        assert!(cursor.is_leaf());
        assert!(!cursor.to_child(0));

        assert!(cursor.to_parent());
        assert!(cursor.to_parent());
        assert!(cursor.is_root());
        assert!(!cursor.to_parent());
    }
}
