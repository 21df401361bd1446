use vtk_structured::hypertree::{HyperTree, HyperTreeError, HyperTreeGrid, Neighborhood, NodeLocation};

/// 2 x 2 root cells in the xy plane. The upper right tree is refined twice in its
/// upper right corner.
fn refined_plane() -> HyperTreeGrid {
    let mut grid = HyperTreeGrid::uniform(2, 2, [2, 2, 1]).unwrap().with_orientation(2);

    let tree = grid.tree_mut(3).unwrap();
    let first = tree.subdivide_leaf(tree.root()).unwrap();
    tree.subdivide_leaf(first + 3).unwrap();

    grid
}

#[test]
fn tree_statistics() {
    let grid = refined_plane();
    let tree = grid.tree(3).unwrap();

    assert_eq!(tree.num_children(), 4);
    assert_eq!(tree.num_vertices(), 9);
    assert_eq!(tree.num_leaves(), 7);
    assert_eq!(tree.num_levels(), 3);
    assert_eq!(tree.leaves(), vec![1, 2, 3, 5, 6, 7, 8]);
    assert_eq!(tree.parent(8), Some(4));
    assert_eq!(tree.level(8), Some(2));

    assert_eq!(grid.tree_indices().collect::<Vec<_>>(), vec![3]);
    assert_eq!(grid.num_leaves(), 7);
    assert_eq!(grid.num_levels(), 3);
}

#[test]
fn refined_axes_follow_the_orientation() {
    let grid = refined_plane();
    assert_eq!(grid.refined_axes(), vec![0, 1]);

    let line = HyperTreeGrid::uniform(1, 3, [4, 1, 1]).unwrap().with_orientation(0);
    assert_eq!(line.refined_axes(), vec![0]);
}

#[test]
fn point_location() {
    let grid = refined_plane();

    assert_eq!(
        grid.find_point([1.9, 1.9, 0.5]),
        Some(NodeLocation { tree: 3, node: 8 })
    );
    assert_eq!(
        grid.find_point([1.2, 1.2, 0.5]),
        Some(NodeLocation { tree: 3, node: 1 })
    );

    // root cells without a tree are a single leaf
    assert_eq!(
        grid.find_point([0.5, 0.5, 0.5]),
        Some(NodeLocation { tree: 0, node: 0 })
    );
    assert_eq!(grid.find_point([2.5, 0.5, 0.5]), None);
}

#[test]
fn geometric_cursor_walk() {
    let grid = refined_plane();
    let mut cursor = grid.geometric_cursor(3).unwrap();

    assert!(cursor.is_root());
    assert_eq!(cursor.origin(), [1.0, 1.0, 0.0]);
    assert_eq!(cursor.size(), [1.0, 1.0, 1.0]);

    assert!(cursor.to_child(3));
    assert_eq!(cursor.origin(), [1.5, 1.5, 0.0]);
    assert_eq!(cursor.size(), [0.5, 0.5, 1.0]);
    assert!(!cursor.is_leaf());

    assert!(cursor.to_child(1));
    assert_eq!(cursor.level(), 2);
    assert_eq!(cursor.bounds(), [1.75, 2.0, 1.5, 1.75, 0.0, 1.0]);
    assert!(cursor.is_leaf());
    assert!(!cursor.to_child(0));

    assert!(cursor.to_parent());
    assert_eq!(cursor.node(), 4);

    assert_eq!(cursor.node(), 0);
    assert!(!cursor.to_parent());
}

#[test]
fn root_indexing() {
    let grid = HyperTreeGrid::uniform(3, 2, [2, 3, 4]).unwrap();
    assert_eq!(grid.num_trees(), 24);
    assert_eq!(grid.root_index([1, 0, 2]), Some(13));
    assert_eq!(grid.level_zero_coordinates(13), Some([1, 0, 2]));
    assert_eq!(grid.shifted_root_index(13, [-1, 1, 0]), Some(14));
    assert_eq!(grid.shifted_root_index(13, [0, -1, 0]), None);

    let transposed = grid.with_transposed_root_indexing(true);
    assert_eq!(transposed.root_index([1, 0, 2]), Some(14));
    assert_eq!(transposed.level_zero_coordinates(14), Some([1, 0, 2]));
}

#[test]
fn invalid_construction() {
    assert_eq!(HyperTree::new(4, 2), Err(HyperTreeError::InvalidBranchFactor(4)));
    assert_eq!(HyperTree::new(2, 0), Err(HyperTreeError::InvalidDimension(0)));
    assert!(matches!(
        HyperTreeGrid::new(2, 2, [2, 1, 1], [vec![0.0, 1.0], vec![0.0, 1.0], vec![0.0, 1.0]]),
        Err(HyperTreeError::CoordinatesMismatch { axis: 0, .. })
    ));

    let mut grid = HyperTreeGrid::uniform(2, 2, [1, 1, 1]).unwrap();
    assert!(grid.tree_mut(1).is_err());

    let tree = grid.tree_mut(0).unwrap();
    tree.subdivide_leaf(0).unwrap();
    assert_eq!(tree.subdivide_leaf(0), Err(HyperTreeError::NotALeaf(0)));
}

#[test]
fn unordered_coordinates_are_rejected() {
    assert_eq!(
        HyperTreeGrid::new(2, 2, [2, 1, 1], [vec![0.0, 1.0, 1.0], vec![0.0, 1.0], vec![0.0, 1.0]]),
        Err(HyperTreeError::UnorderedCoordinates { axis: 0 })
    );
}

#[test]
fn neighborhood_across_trees() {
    let mut grid = refined_plane();
    for index in 0..3 {
        grid.tree_mut(index).unwrap();
    }

    let mut cursor = grid.neighborhood_cursor(3, Neighborhood::VonNeumann).unwrap();
    // lower left child of the refined tree
    assert!(cursor.to_child(0));

    let west = cursor.neighbor([-1, 0, 0]).unwrap();
    assert_eq!((west.tree, west.node, west.level, west.leaf), (2, 0, 0, true));
    let south = cursor.neighbor([0, -1, 0]).unwrap();
    assert_eq!((south.tree, south.leaf), (1, true));
    assert_eq!(cursor.neighbor([1, 0, 0]).map(|n| n.node), Some(2));
    // diagonal neighbors are not part of a von Neumann neighborhood
    assert_eq!(cursor.neighbor([-1, -1, 0]), None);

    let mut moore = grid.neighborhood_cursor(3, Neighborhood::Moore).unwrap();
    assert!(moore.to_child(0));
    assert_eq!(moore.neighbor([-1, -1, 0]).map(|n| n.tree), Some(0));
}

#[test]
fn dual_grid_of_a_refined_plane() {
    let mut grid = refined_plane();
    for index in 0..3 {
        grid.tree_mut(index).unwrap();
    }
    let dual = grid.dual_grid();

    assert_eq!(dual.points().len(), grid.num_vertices());
    assert_eq!(dual.vertices_per_cell(), 4);
    assert!(dual.cells().all(|cell| cell.iter().all(|id| *id < grid.num_vertices())));

    // every dual point lies inside the grid
    let bounds = grid.bounds();
    for point in dual.points() {
        assert!(point[0] >= bounds[0] && point[0] <= bounds[1]);
        assert!(point[1] >= bounds[2] && point[1] <= bounds[3]);
    }
}

#[test]
fn material_mask() {
    let mut grid = refined_plane();
    assert!(!grid.has_material_mask());

    let mut mask = vec![false; grid.num_vertices()];
    mask[8] = true;
    grid.set_material_mask(mask).unwrap();

    let pure = grid.pure_material_mask();
    // the masked leaf and every node above it
    assert_eq!(
        pure.iter().enumerate().filter(|(_, m)| **m).map(|(id, _)| id).collect::<Vec<_>>(),
        vec![0, 4, 8]
    );

    grid.clear_material_mask();
    assert!(grid.pure_material_mask().is_empty());
}
