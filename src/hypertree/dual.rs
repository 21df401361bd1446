use super::grid::HyperTreeGrid;
use super::neighborhood::{NeighborNode, Neighborhood, NeighborhoodCursor};

use std::collections::BTreeMap;

/// The dual mesh of a [`HyperTreeGrid`]: one point per node (leaf centers, pushed onto
/// the boundary where a leaf touches it) and one cell per corner shared by leaves.
///
/// Points are indexed by global node index. Every cell lists `2 ^ dimension` point ids:
/// the leaf that owns the corner first, then its neighbors towards the corner in the
/// order of the refined axes, the first axis varying fastest. Next to a coarser leaf the
/// same id can appear more than once.
#[derive(Debug, Clone, PartialEq)]
pub struct DualGrid {
    points: Vec<[f64; 3]>,
    connectivity: Vec<usize>,
    vertices_per_cell: usize,
}

impl DualGrid {
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    pub fn vertices_per_cell(&self) -> usize {
        self.vertices_per_cell
    }

    pub fn num_cells(&self) -> usize {
        self.connectivity.len() / self.vertices_per_cell
    }

    pub fn cell(&self, cell: usize) -> Option<&[usize]> {
        let start = cell.checked_mul(self.vertices_per_cell)?;
        let end = start.checked_add(self.vertices_per_cell)?;
        self.connectivity.get(start..end)
    }

    pub fn cells(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.connectivity.chunks_exact(self.vertices_per_cell)
    }
}

impl HyperTreeGrid {
    /// Build the dual mesh.
    ///
    /// A corner becomes a dual cell when every leaf around it exists. Among leaves of the
    /// same level the one with the highest neighborhood position owns the corner, finer
    /// leaves win over coarser ones. With a material mask, masked leaves produce no
    /// cells, cells touching a masked leaf are dropped and points next to masked leaves
    /// move onto the shared face, edge or corner.
    pub fn dual_grid(&self) -> DualGrid {
        let offsets = self.global_offsets();
        let mut dual = DualGrid {
            points: vec![[0.0; 3]; self.num_vertices()],
            connectivity: Vec::new(),
            vertices_per_cell: 1 << self.dimension(),
        };

        for index in self.tree_indices() {
            if let Some(mut cursor) = self.neighborhood_cursor(index, Neighborhood::Moore) {
                self.traverse_dual(&mut cursor, &offsets, &mut dual);
            }
        }

        log::debug!(
            "dual grid with {} points and {} cells",
            dual.points.len(),
            dual.num_cells()
        );

        dual
    }

    fn traverse_dual(&self, cursor: &mut NeighborhoodCursor<'_>, offsets: &BTreeMap<usize, usize>, dual: &mut DualGrid) {
        let center = cursor.center();
        let global = |node: NeighborNode| offsets.get(&node.tree).map(|offset| offset + node.node);

        let id = match global(NeighborNode {
            tree: center.tree_index(),
            node: center.node(),
            level: center.level(),
            leaf: center.is_leaf(),
        }) {
            Some(id) => id,
            None => return,
        };

        if !cursor.is_leaf() {
            if let Some(point) = dual.points.get_mut(id) {
                *point = center.center();
            }
            for child in 0..self.branch_factor().pow(self.dimension() as u32) {
                if cursor.to_child(child) {
                    self.traverse_dual(cursor, offsets, dual);
                    cursor.to_parent();
                }
            }
            return;
        }

        let masked = |node: NeighborNode| global(node).map_or(false, |id| self.is_masked(id));
        // a neighbor the point moves towards
        let blocking = |node: Option<NeighborNode>| match node {
            None => true,
            Some(node) => self.has_material_mask() && node.leaf && masked(node),
        };

        let axes = cursor.axes().to_vec();
        let size = center.size();
        let mut point = center.center();

        if !self.is_masked(id) {
            // faces first, then edges, then corners. Without a mask only the faces matter
            let max_order = if self.has_material_mask() { axes.len() } else { 1 };
            for order in 1..=max_order {
                let mut shifted = false;
                for slot in 0..cursor.num_slots() {
                    let offset = cursor.offset(slot);
                    if offset.iter().filter(|o| **o != 0).count() != order || !blocking(cursor.slot_neighbor(slot)) {
                        continue;
                    }
                    for (a, axis) in axes.iter().enumerate() {
                        point[*axis] += 0.5 * offset[a] as f64 * size[*axis];
                    }
                    shifted = true;
                }
                if shifted {
                    break;
                }
            }
        }

        if let Some(slot) = dual.points.get_mut(id) {
            *slot = point;
        }

        if self.is_masked(id) {
            return;
        }

        let level = cursor.level();
        let center_slot = cursor.center_slot();
        let corners = 1usize << axes.len();

        for corner in 0..corners {
            let mut ids = Vec::with_capacity(corners);
            let mut owner = true;

            for vertex in 0..corners {
                // offset from the center towards the corner, for the axes set in `vertex`
                let offset: Vec<i32> = (0..axes.len())
                    .map(|a| match (vertex >> a & 1, corner >> a & 1) {
                        (0, _) => 0,
                        (_, 0) => -1,
                        _ => 1,
                    })
                    .collect();
                let slot = offset.iter().rev().fold(0, |slot, o| slot * 3 + (o + 1) as usize);

                if slot == center_slot {
                    ids.push(id);
                    continue;
                }

                match cursor.slot_neighbor(slot) {
                    Some(node) if node.leaf && !masked(node) && !(node.level == level && slot > center_slot) => {
                        match global(node) {
                            Some(neighbor) => ids.push(neighbor),
                            None => owner = false,
                        }
                    }
                    _ => owner = false,
                }

                if !owner {
                    break;
                }
            }

            if owner {
                dual.connectivity.extend(ids);
            }
        }
    }
}
