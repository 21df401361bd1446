use super::neighbor::{self, AmrNeighbor, BlockFace, BlockTopology, Relationship};
use super::refine::{self, RefinementRatio};
use super::{ConnectivityError, GhostArray, DUPLICATE_CELL, DUPLICATE_POINT, REFINED_CELL};
use crate::array::FieldData;
use crate::extent::{DataDescription, Extent};
use crate::structured;

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq)]
struct RegisteredGrid {
    level: usize,
    extent: Extent,
    point_data: FieldData,
    cell_data: FieldData,
}

/// A grid grown by the requested number of ghost layers, together with its data and
/// ghost flags over the grown extent
#[derive(Debug, Clone, PartialEq)]
pub struct GhostedGrid {
    pub extent: Extent,
    pub point_data: FieldData,
    pub cell_data: FieldData,
    pub point_ghosts: GhostArray,
    pub cell_ghosts: GhostArray,
}

/// Neighbor detection and ghost layer generation for the blocks of an overlapping AMR
/// hierarchy.
///
/// Every grid has to be registered with [`register_grid`](Self::register_grid) before
/// [`compute_neighbors`](Self::compute_neighbors) is called. Cell data of ghost cells is
/// taken from the finest neighbor that covers it. Point data is only copied for the
/// points of the registered extent; ghost points are zero filled.
///
/// All grids are expected to carry the same arrays in the same order.
#[derive(Debug, Clone)]
pub struct AmrGridConnectivity {
    ratio: RefinementRatio,
    balanced_refinement: bool,
    grids: Vec<Option<RegisteredGrid>>,
    // level -> grid ids
    hierarchy: BTreeMap<usize, BTreeSet<usize>>,
    whole_extent: Extent,
    description: DataDescription,
    neighbors: Vec<Vec<AmrNeighbor>>,
    topology: Vec<BlockTopology>,
    point_ghosts: Vec<GhostArray>,
    cell_ghosts: Vec<GhostArray>,
    neighbors_computed: bool,
    ghost_layers: usize,
    ghosted: Vec<GhostedGrid>,
}

impl AmrGridConnectivity {
    pub fn new(num_grids: usize, ratio: RefinementRatio) -> Result<Self, ConnectivityError> {
        if num_grids == 0 {
            return Err(ConnectivityError::NoGrids);
        }
        ratio.validate()?;

        Ok(Self {
            ratio,
            balanced_refinement: true,
            grids: vec![None; num_grids],
            hierarchy: BTreeMap::new(),
            whole_extent: Extent::default(),
            description: DataDescription::Empty,
            neighbors: vec![Vec::new(); num_grids],
            topology: vec![BlockTopology::default(); num_grids],
            point_ghosts: Vec::new(),
            cell_ghosts: Vec::new(),
            neighbors_computed: false,
            ghost_layers: 0,
            ghosted: Vec::new(),
        })
    }

    /// When enabled (the default), adjacent grids are assumed to differ by at most one
    /// level and pairs further apart are never compared.
    pub fn set_balanced_refinement(&mut self, balanced: bool) {
        self.balanced_refinement = balanced;
        self.neighbors_computed = false;
    }

    pub fn balanced_refinement(&self) -> bool {
        self.balanced_refinement
    }

    pub fn refinement_ratio(&self) -> &RefinementRatio {
        &self.ratio
    }

    pub fn num_grids(&self) -> usize {
        self.grids.len()
    }

    /// Register (or replace) grid `id` at `level`. Empty field data is accepted, otherwise
    /// the point and cell data must have one tuple per point and cell of `extent`.
    pub fn register_grid(
        &mut self,
        id: usize,
        level: usize,
        extent: Extent,
        point_data: FieldData,
        cell_data: FieldData,
    ) -> Result<(), ConnectivityError> {
        let num_grids = self.grids.len();
        if id >= num_grids {
            return Err(ConnectivityError::GridOutOfRange { id, num_grids });
        }
        if extent.is_empty() {
            return Err(ConnectivityError::EmptyExtent(id));
        }

        check_tuples(id, "point", extent.num_points(), &point_data)?;
        check_tuples(id, "cell", extent.num_cells(), &cell_data)?;

        if let Some(previous) = self.grids[id].take() {
            if let Some(ids) = self.hierarchy.get_mut(&previous.level) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.hierarchy.remove(&previous.level);
                }
            }
        }

        self.hierarchy.entry(level).or_default().insert(id);
        self.grids[id] = Some(RegisteredGrid {
            level,
            extent,
            point_data,
            cell_data,
        });
        self.neighbors_computed = false;

        Ok(())
    }

    /// Compute the whole extent and data description of the hierarchy, the block topology
    /// of every grid, the neighbors of every grid and the ghost flags of the registered
    /// extents.
    pub fn compute_neighbors(&mut self) -> Result<(), ConnectivityError> {
        if let Some(id) = self.grids.iter().position(Option::is_none) {
            return Err(ConnectivityError::UnregisteredGrid(id));
        }

        self.compute_whole_extent()?;

        let num_grids = self.grids.len();
        self.neighbors = vec![Vec::new(); num_grids];
        self.topology = vec![BlockTopology::default(); num_grids];
        self.ghosted.clear();
        self.ghost_layers = 0;

        for i in 0..num_grids {
            self.set_block_topology(i)?;
            for j in i + 1..num_grids {
                self.establish_neighbors(i, j)?;
            }
        }

        self.point_ghosts = Vec::with_capacity(num_grids);
        self.cell_ghosts = Vec::with_capacity(num_grids);
        for id in 0..num_grids {
            let grid = self.registered(id)?;
            let point_ghosts = GhostArray::zeros(grid.extent.num_points());
            let cell_extent = self.cell_extent(&grid.extent);
            let cell_ghosts = self.refined_cell_flags(id, &cell_extent, |_| 0);

            self.point_ghosts.push(point_ghosts);
            self.cell_ghosts.push(cell_ghosts);
        }

        self.neighbors_computed = true;
        log::debug!(
            "computed {} neighbor pairs for {} grids over {} levels, whole extent `{}`",
            self.neighbors.iter().map(Vec::len).sum::<usize>() / 2,
            num_grids,
            self.hierarchy.len(),
            self.whole_extent
        );

        Ok(())
    }

    /// Grow every grid by `layers` on each face that touches another block, and fill the
    /// new cells with data from the neighbors.
    ///
    /// Calling this again replaces the previous ghost layers.
    pub fn create_ghost_layers(&mut self, layers: usize) -> Result<(), ConnectivityError> {
        if layers == 0 {
            log::warn!("0 ghost layers requested, no ghost layers will be created");
            return Ok(());
        }
        if !self.neighbors_computed {
            return Err(ConnectivityError::NeighborsNotComputed);
        }

        let ghosted = (0..self.grids.len())
            .map(|id| self.build_ghosted_grid(id, layers))
            .collect::<Result<Vec<_>, _>>()?;

        self.ghosted = ghosted;
        self.ghost_layers = layers;

        log::debug!(
            "created {} ghost layer(s) for {} grids",
            layers,
            self.ghosted.len()
        );

        Ok(())
    }

    /// the bounding extent of every level 0 grid
    pub fn whole_extent(&self) -> Extent {
        self.whole_extent
    }

    /// the whole extent expressed in the index space of `level`
    pub fn whole_extent_at_level(&self, level: usize) -> Extent {
        refine::refine_extent(&self.whole_extent, self.description, self.ratio.factor(0, level))
    }

    pub fn data_description(&self) -> DataDescription {
        self.description
    }

    pub fn data_dimension(&self) -> usize {
        self.description.dimension()
    }

    pub fn grid_level(&self, id: usize) -> Option<usize> {
        self.grid(id).map(|grid| grid.level)
    }

    pub fn grid_extent(&self, id: usize) -> Option<Extent> {
        self.grid(id).map(|grid| grid.extent)
    }

    pub fn grid_point_data(&self, id: usize) -> Option<&FieldData> {
        self.grid(id).map(|grid| &grid.point_data)
    }

    pub fn grid_cell_data(&self, id: usize) -> Option<&FieldData> {
        self.grid(id).map(|grid| &grid.cell_data)
    }

    /// neighbors of grid `id`, in the order they were found
    pub fn neighbors(&self, id: usize) -> &[AmrNeighbor] {
        self.neighbors.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn block_topology(&self, id: usize) -> Option<BlockTopology> {
        self.topology.get(id).copied()
    }

    pub fn max_level(&self) -> Option<usize> {
        self.hierarchy.keys().next_back().copied()
    }

    pub fn num_levels(&self) -> usize {
        self.hierarchy.len()
    }

    /// ids of the grids registered at `level`, ascending
    pub fn grids_at_level(&self, level: usize) -> Vec<usize> {
        self.hierarchy
            .get(&level)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// ghost flags of the points of the registered extent, available after
    /// [`compute_neighbors`](Self::compute_neighbors)
    pub fn point_ghost_array(&self, id: usize) -> Option<&GhostArray> {
        self.point_ghosts.get(id)
    }

    /// ghost flags of the cells of the registered extent. Cells covered by a child carry
    /// [`REFINED_CELL`].
    pub fn cell_ghost_array(&self, id: usize) -> Option<&GhostArray> {
        self.cell_ghosts.get(id)
    }

    pub fn ghost_layers(&self) -> usize {
        self.ghost_layers
    }

    pub fn ghosted_grid(&self, id: usize) -> Option<&GhostedGrid> {
        self.ghosted.get(id)
    }

    pub fn ghosted_extent(&self, id: usize) -> Option<Extent> {
        self.ghosted.get(id).map(|grid| grid.extent)
    }

    fn grid(&self, id: usize) -> Option<&RegisteredGrid> {
        self.grids.get(id).and_then(Option::as_ref)
    }

    fn registered(&self, id: usize) -> Result<&RegisteredGrid, ConnectivityError> {
        self.grid(id).ok_or(ConnectivityError::UnregisteredGrid(id))
    }

    fn cell_extent(&self, extent: &Extent) -> Extent {
        extent.cell_extent_for(self.description)
    }

    fn compute_whole_extent(&mut self) -> Result<(), ConnectivityError> {
        let roots = self
            .hierarchy
            .get(&0)
            .ok_or(ConnectivityError::MissingRootLevel)?;

        let mut whole: Option<Extent> = None;
        for id in roots {
            let extent = self.registered(*id)?.extent;
            whole = Some(match whole {
                None => extent,
                Some(mut whole) => {
                    for axis in 0..3 {
                        whole.set_start(axis, whole.start(axis).min(extent.start(axis)));
                        whole.set_end(axis, whole.end(axis).max(extent.end(axis)));
                    }
                    whole
                }
            });
        }

        self.whole_extent = whole.ok_or(ConnectivityError::MissingRootLevel)?;
        self.description = self.whole_extent.description();
        Ok(())
    }

    /// a face is connected if the grid does not reach the domain boundary on that side
    fn set_block_topology(&mut self, id: usize) -> Result<(), ConnectivityError> {
        let grid = self.registered(id)?;
        let coarse = refine::coarsen_extent(
            &grid.extent,
            self.description,
            self.ratio.factor(grid.level, 0),
        );

        let mut topology = BlockTopology::default();
        for axis in 0..3 {
            if coarse.start(axis) > self.whole_extent.start(axis) {
                topology.add_connection(BlockFace::from_axis(axis, false));
            }
            if coarse.end(axis) < self.whole_extent.end(axis) {
                topology.add_connection(BlockFace::from_axis(axis, true));
            }
        }

        self.topology[id] = topology;
        Ok(())
    }

    fn establish_neighbors(&mut self, i: usize, j: usize) -> Result<(), ConnectivityError> {
        let (level_i, extent_i) = {
            let grid = self.registered(i)?;
            (grid.level, grid.extent)
        };
        let (level_j, extent_j) = {
            let grid = self.registered(j)?;
            (grid.level, grid.extent)
        };

        let level_diff = level_i.abs_diff(level_j);
        if self.balanced_refinement && level_diff > 1 {
            return Ok(());
        }

        // both extents are compared in the index space of the finer grid
        let fine_level = level_i.max(level_j);
        let factor_i = self.ratio.factor(level_i, fine_level);
        let factor_j = self.ratio.factor(level_j, fine_level);
        let fine_i = refine::refine_extent(&extent_i, self.description, factor_i);
        let fine_j = refine::refine_extent(&extent_j, self.description, factor_j);

        let overlap = match fine_i.intersection(&fine_j) {
            Some(overlap) => overlap,
            None => return Ok(()),
        };

        let touching = overlap.dimension() < self.data_dimension();

        let (relationship_i, relationship_j) = match (touching, level_i.cmp(&level_j)) {
            (true, Ordering::Equal) => (Relationship::SameLevelSibling, Relationship::SameLevelSibling),
            (true, Ordering::Less) => (Relationship::CoarseToFineSibling, Relationship::FineToCoarseSibling),
            (true, Ordering::Greater) => (Relationship::FineToCoarseSibling, Relationship::CoarseToFineSibling),
            (false, Ordering::Equal) => {
                return Err(ConnectivityError::OverlappingSiblings { grid: i, neighbor: j });
            }
            (false, _) if level_diff > 1 => {
                log::trace!(
                    "grids {} and {} overlap across {} levels, not linking them",
                    i,
                    j,
                    level_diff
                );
                return Ok(());
            }
            (false, Ordering::Less) => parent_child(overlap == fine_j),
            (false, Ordering::Greater) => {
                let (child, parent) = parent_child(overlap == fine_i);
                (parent, child)
            }
        };

        let overlap_i = refine::coarsen_extent(&overlap, self.description, factor_i);
        let overlap_j = refine::coarsen_extent(&overlap, self.description, factor_j);

        self.neighbors[i].push(AmrNeighbor {
            neighbor_id: j,
            grid_level: level_i,
            neighbor_level: level_j,
            grid_overlap: overlap_i,
            neighbor_overlap: overlap_j,
            orientation: neighbor::orientation(&fine_i, &fine_j, &overlap, self.description),
            relationship: relationship_i,
        });
        self.neighbors[j].push(AmrNeighbor {
            neighbor_id: i,
            grid_level: level_j,
            neighbor_level: level_i,
            grid_overlap: overlap_j,
            neighbor_overlap: overlap_i,
            orientation: neighbor::orientation(&fine_j, &fine_i, &overlap, self.description),
            relationship: relationship_j,
        });

        Ok(())
    }

    /// the registered extent of `id` grown by `layers` on every connected face, clamped to
    /// the whole extent
    fn ghosted_extent_for(&self, id: usize, layers: usize) -> Result<Extent, ConnectivityError> {
        let grid = self.registered(id)?;
        let whole = self.whole_extent_at_level(grid.level);
        let layers = i32::try_from(layers).unwrap_or(i32::MAX);

        let mut extent = grid.extent;
        for face in self.topology[id].connected_faces() {
            let axis = face.axis();
            if !self.description.is_axis_active(axis) {
                continue;
            }
            if face.is_high() {
                let end = extent.end(axis).saturating_add(layers).min(whole.end(axis));
                extent.set_end(axis, end.max(extent.end(axis)));
            } else {
                let start = extent.start(axis).saturating_sub(layers).max(whole.start(axis));
                extent.set_start(axis, start.min(extent.start(axis)));
            }
        }
        Ok(extent)
    }

    /// ghost flags for the cells of `cells`, starting from `initial` and adding
    /// [`REFINED_CELL`] wherever a child of `id` covers the cell
    fn refined_cell_flags<F>(&self, id: usize, cells: &Extent, initial: F) -> GhostArray
    where
        F: Fn([i32; 3]) -> u8,
    {
        let mut flags: GhostArray = cells.iter().map(initial).collect::<Vec<_>>().into();

        for neighbor in self.neighbors(id).iter().filter(|n| n.relationship.is_child()) {
            let covered = self.cell_extent(&neighbor.grid_overlap);
            let covered = match covered.intersection(cells) {
                Some(covered) => covered,
                None => continue,
            };

            for ijk in covered.iter() {
                if let Some(index) = structured::compute_point_id_for_extent(cells, ijk) {
                    flags.set_flag(index, REFINED_CELL);
                }
            }
        }

        flags
    }

    fn build_ghosted_grid(&self, id: usize, layers: usize) -> Result<GhostedGrid, ConnectivityError> {
        let grid = self.registered(id)?;
        let extent = self.ghosted_extent_for(id, layers)?;
        let registered_cells = self.cell_extent(&grid.extent);
        let ghosted_cells = self.cell_extent(&extent);

        let point_ghosts: GhostArray = extent
            .iter()
            .map(|ijk| if grid.extent.contains(ijk) { 0 } else { DUPLICATE_POINT })
            .collect::<Vec<_>>()
            .into();
        let cell_ghosts = self.refined_cell_flags(id, &ghosted_cells, |ijk| {
            if registered_cells.contains(ijk) {
                0
            } else {
                DUPLICATE_CELL
            }
        });

        let mut point_data = grid.point_data.zeros_like(extent.num_points());
        for ijk in grid.extent.iter() {
            let source = structured::compute_point_id_for_extent(&grid.extent, ijk);
            let target = structured::compute_point_id_for_extent(&extent, ijk);
            if let (Some(source), Some(target)) = (source, target) {
                point_data.copy_tuple(&grid.point_data, source, target);
            }
        }

        let mut cell_data = grid.cell_data.zeros_like(ghosted_cells.num_points());
        for ijk in registered_cells.iter() {
            let source = structured::compute_point_id_for_extent(&registered_cells, ijk);
            let target = structured::compute_point_id_for_extent(&ghosted_cells, ijk);
            if let (Some(source), Some(target)) = (source, target) {
                cell_data.copy_tuple(&grid.cell_data, source, target);
            }
        }

        self.fill_ghost_cells(id, &registered_cells, &ghosted_cells, &mut cell_data)?;

        Ok(GhostedGrid {
            extent,
            point_data,
            cell_data,
            point_ghosts,
            cell_ghosts,
        })
    }

    /// Fill the ghost cells of `id` from its neighbors. A ghost cell keeps the value of
    /// the finest donor level seen so far; on equal levels the first donor wins.
    fn fill_ghost_cells(
        &self,
        id: usize,
        registered_cells: &Extent,
        ghosted_cells: &Extent,
        cell_data: &mut FieldData,
    ) -> Result<(), ConnectivityError> {
        let grid = self.registered(id)?;
        let mut donor_level: Vec<Option<usize>> = vec![None; ghosted_cells.num_points()];

        for neighbor in self.neighbors(id) {
            // a child lies inside the grid and has nothing to offer to the ghost region
            if neighbor.relationship == Relationship::Child {
                continue;
            }

            let donor = self.registered(neighbor.neighbor_id)?;
            let donor_cells = self.cell_extent(&donor.extent);
            let mut filled = 0usize;

            for ijk in ghosted_cells.iter() {
                if registered_cells.contains(ijk) {
                    continue;
                }

                let target = match structured::compute_point_id_for_extent(ghosted_cells, ijk) {
                    Some(target) => target,
                    None => continue,
                };
                if matches!(donor_level[target], Some(level) if level >= neighbor.neighbor_level) {
                    continue;
                }

                let sources = self.donor_cells(grid.level, neighbor.neighbor_level, ijk, &donor_cells);
                if sources.is_empty() {
                    continue;
                }

                // a single source is a plain copy
                cell_data.average_tuples(&donor.cell_data, &sources, target);
                donor_level[target] = Some(neighbor.neighbor_level);
                filled += 1;
            }

            log::trace!(
                "grid {} received {} ghost cells from {} ({})",
                id,
                filled,
                neighbor.neighbor_id,
                neighbor.relationship
            );
        }

        Ok(())
    }

    /// the ids (in `donor_cells`) of the donor cells covering cell `ijk` of a grid at
    /// `level`
    fn donor_cells(&self, level: usize, donor_level: usize, ijk: [i32; 3], donor_cells: &Extent) -> Vec<usize> {
        match level.cmp(&donor_level) {
            Ordering::Equal => structured::compute_point_id_for_extent(donor_cells, ijk)
                .into_iter()
                .collect(),
            // coarser donor: inject the value of the coarse cell
            Ordering::Greater => {
                let factor = self.ratio.factor(donor_level, level);
                let coarse = refine::coarsen_cell(ijk, self.description, factor);
                structured::compute_point_id_for_extent(donor_cells, coarse)
                    .into_iter()
                    .collect()
            }
            // finer donor: average every fine cell inside the cell
            Ordering::Less => {
                let factor = self.ratio.factor(level, donor_level);
                let range = refine::cell_refined_extent(ijk, self.description, factor);
                match range.intersection(donor_cells) {
                    Some(range) => range
                        .iter()
                        .filter_map(|fine| structured::compute_point_id_for_extent(donor_cells, fine))
                        .collect(),
                    None => Vec::new(),
                }
            }
        }
    }
}

/// relationships of the coarse and the fine grid of an overlapping pair
fn parent_child(fine_is_covered: bool) -> (Relationship, Relationship) {
    if fine_is_covered {
        (Relationship::Child, Relationship::Parent)
    } else {
        (Relationship::PartiallyOverlappingChild, Relationship::PartiallyOverlappingParent)
    }
}

fn check_tuples(
    id: usize,
    kind: &'static str,
    expected: usize,
    data: &FieldData,
) -> Result<(), ConnectivityError> {
    match data.num_tuples() {
        Some(actual) if actual != expected => Err(ConnectivityError::TupleMismatch {
            id,
            kind,
            expected,
            actual,
        }),
        _ => Ok(()),
    }
}
