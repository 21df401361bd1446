use crate::amr::{AmrGeometry, AmrGridConnectivity, ConnectivityError, RefinementRatio};
use crate::array::{ArrayError, FieldData};
use crate::structured;
use crate::extent::{DataDescription, Extent};
use crate::image::ImageGrid;

#[derive(Debug, Default, Clone, PartialEq)]
/// Container type to read and write `.vti` files.
///
/// `ImageData` contains the geometry of a uniform grid together with the attributes
/// attached to its points and cells. Point data needs one tuple per point of the grid
/// extent and cell data one tuple per cell.
pub struct ImageData {
    pub grid: ImageGrid,
    pub point_data: FieldData,
    pub cell_data: FieldData,
}

impl ImageData {
    /// Construct an `ImageData` container for writing to a file
    pub fn new(grid: ImageGrid, point_data: FieldData, cell_data: FieldData) -> ImageData {
        ImageData {
            grid,
            point_data,
            cell_data,
        }
    }

    /// change the data stored in this container while leaving the grid constant
    pub fn with_data(self, point_data: FieldData, cell_data: FieldData) -> ImageData {
        ImageData {
            grid: self.grid,
            point_data,
            cell_data,
        }
    }

    /// Component `component` of the point array `name` at the absolute logical
    /// coordinates `ijk`. `None` if the array, the point or the component does not exist.
    pub fn scalar_component(&self, name: &str, ijk: [i32; 3], component: usize) -> Option<f64> {
        let array = self.point_data.get(name)?;
        let id = structured::compute_point_id_for_extent(&self.grid.extent, ijk)?;
        array.values().get((id, component)).copied()
    }

    /// overwrite component `component` of the point array `name` at `ijk`
    pub fn set_scalar_component(
        &mut self,
        name: &str,
        ijk: [i32; 3],
        component: usize,
        value: f64,
    ) -> Result<(), ArrayError> {
        let id = structured::compute_point_id_for_extent(&self.grid.extent, ijk);
        let array = self
            .point_data
            .get_mut(name)
            .ok_or_else(|| ArrayError::MissingArray { name: name.to_string() })?;

        let slot = id.and_then(|id| array.values_mut().get_mut((id, component)));
        match slot {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(ArrayError::OutOfRange {
                name: name.to_string(),
                tuple: id,
                component,
            }),
        }
    }
}

/// One `<DataSet>` entry of an overlapping AMR index file
#[derive(Debug, Clone, PartialEq)]
pub struct AmrIndexBlock {
    pub index: usize,
    /// the cells the block covers, in the index space of its level
    pub amr_box: Extent,
    pub file: Option<String>,
}

/// One `<Block>` (level) of an overlapping AMR index file
#[derive(Debug, Clone, PartialEq)]
pub struct AmrIndexLevel {
    pub spacing: [f64; 3],
    pub blocks: Vec<AmrIndexBlock>,
}

/// The contents of a `.vthb` overlapping AMR index
#[derive(Debug, Clone, PartialEq)]
pub struct AmrIndex {
    pub origin: [f64; 3],
    pub description: DataDescription,
    pub levels: Vec<AmrIndexLevel>,
}

impl AmrIndex {
    /// Describe the blocks of `amr` (after [`AmrGridConnectivity::compute_neighbors`]),
    /// placed in space by `geometry`.
    pub fn from_connectivity(amr: &AmrGridConnectivity, geometry: &AmrGeometry) -> AmrIndex {
        let description = amr.data_description();
        let num_levels = amr.max_level().map_or(0, |level| level + 1);

        let levels = (0..num_levels)
            .map(|level| AmrIndexLevel {
                spacing: geometry.spacing_at_level(level),
                blocks: amr
                    .grids_at_level(level)
                    .into_iter()
                    .enumerate()
                    .filter_map(|(index, id)| {
                        let extent = amr.grid_extent(id)?;
                        Some(AmrIndexBlock {
                            index,
                            amr_box: extent.cell_extent_for(description),
                            file: None,
                        })
                    })
                    .collect(),
            })
            .collect();

        AmrIndex {
            origin: geometry.origin,
            description,
            levels,
        }
    }

    /// Name the file of every block `"{prefix}/{prefix}_{level}_{index}.vti"`, the layout
    /// ParaView uses for multiblock output.
    pub fn with_file_prefix(mut self, prefix: &str) -> AmrIndex {
        for (level, blocks) in self.levels.iter_mut().enumerate() {
            for block in blocks.blocks.iter_mut() {
                block.file = Some(format!("{prefix}/{prefix}_{level}_{}.vti", block.index));
            }
        }
        self
    }

    pub fn num_blocks(&self) -> usize {
        self.levels.iter().map(|level| level.blocks.len()).sum()
    }

    /// The refinement ratio between consecutive levels, measured from their spacing along
    /// the first refined axis. A single level reports the default ratio of 2.
    pub fn refinement_ratio(&self) -> RefinementRatio {
        let axis = self.description.active_axes().first().copied().unwrap_or(0);

        let ratios: Vec<u32> = self
            .levels
            .windows(2)
            .map(|pair| {
                let coarse = pair[0].spacing[axis];
                let fine = pair[1].spacing[axis];
                if fine == 0.0 {
                    0
                } else {
                    (coarse / fine).round() as u32
                }
            })
            .collect();

        match ratios.first() {
            None => RefinementRatio::default(),
            Some(first) if ratios.iter().all(|ratio| ratio == first) => RefinementRatio::Constant(*first),
            Some(_) => RefinementRatio::PerLevel(ratios),
        }
    }

    /// The geometry of the hierarchy: the origin, the level 0 spacing and the refinement
    /// ratio between levels
    pub fn geometry(&self) -> AmrGeometry {
        let spacing = self.levels.first().map_or([1.0; 3], |level| level.spacing);
        AmrGeometry::new(self.origin, spacing, self.refinement_ratio())
    }

    /// Register every block (without data) with a new [`AmrGridConnectivity`]. Blocks are
    /// numbered level by level in file order.
    pub fn to_connectivity(&self) -> Result<AmrGridConnectivity, ConnectivityError> {
        let mut amr = AmrGridConnectivity::new(self.num_blocks(), self.refinement_ratio())?;

        let mut id = 0;
        for (level, blocks) in self.levels.iter().enumerate() {
            for block in &blocks.blocks {
                let extent = block.amr_box.point_extent_for(self.description);
                amr.register_grid(id, level, extent, FieldData::new(), FieldData::new())?;
                id += 1;
            }
        }

        Ok(amr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> AmrIndex {
        AmrIndex {
            origin: [0.0; 3],
            description: DataDescription::XYPlane,
            levels: vec![
                AmrIndexLevel {
                    spacing: [1.0, 1.0, 1.0],
                    blocks: vec![AmrIndexBlock {
                        index: 0,
                        amr_box: Extent::new(0, 3, 0, 3, 0, 0),
                        file: None,
                    }],
                },
                AmrIndexLevel {
                    spacing: [0.25, 0.25, 1.0],
                    blocks: vec![AmrIndexBlock {
                        index: 0,
                        amr_box: Extent::new(4, 7, 4, 7, 0, 0),
                        file: None,
                    }],
                },
            ],
        }
    }

    #[test]
    fn ratio_from_spacing() {
        assert_eq!(index().refinement_ratio(), RefinementRatio::Constant(4));
    }

    #[test]
    fn blocks_become_grids() {
        let mut amr = index().to_connectivity().unwrap();
        amr.compute_neighbors().unwrap();

        assert_eq!(amr.grid_extent(0), Some(Extent::new(0, 4, 0, 4, 0, 0)));
        assert_eq!(amr.grid_extent(1), Some(Extent::new(4, 8, 4, 8, 0, 0)));
        assert_eq!(amr.grid_level(1), Some(1));
        assert_eq!(amr.neighbors(0).len(), 1);
    }

    #[test]
    fn file_names() {
        let index = index().with_file_prefix("run");
        assert_eq!(index.levels[1].blocks[0].file.as_deref(), Some("run/run_1_0.vti"));
    }

    #[test]
    fn scalar_components() {
        use crate::array::FieldArray;

        let grid = ImageGrid::new([0.0; 3], [1.0; 3], Extent::new(1, 2, 0, 1, 0, 0));
        let points = FieldData::from_arrays(vec![FieldArray::from_slice(
            "v",
            2,
            &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
        )
        .unwrap()])
        .unwrap();
        let mut data = ImageData::new(grid, points, FieldData::new());

        assert_eq!(data.scalar_component("v", [2, 1, 0], 1), Some(7.0));
        assert_eq!(data.scalar_component("v", [0, 0, 0], 0), None);
        assert_eq!(data.scalar_component("v", [1, 0, 0], 2), None);
        assert_eq!(data.scalar_component("w", [1, 0, 0], 0), None);

        data.set_scalar_component("v", [1, 1, 0], 0, -1.0).unwrap();
        assert_eq!(data.scalar_component("v", [1, 1, 0], 0), Some(-1.0));

        assert!(matches!(
            data.set_scalar_component("v", [3, 0, 0], 0, 0.0),
            Err(ArrayError::OutOfRange { tuple: None, .. })
        ));
        assert!(matches!(
            data.set_scalar_component("w", [1, 0, 0], 0, 0.0),
            Err(ArrayError::MissingArray { .. })
        ));
    }
}
