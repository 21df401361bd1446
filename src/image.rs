//! # Uniform grids
//!
//! An [`ImageGrid`] is a structured grid whose points are evenly spaced along each axis:
//! point `(i, j, k)` sits at `origin + (i, j, k) * spacing`. Point and cell ids are
//! relative to the first point of the [`Extent`], so a grid covering `10 20 0 5 0 0`
//! numbers its first point `0`.

use crate::extent::{CellType, DataDescription, Extent};
use crate::structured;
use num_traits::Float;

/// squared tolerance (relative to the squared spacing) used when locating points in
/// grids that are one point thick along an axis
const THIN_AXIS_TOLERANCE: f64 = 1e-12;

/// The result of locating a position in the cell structure of a grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructuredCoordinates {
    /// logical coordinates of the lowest corner of the cell
    pub ijk: [i32; 3],
    /// position inside the cell, each component in `[0, 1]` when in bounds
    pub pcoords: [f64; 3],
    /// whether the position lies inside the grid
    pub in_bounds: bool,
}

/// A cell found by [`ImageGrid::find_cell`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoundCell {
    pub cell_id: usize,
    pub pcoords: [f64; 3],
    /// trilinear interpolation weights of the eight voxel corners
    pub weights: [f64; 8],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageGrid {
    pub origin: [f64; 3],
    pub spacing: [f64; 3],
    pub extent: Extent,
}

impl Default for ImageGrid {
    fn default() -> Self {
        Self {
            origin: [0.0; 3],
            spacing: [1.0; 3],
            extent: Extent::new(0, -1, 0, -1, 0, -1),
        }
    }
}

impl ImageGrid {
    pub fn new(origin: [f64; 3], spacing: [f64; 3], extent: Extent) -> Self {
        Self {
            origin,
            spacing,
            extent,
        }
    }

    /// unit spaced grid at the origin with `nx * ny * nz` points
    pub fn from_dimensions(nx: usize, ny: usize, nz: usize) -> Self {
        Self::new([0.0; 3], [1.0; 3], Extent::from_dimensions(nx, ny, nz))
    }

    pub fn dimensions(&self) -> [usize; 3] {
        self.extent.dimensions()
    }

    pub fn description(&self) -> DataDescription {
        self.extent.description()
    }

    pub fn cell_type(&self) -> CellType {
        self.description().cell_type()
    }

    pub fn num_points(&self) -> usize {
        self.extent.num_points()
    }

    pub fn num_cells(&self) -> usize {
        self.extent.num_cells()
    }

    /// coordinates of the point with absolute logical coordinates `ijk`
    pub fn point_at(&self, ijk: [i32; 3]) -> [f64; 3] {
        [0, 1, 2].map(|axis| self.origin[axis] + ijk[axis] as f64 * self.spacing[axis])
    }

    pub fn point(&self, point_id: usize) -> Option<[f64; 3]> {
        let ijk = structured::point_structured_coords_for_extent(point_id, &self.extent)?;
        Some(self.point_at(ijk))
    }

    /// point ids of a cell, relative to the first point of the extent
    pub fn cell_points(&self, cell_id: usize) -> Vec<usize> {
        structured::cell_points(cell_id, self.dimensions())
    }

    /// `[x_min, x_max, y_min, y_max, z_min, z_max]`, `None` for an empty grid
    pub fn bounds(&self) -> Option<[f64; 6]> {
        if self.extent.is_empty() {
            return None;
        }

        let mut bounds = [0.0; 6];
        for axis in 0..3 {
            let a = self.origin[axis] + self.extent.start(axis) as f64 * self.spacing[axis];
            let b = self.origin[axis] + self.extent.end(axis) as f64 * self.spacing[axis];
            bounds[2 * axis] = a.min(b);
            bounds[2 * axis + 1] = a.max(b);
        }
        Some(bounds)
    }

    pub fn cell_bounds(&self, cell_id: usize) -> Option<[f64; 6]> {
        let points = self.cell_points(cell_id);
        let (first, rest) = points.split_first()?;
        let first = self.point(*first)?;

        let mut bounds = [first[0], first[0], first[1], first[1], first[2], first[2]];
        for point in rest.iter().filter_map(|id| self.point(*id)) {
            for axis in 0..3 {
                bounds[2 * axis] = bounds[2 * axis].min(point[axis]);
                bounds[2 * axis + 1] = bounds[2 * axis + 1].max(point[axis]);
            }
        }
        Some(bounds)
    }

    /// id of the point closest to `x`, `None` if `x` rounds to a point outside the extent
    pub fn find_point(&self, x: [f64; 3]) -> Option<usize> {
        let mut ijk = [0; 3];
        for axis in 0..3 {
            let d = (x[axis] - self.origin[axis]) / self.spacing[axis];
            ijk[axis] = (d + 0.5).floor() as i32;
        }
        structured::compute_point_id_for_extent(&self.extent, ijk)
    }

    /// Locate the cell that contains `x`.
    ///
    /// Positions exactly on the high boundary are placed in the last cell with a
    /// parametric coordinate of `1`. Along axes that are one point thick, positions within
    /// a tiny tolerance of the plane are considered inside.
    pub fn compute_structured_coordinates(&self, x: [f64; 3]) -> StructuredCoordinates {
        let bounds = self.bounds().unwrap_or([0.0; 6]);
        let mut ijk = [0i32; 3];
        let mut pcoords = [0.0; 3];
        let mut in_bounds = !self.extent.is_empty();

        for axis in 0..3 {
            let spacing = self.spacing[axis];
            let location = (x[axis] - self.origin[axis]) / spacing;
            ijk[axis] = location.floor() as i32;
            pcoords[axis] = location - ijk[axis] as f64;

            let min = self.extent.start(axis);
            let max = self.extent.end(axis);
            let (low, high) = (bounds[2 * axis], bounds[2 * axis + 1]);

            let axis_in_bounds = if min == max {
                let dist = x[axis] - low;
                if dist * dist <= spacing * spacing * THIN_AXIS_TOLERANCE {
                    pcoords[axis] = 0.0;
                    ijk[axis] = min;
                    true
                } else {
                    false
                }
            } else if ijk[axis] < min {
                if (spacing >= 0.0 && x[axis] >= low) || (spacing < 0.0 && x[axis] <= high) {
                    pcoords[axis] = 0.0;
                    ijk[axis] = min;
                    true
                } else {
                    false
                }
            } else if ijk[axis] >= max {
                if (spacing >= 0.0 && x[axis] <= high) || (spacing < 0.0 && x[axis] >= low) {
                    pcoords[axis] = 1.0;
                    ijk[axis] = max - 1;
                    true
                } else {
                    false
                }
            } else {
                true
            };

            in_bounds &= axis_in_bounds;
        }

        StructuredCoordinates {
            ijk,
            pcoords,
            in_bounds,
        }
    }

    /// Id of the cell with its lowest corner at the absolute logical coordinates `ijk`.
    pub fn compute_cell_id(&self, ijk: [i32; 3]) -> Option<usize> {
        structured::compute_cell_id_for_extent(&self.extent, ijk)
    }

    /// Find the cell containing `x`. Positions outside of the grid are accepted if their
    /// squared distance to the bounds is at most `tol2`, and are clamped onto the boundary.
    pub fn find_cell(&self, x: [f64; 3], tol2: f64) -> Option<FoundCell> {
        let bounds = self.bounds()?;
        let StructuredCoordinates {
            mut ijk,
            mut pcoords,
            in_bounds,
        } = self.compute_structured_coordinates(x);

        if !in_bounds {
            let mut dist2 = 0.0;
            for axis in 0..3 {
                let min = self.extent.start(axis);
                let max = self.extent.end(axis);
                let negative = usize::from(self.spacing[axis] < 0.0);
                let min_bound = bounds[2 * axis + negative];
                let max_bound = bounds[2 * axis + 1 - negative];

                if ijk[axis] < min {
                    ijk[axis] = min;
                    pcoords[axis] = 0.0;
                    let dist = x[axis] - min_bound;
                    dist2 += dist * dist;
                } else if ijk[axis] >= max {
                    if max == min {
                        ijk[axis] = min;
                        pcoords[axis] = 0.0;
                    } else {
                        ijk[axis] = max - 1;
                        pcoords[axis] = 1.0;
                    }
                    let dist = x[axis] - max_bound;
                    dist2 += dist * dist;
                }
            }

            if dist2 > tol2 {
                return None;
            }
        }

        // parametric coordinates are reported in the plane of the cell
        match self.description() {
            DataDescription::XZPlane => {
                pcoords = [pcoords[0], pcoords[2], 0.0];
            }
            DataDescription::YZPlane => {
                pcoords = [pcoords[1], pcoords[2], 0.0];
            }
            DataDescription::XYPlane => {
                pcoords[2] = 0.0;
            }
            _ => (),
        }

        let cell_id = self.compute_cell_id(ijk)?;

        Some(FoundCell {
            cell_id,
            pcoords,
            weights: voxel_weights(pcoords),
        })
    }

    /// Offsets (in values) to step one point along each axis for interleaved data with
    /// `components` values per point
    pub fn increments(&self, components: usize) -> [usize; 3] {
        let dims = self.dimensions();
        [components, components * dims[0], components * dims[0] * dims[1]]
    }

    /// The extra offsets needed, after finishing a row (y) or a slab (z) of `sub_extent`,
    /// to reach the start of the next row or slab.
    pub fn continuous_increments(&self, sub_extent: &Extent, components: usize) -> [usize; 3] {
        let inc = self.increments(components);
        let x0 = sub_extent.x_start.max(self.extent.x_start);
        let x1 = sub_extent.x_end.min(self.extent.x_end);
        let y0 = sub_extent.y_start.max(self.extent.y_start);
        let y1 = sub_extent.y_end.min(self.extent.y_end);

        let row = (x1 - x0 + 1).max(0) as usize * inc[0];
        let slab = (y1 - y0 + 1).max(0) as usize * inc[1];
        [0, inc[1].saturating_sub(row), inc[2].saturating_sub(slab)]
    }

    /// Gradient of a scalar point field at the point with absolute coordinates `ijk`,
    /// following the vtk sign convention: each component is `(f(x - h) - f(x + h)) / 2h`,
    /// the negated derivative. Use [`ImageGrid::point_derivative`] for the derivative itself.
    ///
    /// Central differences are used inside the grid and one-sided differences on its
    /// boundary. Axes with a single point (and points outside of the grid) have a
    /// gradient of zero.
    pub fn point_gradient<T: Float>(&self, ijk: [i32; 3], scalars: &[T]) -> [T; 3] {
        self.point_derivative(ijk, scalars).map(|d| -d)
    }

    /// Derivative of a scalar point field along each axis at `ijk`, with the same
    /// differencing as [`ImageGrid::point_gradient`] and the opposite sign
    pub fn point_derivative<T: Float>(&self, ijk: [i32; 3], scalars: &[T]) -> [T; 3] {
        let mut gradient = [T::zero(); 3];
        let dims = self.dimensions();

        if !self.extent.contains(ijk) {
            return gradient;
        }

        let value = |ijk: [i32; 3]| -> Option<T> {
            structured::compute_point_id_for_extent(&self.extent, ijk)
                .and_then(|id| scalars.get(id).copied())
        };

        for axis in 0..3 {
            if dims[axis] < 2 {
                continue;
            }

            let spacing = match T::from(self.spacing[axis]) {
                Some(spacing) => spacing,
                None => continue,
            };

            let mut plus = ijk;
            let mut minus = ijk;
            let mut scale = T::one();

            if ijk[axis] == self.extent.start(axis) {
                plus[axis] += 1;
            } else if ijk[axis] == self.extent.end(axis) {
                minus[axis] -= 1;
            } else {
                plus[axis] += 1;
                minus[axis] -= 1;
                scale = T::one() / (T::one() + T::one());
            }

            if let (Some(sp), Some(sm)) = (value(plus), value(minus)) {
                gradient[axis] = scale * (sp - sm) / spacing;
            }
        }

        gradient
    }

    /// Point gradients at the eight corners of the voxel whose lowest corner is `ijk`, `i`
    /// varying fastest. Corners outside of the grid have a zero gradient.
    pub fn voxel_gradient<T: Float>(&self, ijk: [i32; 3], scalars: &[T]) -> [[T; 3]; 8] {
        let mut gradients = [[T::zero(); 3]; 8];
        for (corner, gradient) in gradients.iter_mut().enumerate() {
            let corner = corner as i32;
            let point = [ijk[0] + (corner & 1), ijk[1] + ((corner >> 1) & 1), ijk[2] + ((corner >> 2) & 1)];
            *gradient = self.point_gradient(point, scalars);
        }
        gradients
    }

    /// A grid with the same geometry restricted to the part of `update_extent` that this
    /// grid covers. `None` if they do not overlap.
    pub fn crop(&self, update_extent: &Extent) -> Option<ImageGrid> {
        let extent = self.extent.intersection(update_extent)?;
        Some(Self::new(self.origin, self.spacing, extent))
    }
}

/// trilinear interpolation weights of the eight voxel corners, `i` varying fastest
pub fn voxel_weights(pcoords: [f64; 3]) -> [f64; 8] {
    let [r, s, t] = pcoords;
    let (rm, sm, tm) = (1.0 - r, 1.0 - s, 1.0 - t);

    [
        rm * sm * tm,
        r * sm * tm,
        rm * s * tm,
        r * s * tm,
        rm * sm * t,
        r * sm * t,
        rm * s * t,
        r * s * t,
    ]
}
