use crate::extent::Extent;

/// The number of cells along each axis for a grid with `dims` points.
///
/// Empty axes have zero cells, single point axes keep one cell layer.
pub fn cell_dimensions(dims: [usize; 3]) -> [usize; 3] {
    if dims.iter().any(|d| *d == 0) {
        return [0; 3];
    }
    dims.map(|d| if d > 1 { d - 1 } else { 1 })
}

fn linear_id(dims: [usize; 3], ijk: [usize; 3]) -> Option<usize> {
    if (0..3).any(|axis| ijk[axis] >= dims[axis]) {
        return None;
    }
    // None only when the id itself does not fit a usize
    ijk[2]
        .checked_mul(dims[1])?
        .checked_add(ijk[1])?
        .checked_mul(dims[0])?
        .checked_add(ijk[0])
}

fn structured_coords(id: usize, dims: [usize; 3]) -> Option<[usize; 3]> {
    if dims.iter().any(|d| *d == 0) {
        return None;
    }
    let row = id / dims[0];
    let ijk = [id % dims[0], row % dims[1], row / dims[1]];
    (ijk[2] < dims[2]).then(|| ijk)
}

/// linear id of the point at `ijk`, relative to the first point of the grid
pub fn compute_point_id(dims: [usize; 3], ijk: [usize; 3]) -> Option<usize> {
    linear_id(dims, ijk)
}

/// linear id of the cell at `ijk` for a grid with `dims` points
pub fn compute_cell_id(dims: [usize; 3], ijk: [usize; 3]) -> Option<usize> {
    linear_id(cell_dimensions(dims), ijk)
}

/// inverse of [`compute_point_id`]
pub fn point_structured_coords(point_id: usize, dims: [usize; 3]) -> Option<[usize; 3]> {
    structured_coords(point_id, dims)
}

/// inverse of [`compute_cell_id`]
pub fn cell_structured_coords(cell_id: usize, dims: [usize; 3]) -> Option<[usize; 3]> {
    structured_coords(cell_id, cell_dimensions(dims))
}

fn relative(extent: &Extent, ijk: [i32; 3]) -> Option<[usize; 3]> {
    if !extent.contains(ijk) {
        return None;
    }
    Some([0, 1, 2].map(|axis| (ijk[axis] as i64 - extent.start(axis) as i64) as usize))
}

fn absolute(extent: &Extent, ijk: [usize; 3]) -> [i32; 3] {
    // `ijk` lies inside the extent, so the sum fits an i32
    [0, 1, 2].map(|axis| (extent.start(axis) as i64 + ijk[axis] as i64) as i32)
}

/// Linear id of the point with absolute coordinates `ijk` inside `extent`.
///
/// Passing a cell extent (see [`Extent::cell_extent`]) yields a cell id, which is how
/// cell-centered data of a sub-region is addressed.
pub fn compute_point_id_for_extent(extent: &Extent, ijk: [i32; 3]) -> Option<usize> {
    let local = relative(extent, ijk)?;
    compute_point_id(extent.dimensions(), local)
}

/// linear id of the cell whose lowest corner is the point `ijk` of `extent`
pub fn compute_cell_id_for_extent(extent: &Extent, ijk: [i32; 3]) -> Option<usize> {
    let dims = extent.dimensions();
    let local = relative(extent, ijk)?;
    compute_cell_id(dims, local)
}

/// inverse of [`compute_point_id_for_extent`]
pub fn point_structured_coords_for_extent(point_id: usize, extent: &Extent) -> Option<[i32; 3]> {
    let local = point_structured_coords(point_id, extent.dimensions())?;
    Some(absolute(extent, local))
}

/// inverse of [`compute_cell_id_for_extent`]
pub fn cell_structured_coords_for_extent(cell_id: usize, extent: &Extent) -> Option<[i32; 3]> {
    let local = cell_structured_coords(cell_id, extent.dimensions())?;
    Some(absolute(extent, local))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_ids_are_i_fastest() {
        let dims = [3, 4, 5];
        assert_eq!(compute_point_id(dims, [0, 0, 0]), Some(0));
        assert_eq!(compute_point_id(dims, [2, 0, 0]), Some(2));
        assert_eq!(compute_point_id(dims, [0, 1, 0]), Some(3));
        assert_eq!(compute_point_id(dims, [1, 2, 3]), Some(1 + 2 * 3 + 3 * 12));
        assert_eq!(compute_point_id(dims, [3, 0, 0]), None);
    }

    #[test]
    fn cell_ids_of_lower_dimensional_grids() {
        // a line along y: 4 points, 3 cells
        assert_eq!(compute_cell_id([1, 4, 1], [0, 2, 0]), Some(2));
        assert_eq!(compute_cell_id([1, 4, 1], [0, 3, 0]), None);
        // a single point has exactly one vertex cell
        assert_eq!(compute_cell_id([1, 1, 1], [0, 0, 0]), Some(0));
        assert_eq!(cell_dimensions([0, 3, 3]), [0, 0, 0]);
    }

    #[test]
    fn extent_relative_ids() {
        let extent = Extent::new(-2, 1, 3, 5, 0, 0);
        assert_eq!(compute_point_id_for_extent(&extent, [-2, 3, 0]), Some(0));
        assert_eq!(compute_point_id_for_extent(&extent, [0, 4, 0]), Some(2 + 4));
        assert_eq!(compute_point_id_for_extent(&extent, [2, 4, 0]), None);
        assert_eq!(point_structured_coords_for_extent(6, &extent), Some([0, 4, 0]));
        assert_eq!(compute_cell_id_for_extent(&extent, [0, 4, 0]), Some(2 + 3));
        assert_eq!(cell_structured_coords_for_extent(5, &extent), Some([0, 4, 0]));
    }

    #[test]
    fn ids_past_the_address_space() {
        let huge = [usize::MAX / 2, 4, 1];
        assert_eq!(compute_point_id(huge, [0, 3, 0]), None);
        assert_eq!(compute_point_id(huge, [7, 0, 0]), Some(7));
        assert_eq!(point_structured_coords(1, huge), Some([1, 0, 0]));
        assert_eq!(point_structured_coords(usize::MAX, [2, 2, 2]), None);

        let extent = Extent::new(i32::MIN, i32::MAX, 0, 0, 0, 0);
        assert_eq!(compute_point_id_for_extent(&extent, [i32::MAX, 0, 0]), Some(u32::MAX as usize));
        assert_eq!(point_structured_coords_for_extent(u32::MAX as usize, &extent), Some([i32::MAX, 0, 0]));
    }
}
