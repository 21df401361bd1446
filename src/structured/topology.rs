use super::index::{cell_dimensions, cell_structured_coords, compute_cell_id, compute_point_id, point_structured_coords};

// the index offsets a cell spans along one axis
fn corner_offsets(dims: [usize; 3], axis: usize) -> &'static [usize] {
    if dims[axis] > 1 {
        &[0, 1]
    } else {
        &[0]
    }
}

/// The point ids of a cell, `i` varying fastest, then `j`, then `k`.
///
/// A voxel yields 8 points, a pixel 4, a line 2 and the single vertex cell of a one point
/// grid yields point `0`. Out of range cells (and empty grids) yield no points.
pub fn cell_points(cell_id: usize, dims: [usize; 3]) -> Vec<usize> {
    let cell = match cell_structured_coords(cell_id, dims) {
        Some(cell) => cell,
        None => return Vec::new(),
    };

    let mut points = Vec::with_capacity(8);
    for dk in corner_offsets(dims, 2) {
        for dj in corner_offsets(dims, 1) {
            for di in corner_offsets(dims, 0) {
                let ijk = [cell[0] + di, cell[1] + dj, cell[2] + dk];
                if let Some(id) = compute_point_id(dims, ijk) {
                    points.push(id);
                }
            }
        }
    }
    points
}

/// Every cell that uses the point `point_id`, in ascending order.
pub fn point_cells(point_id: usize, dims: [usize; 3]) -> Vec<usize> {
    let point = match point_structured_coords(point_id, dims) {
        Some(point) => point,
        None => return Vec::new(),
    };
    let cell_dims = cell_dimensions(dims);

    // candidate cell index along each axis: the cell below and the cell above the point
    let candidates = |axis: usize| -> Vec<usize> {
        if dims[axis] > 1 {
            let p = point[axis];
            [p.checked_sub(1), Some(p)]
                .into_iter()
                .flatten()
                .filter(|c| *c < cell_dims[axis])
                .collect()
        } else {
            vec![0]
        }
    };

    let (ci, cj, ck) = (candidates(0), candidates(1), candidates(2));

    let mut cells = Vec::with_capacity(8);
    for k in &ck {
        for j in &cj {
            for i in &ci {
                if let Some(id) = compute_cell_id(dims, [*i, *j, *k]) {
                    cells.push(id);
                }
            }
        }
    }
    cells.sort_unstable();
    cells
}

/// The cells, other than `cell_id`, that use every point in `point_ids`.
///
/// Passing the two points of an edge yields the cells around that edge, passing the
/// four points of a voxel face yields the (at most one) cell across that face.
pub fn cell_neighbors(cell_id: usize, point_ids: &[usize], dims: [usize; 3]) -> Vec<usize> {
    let (first, rest) = match point_ids.split_first() {
        Some(split) => split,
        None => return Vec::new(),
    };

    let mut shared = point_cells(*first, dims);
    for point in rest {
        if shared.is_empty() {
            break;
        }
        let cells = point_cells(*point, dims);
        shared.retain(|cell| cells.binary_search(cell).is_ok());
    }

    shared.retain(|cell| *cell != cell_id);
    shared
}

/// The cells sharing a face with `cell_id` (an edge end for lines), in ascending order.
pub fn face_neighbors(cell_id: usize, dims: [usize; 3]) -> Vec<usize> {
    let cell = match cell_structured_coords(cell_id, dims) {
        Some(cell) => cell,
        None => return Vec::new(),
    };

    let mut neighbors = Vec::with_capacity(6);
    for axis in (0..3).filter(|axis| dims[*axis] > 1) {
        if let Some(below) = cell[axis].checked_sub(1) {
            let mut ijk = cell;
            ijk[axis] = below;
            neighbors.extend(compute_cell_id(dims, ijk));
        }

        let mut ijk = cell;
        ijk[axis] += 1;
        neighbors.extend(compute_cell_id(dims, ijk));
    }
    neighbors.sort_unstable();
    neighbors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voxel_points() {
        let dims = [3, 3, 3];
        // cell (1, 0, 1)
        let cell = compute_cell_id(dims, [1, 0, 1]).unwrap();
        assert_eq!(
            cell_points(cell, dims),
            vec![10, 11, 13, 14, 19, 20, 22, 23]
        );
    }

    #[test]
    fn lower_dimensional_cells() {
        // xz plane, 3 x 1 x 2 points -> 2 pixels
        assert_eq!(cell_points(1, [3, 1, 2]), vec![1, 2, 4, 5]);
        // y line
        assert_eq!(cell_points(2, [1, 4, 1]), vec![2, 3]);
        // vertex
        assert_eq!(cell_points(0, [1, 1, 1]), vec![0]);
        assert!(cell_points(1, [1, 1, 1]).is_empty());
        assert!(cell_points(0, [0, 1, 1]).is_empty());
    }

    #[test]
    fn corner_and_interior_point_cells() {
        let dims = [3, 3, 1];
        assert_eq!(point_cells(0, dims), vec![0]);
        assert_eq!(point_cells(4, dims), vec![0, 1, 2, 3]);
        assert_eq!(point_cells(5, dims), vec![1, 3]);
        assert_eq!(point_cells(9, dims), Vec::<usize>::new());
    }

    #[test]
    fn neighbors_across_an_edge() {
        let dims = [3, 3, 1];
        // the shared edge between cell 0 and cell 1 is made of points 1 and 4
        assert_eq!(cell_neighbors(0, &[1, 4], dims), vec![1]);
        // the center point alone is shared by every cell
        assert_eq!(cell_neighbors(0, &[4], dims), vec![1, 2, 3]);
        assert_eq!(face_neighbors(0, dims), vec![1, 2]);
        assert_eq!(face_neighbors(3, dims), vec![1, 2]);
    }
}
