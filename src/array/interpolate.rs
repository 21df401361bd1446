//! conversions between point-centered and cell-centered attributes through the implicit
//! adjacency of a structured grid

use super::FieldData;
use crate::extent::Extent;
use crate::structured;

/// Average the point values around each cell of `extent` into a cell value.
pub fn point_data_to_cell_data(point_data: &FieldData, extent: &Extent) -> FieldData {
    let dims = extent.dimensions();
    let mut cell_data = point_data.zeros_like(extent.num_cells());

    for cell in 0..extent.num_cells() {
        let points = structured::cell_points(cell, dims);
        cell_data.average_tuples(point_data, &points, cell);
    }

    cell_data
}

/// Average the values of every cell using a point into a point value.
pub fn cell_data_to_point_data(cell_data: &FieldData, extent: &Extent) -> FieldData {
    let dims = extent.dimensions();
    let mut point_data = cell_data.zeros_like(extent.num_points());

    for point in 0..extent.num_points() {
        let cells = structured::point_cells(point, dims);
        point_data.average_tuples(cell_data, &cells, point);
    }

    point_data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::FieldArray;

    #[test]
    fn point_to_cell_on_a_plane() {
        let extent = Extent::from_dimensions(3, 2, 1);
        let points = FieldData::from_arrays(vec![FieldArray::from_slice(
            "x",
            1,
            &[0.0, 1.0, 2.0, 0.0, 1.0, 2.0],
        )
        .unwrap()])
        .unwrap();

        let cells = point_data_to_cell_data(&points, &extent);
        assert_eq!(cells[0].iter_values().collect::<Vec<_>>(), vec![0.5, 1.5]);
    }

    #[test]
    fn cell_to_point_on_a_line() {
        let extent = Extent::from_dimensions(4, 1, 1);
        let cells = FieldData::from_arrays(vec![FieldArray::from_slice("c", 1, &[2.0, 4.0, 8.0]).unwrap()])
            .unwrap();

        let points = cell_data_to_point_data(&cells, &extent);
        assert_eq!(
            points[0].iter_values().collect::<Vec<_>>(),
            vec![2.0, 3.0, 6.0, 8.0]
        );
    }
}
