use vtk_structured::{CellType, DataDescription, Extent, ImageGrid};

fn plane() -> ImageGrid {
    // 5 x 4 points, 0.5 apart
    ImageGrid::new([0.0; 3], [0.5, 0.5, 1.0], Extent::from_dimensions(5, 4, 1))
}

#[test]
fn geometry() {
    let grid = plane();
    assert_eq!(grid.description(), DataDescription::XYPlane);
    assert_eq!(grid.cell_type(), CellType::Pixel);
    assert_eq!(grid.num_points(), 20);
    assert_eq!(grid.num_cells(), 12);
    assert_eq!(grid.bounds(), Some([0.0, 2.0, 0.0, 1.5, 0.0, 0.0]));
    assert_eq!(grid.cell_bounds(0), Some([0.0, 0.5, 0.0, 0.5, 0.0, 0.0]));
    assert_eq!(grid.point(6), Some([0.5, 0.5, 0.0]));
}

#[test]
fn closest_point() {
    let grid = plane();
    assert_eq!(grid.find_point([0.74, 0.26, 0.0]), Some(6));
    assert_eq!(grid.find_point([-0.1, 0.0, 0.0]), Some(0));
    assert_eq!(grid.find_point([2.3, 0.0, 0.0]), None);
}

#[test]
fn cell_location_and_weights() {
    let grid = plane();
    let found = grid.find_cell([0.75, 0.25, 0.0], 0.0).unwrap();

    assert_eq!(found.cell_id, 1);
    assert_eq!(found.pcoords, [0.5, 0.5, 0.0]);
    assert_eq!(&found.weights[..4], &[0.25; 4]);
    assert_eq!(&found.weights[4..], &[0.0; 4]);
}

#[test]
fn cell_location_within_tolerance() {
    let grid = plane();

    // 0.1 past the right boundary
    let found = grid.find_cell([2.1, 0.25, 0.0], 0.02).unwrap();
    assert_eq!(found.cell_id, 3);
    assert_eq!(found.pcoords[0], 1.0);

    assert!(grid.find_cell([2.1, 0.25, 0.0], 0.001).is_none());
}

#[test]
fn plane_parametric_coordinates() {
    let grid = ImageGrid::new([0.0; 3], [1.0; 3], Extent::new(0, 2, 0, 0, 0, 2));
    assert_eq!(grid.description(), DataDescription::XZPlane);

    let found = grid.find_cell([0.5, 0.0, 1.5], 0.0).unwrap();
    assert_eq!(found.cell_id, 2);
    assert_eq!(found.pcoords, [0.5, 0.5, 0.0]);
}

#[test]
fn gradient_of_a_linear_field() {
    let grid = plane();
    let scalars: Vec<f64> = (0..grid.num_points())
        .filter_map(|id| grid.point(id))
        .map(|x| 2.0 * x[0] - x[1])
        .collect();

    for ijk in [[0, 0, 0], [2, 1, 0], [4, 3, 0]] {
        // vtk reports the negated derivative
        let gradient = grid.point_gradient(ijk, &scalars);
        assert!((gradient[0] + 2.0).abs() < 1e-12, "{:?}", gradient);
        assert!((gradient[1] - 1.0).abs() < 1e-12, "{:?}", gradient);
        assert_eq!(gradient[2], 0.0);

        let derivative = grid.point_derivative(ijk, &scalars);
        assert!((derivative[0] - 2.0).abs() < 1e-12, "{:?}", derivative);
        assert!((derivative[1] + 1.0).abs() < 1e-12, "{:?}", derivative);
    }

    // outside of the grid
    assert_eq!(grid.point_gradient([5, 0, 0], &scalars), [0.0; 3]);
}

#[test]
fn single_precision_gradient() {
    let grid = ImageGrid::from_dimensions(3, 1, 1);
    let gradient = grid.point_gradient([1, 0, 0], &[1.0f32, 2.0, 4.0]);
    assert_eq!(gradient, [-1.5, 0.0, 0.0]);
}

#[test]
fn increments() {
    let grid = plane();
    assert_eq!(grid.increments(3), [3, 15, 60]);

    let sub = Extent::new(1, 3, 1, 2, 0, 0);
    assert_eq!(grid.continuous_increments(&sub, 1), [0, 2, 10]);
}

#[test]
fn crop_to_an_update_extent() {
    let grid = plane();
    let cropped = grid.crop(&Extent::new(3, 10, -2, 1, 0, 0)).unwrap();
    assert_eq!(cropped.extent, Extent::new(3, 4, 0, 1, 0, 0));
    assert_eq!(cropped.point(0), Some([1.5, 0.0, 0.0]));

    assert!(grid.crop(&Extent::new(6, 8, 0, 1, 0, 0)).is_none());
}
