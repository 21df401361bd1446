//! # Structured index arithmetic
//!
//! Structured grids never store their connectivity. A point or cell is identified by a
//! single linear id, and everything else (its logical `(i, j, k)` coordinates, the points
//! of a cell, the cells around a point) is computed from the grid dimensions.
//!
//! Linear ids are laid out with `i` varying fastest:
//!
//! ```text
//! id = i + j * nx + k * nx * ny
//! ```
//!
//! Cell ids use the same layout over the *cell* dimensions, where an axis with `n > 1`
//! points has `n - 1` cells and an axis with a single point still counts as one cell
//! layer. This keeps a single point (a vertex cell), lines and planes indexable with
//! the same formulas as full volumes.
//!
//! There are two flavors of every routine. The plain versions take dimensions and
//! `(i, j, k)` coordinates relative to the first point of the grid. The `_for_extent`
//! versions take an [`Extent`](crate::Extent) and absolute coordinates, which is what you
//! want when the grid is one piece of a larger domain (an AMR block, a parallel piece).

mod index;
mod topology;

pub use index::{
    cell_dimensions, cell_structured_coords, cell_structured_coords_for_extent, compute_cell_id,
    compute_cell_id_for_extent, compute_point_id, compute_point_id_for_extent,
    point_structured_coords, point_structured_coords_for_extent,
};
pub use topology::{cell_neighbors, cell_points, face_neighbors, point_cells};
