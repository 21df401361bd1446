//! Common types that are useful for working with structured and AMR grids
//!
//! ```
//! use vtk_structured::prelude::*;
//!
//! let grid = ImageGrid::new([0.0; 3], [1.0; 3], Extent::from_dimensions(3, 3, 1));
//! assert_eq!(grid.description(), DataDescription::XYPlane);
//! ```

pub use crate::amr::{AmrGeometry, AmrGridConnectivity, ParticleContainer, RefinementRatio, Relationship};
pub use crate::hypertree::{DualGrid, HyperTree, HyperTreeGrid, Neighborhood};
pub use crate::{AmrIndex, CellType, DataDescription, Encoding, Extent, FieldArray, FieldData, HeaderType, ImageData, ImageGrid};
pub use crate::{Error, ParseError};

pub use ndarray::{Array1, Array2};
