//! # Extents
//!
//! An [`Extent`] describes the inclusive range of logical point indices a structured
//! grid covers along each axis. This is the same information found in the
//! `WholeExtent` / `Extent` attributes of a `.vti` or `.vtr` file:
//! `"x_start x_end y_start y_end z_start z_end"`.
//!
//! The number of points along each axis decides the [`DataDescription`] of the grid,
//! which in turn decides which axes take part in index arithmetic and what kind of
//! cell ([`CellType`]) the grid is made of.

use crate::iter::ExtentIter;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ExtentError {
    #[error("expected 6 integers in span string, got `{0}`")]
    MalformedSpan(String),
}

/// Classification of a structured grid by the axes that carry more than one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataDescription {
    Empty,
    SinglePoint,
    XLine,
    YLine,
    ZLine,
    XYPlane,
    YZPlane,
    XZPlane,
    XYZGrid,
}

impl DataDescription {
    /// classify a grid from the number of points along each axis
    pub fn from_dimensions(dims: [usize; 3]) -> Self {
        if dims.iter().any(|d| *d == 0) {
            return Self::Empty;
        }

        match (dims[0] > 1, dims[1] > 1, dims[2] > 1) {
            (false, false, false) => Self::SinglePoint,
            (true, false, false) => Self::XLine,
            (false, true, false) => Self::YLine,
            (false, false, true) => Self::ZLine,
            (true, true, false) => Self::XYPlane,
            (false, true, true) => Self::YZPlane,
            (true, false, true) => Self::XZPlane,
            (true, true, true) => Self::XYZGrid,
        }
    }

    /// The axes (0 = x, 1 = y, 2 = z) that carry more than one point, in ascending order.
    pub fn active_axes(&self) -> &'static [usize] {
        match self {
            Self::Empty | Self::SinglePoint => &[],
            Self::XLine => &[0],
            Self::YLine => &[1],
            Self::ZLine => &[2],
            Self::XYPlane => &[0, 1],
            Self::YZPlane => &[1, 2],
            Self::XZPlane => &[0, 2],
            Self::XYZGrid => &[0, 1, 2],
        }
    }

    /// topological dimension of the grid
    pub fn dimension(&self) -> usize {
        self.active_axes().len()
    }

    pub fn is_axis_active(&self, axis: usize) -> bool {
        self.active_axes().contains(&axis)
    }

    pub fn cell_type(&self) -> CellType {
        match self {
            Self::Empty => CellType::Empty,
            Self::SinglePoint => CellType::Vertex,
            Self::XLine | Self::YLine | Self::ZLine => CellType::Line,
            Self::XYPlane | Self::YZPlane | Self::XZPlane => CellType::Pixel,
            Self::XYZGrid => CellType::Voxel,
        }
    }

    /// the short name used in the `grid_description` attribute of overlapping AMR files
    pub fn grid_description(&self) -> &'static str {
        match self {
            Self::Empty => "",
            Self::SinglePoint => "Point",
            Self::XLine => "X",
            Self::YLine => "Y",
            Self::ZLine => "Z",
            Self::XYPlane => "XY",
            Self::YZPlane => "YZ",
            Self::XZPlane => "XZ",
            Self::XYZGrid => "XYZ",
        }
    }

    /// inverse of [`DataDescription::grid_description`]
    pub fn from_grid_description(name: &str) -> Option<Self> {
        let description = match name {
            "" => Self::Empty,
            "Point" => Self::SinglePoint,
            "X" => Self::XLine,
            "Y" => Self::YLine,
            "Z" => Self::ZLine,
            "XY" => Self::XYPlane,
            "YZ" => Self::YZPlane,
            "XZ" => Self::XZPlane,
            "XYZ" => Self::XYZGrid,
            _ => return None,
        };
        Some(description)
    }
}

/// The cell shape implied by a [`DataDescription`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    Empty,
    Vertex,
    Line,
    Pixel,
    Voxel,
}

impl CellType {
    pub fn num_points(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Vertex => 1,
            Self::Line => 2,
            Self::Pixel => 4,
            Self::Voxel => 8,
        }
    }
}

/// Describes the area of the computational
/// domain that a structured grid covers, as inclusive point index ranges.
///
/// Most often you want to use the [`Extent::from_dimensions`] constructor
/// if you are not describing one part of a larger domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Extent {
    pub x_start: i32,
    pub x_end: i32,
    pub y_start: i32,
    pub y_end: i32,
    pub z_start: i32,
    pub z_end: i32,
}

impl Extent {
    pub fn new(x_start: i32, x_end: i32, y_start: i32, y_end: i32, z_start: i32, z_end: i32) -> Self {
        Self {
            x_start,
            x_end,
            y_start,
            y_end,
            z_start,
            z_end,
        }
    }

    /// create an extent starting at the origin with `nx * ny * nz` points
    pub fn from_dimensions(nx: usize, ny: usize, nz: usize) -> Self {
        Self::new(0, nx as i32 - 1, 0, ny as i32 - 1, 0, nz as i32 - 1)
    }

    pub(crate) fn from_array(ext: [i32; 6]) -> Self {
        Self::new(ext[0], ext[1], ext[2], ext[3], ext[4], ext[5])
    }

    pub fn to_array(&self) -> [i32; 6] {
        [
            self.x_start,
            self.x_end,
            self.y_start,
            self.y_end,
            self.z_start,
            self.z_end,
        ]
    }

    /// parse an extent from a string you would find in a vtk file. The expected input is
    /// in the form `"x_start x_end y_start y_end z_start z_end"`
    ///
    /// # Example
    /// ```
    /// let extent = vtk_structured::Extent::from_span_string("0 10 0 20 0 10").unwrap();
    /// assert_eq!(extent.dimensions(), [11, 21, 11]);
    /// ```
    pub fn from_span_string(span_string: &str) -> Result<Self, ExtentError> {
        let values = span_string
            .split_ascii_whitespace()
            .map(|value| value.parse::<i32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ExtentError::MalformedSpan(span_string.to_string()))?;

        let values: [i32; 6] = values
            .try_into()
            .map_err(|_| ExtentError::MalformedSpan(span_string.to_string()))?;

        Ok(Self::from_array(values))
    }

    /// Format the extent into a string that would be written to a vtk file
    pub fn to_span_string(&self) -> String {
        format!(
            "{} {} {} {} {} {}",
            self.x_start, self.x_end, self.y_start, self.y_end, self.z_start, self.z_end
        )
    }

    pub fn start(&self, axis: usize) -> i32 {
        match axis {
            0 => self.x_start,
            1 => self.y_start,
            _ => self.z_start,
        }
    }

    pub fn end(&self, axis: usize) -> i32 {
        match axis {
            0 => self.x_end,
            1 => self.y_end,
            _ => self.z_end,
        }
    }

    pub fn set_start(&mut self, axis: usize, value: i32) {
        match axis {
            0 => self.x_start = value,
            1 => self.y_start = value,
            _ => self.z_start = value,
        }
    }

    pub fn set_end(&mut self, axis: usize, value: i32) {
        match axis {
            0 => self.x_end = value,
            1 => self.y_end = value,
            _ => self.z_end = value,
        }
    }

    /// Get the number of points along an axis, zero if the axis is empty
    pub fn len(&self, axis: usize) -> usize {
        let len = self.end(axis) as i64 - self.start(axis) as i64 + 1;
        len.max(0) as usize
    }

    /// the number of points along each axis
    pub fn dimensions(&self) -> [usize; 3] {
        [self.len(0), self.len(1), self.len(2)]
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions().iter().any(|d| *d == 0)
    }

    pub fn description(&self) -> DataDescription {
        DataDescription::from_dimensions(self.dimensions())
    }

    /// topological dimension of the points in this extent
    pub fn dimension(&self) -> usize {
        self.description().dimension()
    }

    /// Saturates at `usize::MAX` for extents spanning most of the `i32` range
    pub fn num_points(&self) -> usize {
        self.dimensions().iter().fold(1, |n, d| n.saturating_mul(*d))
    }

    /// Saturates like [`Extent::num_points`]
    pub fn num_cells(&self) -> usize {
        let dims = self.dimensions();
        if dims.iter().any(|d| *d == 0) {
            return 0;
        }
        dims.iter()
            .filter(|d| **d > 1)
            .fold(1, |n, d| n.saturating_mul(d - 1))
    }

    /// The extent of cell indices for this point extent. Every active axis loses its
    /// last index, the remaining axes are left alone.
    pub fn cell_extent(&self) -> Extent {
        self.cell_extent_for(self.description())
    }

    /// Like [`Extent::cell_extent`] but with the active axes decided by `description`.
    /// This matters for grids that are a sub-region of a larger domain, where a region
    /// may be one point thick along an axis the domain is refined in.
    pub fn cell_extent_for(&self, description: DataDescription) -> Extent {
        let mut cells = *self;
        for axis in description.active_axes() {
            cells.set_end(*axis, self.end(*axis) - 1);
        }
        cells
    }

    /// inverse of [`Extent::cell_extent_for`]
    pub fn point_extent_for(&self, description: DataDescription) -> Extent {
        let mut points = *self;
        for axis in description.active_axes() {
            points.set_end(*axis, self.end(*axis) + 1);
        }
        points
    }

    /// The overlapping region of two extents. Touching extents (sharing a face, edge or
    /// corner) overlap on that shared boundary.
    pub fn intersection(&self, other: &Extent) -> Option<Extent> {
        let mut out = *self;
        for axis in 0..3 {
            let start = self.start(axis).max(other.start(axis));
            let end = self.end(axis).min(other.end(axis));
            if start > end {
                return None;
            }
            out.set_start(axis, start);
            out.set_end(axis, end);
        }
        Some(out)
    }

    pub fn contains(&self, ijk: [i32; 3]) -> bool {
        (0..3).all(|axis| self.start(axis) <= ijk[axis] && ijk[axis] <= self.end(axis))
    }

    pub fn contains_extent(&self, other: &Extent) -> bool {
        (0..3).all(|axis| self.start(axis) <= other.start(axis) && other.end(axis) <= self.end(axis))
    }

    /// check if a point lies on the boundary of this extent, only considering
    /// the axes that are active in `description`
    pub fn is_on_boundary(&self, ijk: [i32; 3], description: DataDescription) -> bool {
        description
            .active_axes()
            .iter()
            .any(|axis| ijk[*axis] == self.start(*axis) || ijk[*axis] == self.end(*axis))
    }

    /// check if a point lies strictly inside this extent along every axis that is active
    /// in `description`
    pub fn is_interior(&self, ijk: [i32; 3], description: DataDescription) -> bool {
        description
            .active_axes()
            .iter()
            .all(|axis| self.start(*axis) < ijk[*axis] && ijk[*axis] < self.end(*axis))
    }

    /// grow (or shrink, for negative values) the extent on the low and high side of an axis
    pub fn grow(&mut self, axis: usize, low: i32, high: i32) {
        self.set_start(axis, self.start(axis) - low);
        self.set_end(axis, self.end(axis) + high);
    }

    /// iterate over every `(i, j, k)` in this extent with `i` varying fastest
    pub fn iter(&self) -> ExtentIter {
        ExtentIter::new(*self)
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_span_string())
    }
}

impl FromStr for Extent {
    type Err = ExtentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Extent::from_span_string(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_descriptions() {
        assert_eq!(Extent::from_dimensions(1, 1, 1).description(), DataDescription::SinglePoint);
        assert_eq!(Extent::from_dimensions(4, 1, 1).description(), DataDescription::XLine);
        assert_eq!(Extent::from_dimensions(1, 1, 3).description(), DataDescription::ZLine);
        assert_eq!(Extent::from_dimensions(1, 5, 2).description(), DataDescription::YZPlane);
        assert_eq!(Extent::from_dimensions(3, 1, 2).description(), DataDescription::XZPlane);
        assert_eq!(Extent::from_dimensions(2, 2, 2).description(), DataDescription::XYZGrid);
        assert_eq!(Extent::new(0, -1, 0, 3, 0, 3).description(), DataDescription::Empty);
    }

    #[test]
    fn counts() {
        let extent = Extent::new(2, 5, 0, 2, 7, 7);
        assert_eq!(extent.num_points(), 4 * 3);
        assert_eq!(extent.num_cells(), 3 * 2);
        assert_eq!(Extent::from_dimensions(1, 1, 1).num_cells(), 1);
        assert_eq!(Extent::new(0, -1, 0, 0, 0, 0).num_cells(), 0);
    }

    #[test]
    fn cell_extent_round_trip() {
        let extent = Extent::new(0, 4, 0, 0, -2, 2);
        let cells = extent.cell_extent();
        assert_eq!(cells, Extent::new(0, 3, 0, 0, -2, 1));
        assert_eq!(cells.point_extent_for(extent.description()), extent);
    }

    #[test]
    fn span_string() {
        let extent: Extent = "0 10 -1 20 3 3".parse().unwrap();
        assert_eq!(extent, Extent::new(0, 10, -1, 20, 3, 3));
        assert_eq!(extent.to_string(), "0 10 -1 20 3 3");

        assert!(Extent::from_span_string("0 10 0 20").is_err());
        assert!(Extent::from_span_string("0 10 0 20 0 x").is_err());
    }

    #[test]
    fn boundary_only_checks_active_axes() {
        let extent = Extent::new(0, 4, 0, 4, 0, 0);
        let description = extent.description();
        assert!(extent.is_interior([2, 2, 0], description));
        assert!(extent.is_on_boundary([0, 2, 0], description));
        assert!(!extent.is_on_boundary([2, 3, 0], description));
    }

    #[test]
    fn intersection_of_touching_extents() {
        let a = Extent::new(0, 4, 0, 4, 0, 0);
        let b = Extent::new(4, 8, 2, 6, 0, 0);
        assert_eq!(a.intersection(&b), Some(Extent::new(4, 4, 2, 4, 0, 0)));
        assert_eq!(a.intersection(&Extent::new(5, 8, 0, 4, 0, 0)), None);
    }
}
