use super::ConnectivityError;
use crate::extent::{DataDescription, Extent};

/// How much finer each level of an AMR hierarchy is than the level below it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefinementRatio {
    /// every level is refined by the same ratio
    Constant(u32),
    /// `ratios[l]` refines level `l` into level `l + 1`. Levels past the end of the
    /// list reuse the last ratio.
    PerLevel(Vec<u32>),
}

impl Default for RefinementRatio {
    fn default() -> Self {
        Self::Constant(2)
    }
}

impl RefinementRatio {
    /// check that every ratio is at least 2
    pub fn validate(&self) -> Result<(), ConnectivityError> {
        match self {
            Self::Constant(ratio) if *ratio < 2 => Err(ConnectivityError::InvalidRefinementRatio(*ratio)),
            Self::Constant(_) => Ok(()),
            Self::PerLevel(ratios) if ratios.is_empty() => Err(ConnectivityError::InvalidRefinementRatio(0)),
            Self::PerLevel(ratios) => match ratios.iter().find(|ratio| **ratio < 2) {
                Some(ratio) => Err(ConnectivityError::InvalidRefinementRatio(*ratio)),
                None => Ok(()),
            },
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Self::Constant(_))
    }

    /// the ratio between `level` and `level + 1`
    pub fn ratio_at(&self, level: usize) -> u32 {
        match self {
            Self::Constant(ratio) => *ratio,
            Self::PerLevel(ratios) => ratios
                .get(level)
                .or_else(|| ratios.last())
                .copied()
                .unwrap_or(1),
        }
    }

    /// The index scaling between two levels: the product of the ratios of every level
    /// in between. The order of the levels does not matter. Saturates at `i32::MAX`.
    ///
    /// ```
    /// use vtk_structured::amr::RefinementRatio;
    ///
    /// assert_eq!(RefinementRatio::Constant(2).factor(0, 3), 8);
    /// assert_eq!(RefinementRatio::PerLevel(vec![2, 4]).factor(2, 0), 8);
    /// ```
    pub fn factor(&self, from_level: usize, to_level: usize) -> i32 {
        let (low, high) = if from_level <= to_level {
            (from_level, to_level)
        } else {
            (to_level, from_level)
        };

        (low..high).fold(1i32, |factor, level| {
            let ratio = i32::try_from(self.ratio_at(level)).unwrap_or(i32::MAX);
            factor.saturating_mul(ratio)
        })
    }
}

/// Scale a point extent by `factor` along the active axes of `description`.
pub fn refine_extent(extent: &Extent, description: DataDescription, factor: i32) -> Extent {
    let mut out = *extent;
    for axis in description.active_axes() {
        out.set_start(*axis, extent.start(*axis).saturating_mul(factor));
        out.set_end(*axis, extent.end(*axis).saturating_mul(factor));
    }
    out
}

/// Divide a point extent by `factor` along the active axes of `description`, rounding
/// towards negative infinity.
pub fn coarsen_extent(extent: &Extent, description: DataDescription, factor: i32) -> Extent {
    let mut out = *extent;
    if factor <= 1 {
        return out;
    }
    for axis in description.active_axes() {
        out.set_start(*axis, extent.start(*axis).div_euclid(factor));
        out.set_end(*axis, extent.end(*axis).div_euclid(factor));
    }
    out
}

/// The extent of cell indices that cell `ijk` covers after being refined by `factor`
pub fn cell_refined_extent(ijk: [i32; 3], description: DataDescription, factor: i32) -> Extent {
    let mut out = Extent::new(ijk[0], ijk[0], ijk[1], ijk[1], ijk[2], ijk[2]);
    for axis in description.active_axes() {
        let start = ijk[*axis].saturating_mul(factor);
        out.set_start(*axis, start);
        out.set_end(*axis, start.saturating_add(factor - 1));
    }
    out
}

/// The cell at the coarser level that contains cell `ijk`
pub(crate) fn coarsen_cell(ijk: [i32; 3], description: DataDescription, factor: i32) -> [i32; 3] {
    let mut out = ijk;
    if factor <= 1 {
        return out;
    }
    for axis in description.active_axes() {
        out[*axis] = ijk[*axis].div_euclid(factor);
    }
    out
}
