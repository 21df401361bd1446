//! container types for point and cell attributes of structured grids
//!
//! Every array is stored as an `ndarray::Array2<f64>` of shape `(tuples, components)`,
//! which is exactly the tuple-major layout vtk expects on disk.

mod interpolate;

pub use interpolate::{cell_data_to_point_data, point_data_to_cell_data};

use crate::extent::Extent;
use crate::structured;
use derive_more::{Deref, DerefMut, Into};
use ndarray::{Array2, ArrayView1};
use num_traits::ToPrimitive;

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ArrayError {
    #[error("array `{name}` has {len} values, which is not a multiple of {components} components")]
    RaggedComponents {
        name: String,
        len: usize,
        components: usize,
    },
    #[error("array `{name}` contains a value that cannot be represented as f64")]
    NotRepresentable { name: String },
    #[error("field data arrays disagree on the number of tuples: `{name}` has {actual}, expected {expected}")]
    TupleMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("there is no array named `{name}`")]
    MissingArray { name: String },
    #[error("array `{name}` has no value for tuple {tuple:?}, component {component}")]
    OutOfRange {
        name: String,
        tuple: Option<usize>,
        component: usize,
    },
}

/// A single named attribute array, such as a pressure field or a velocity field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldArray {
    name: String,
    values: Array2<f64>,
}

impl FieldArray {
    /// wrap an existing `(tuples, components)` array
    pub fn new<T: Into<String>>(name: T, values: Array2<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// build an array from flat, tuple-major values of any numeric type
    pub fn from_slice<T, N>(name: T, components: usize, data: &[N]) -> Result<Self, ArrayError>
    where
        T: Into<String>,
        N: ToPrimitive,
    {
        let name = name.into();
        let components = components.max(1);

        if data.len() % components != 0 {
            return Err(ArrayError::RaggedComponents {
                name,
                len: data.len(),
                components,
            });
        }

        let values = data
            .iter()
            .map(|value| value.to_f64())
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| ArrayError::NotRepresentable { name: name.clone() })?;

        let tuples = values.len() / components;
        let values = Array2::from_shape_vec((tuples, components), values)
            .map_err(|_| ArrayError::RaggedComponents {
                name: name.clone(),
                len: data.len(),
                components,
            })?;

        Ok(Self { name, values })
    }

    pub fn zeros<T: Into<String>>(name: T, tuples: usize, components: usize) -> Self {
        Self::new(name, Array2::zeros((tuples, components.max(1))))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn components(&self) -> usize {
        self.values.ncols()
    }

    pub fn num_tuples(&self) -> usize {
        self.values.nrows()
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut Array2<f64> {
        &mut self.values
    }

    pub fn tuple(&self, index: usize) -> Option<ArrayView1<'_, f64>> {
        (index < self.num_tuples()).then(|| self.values.row(index))
    }

    /// the values in the order they are written to a file: tuple by tuple
    pub fn iter_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.rows().into_iter().flat_map(|row| row.into_iter().copied())
    }
}

/// An ordered collection of [`FieldArray`]s that all describe the same set of points
/// (or cells)
#[derive(Debug, Clone, Default, PartialEq, Deref, DerefMut, Into)]
pub struct FieldData(Vec<FieldArray>);

impl FieldData {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// construct field data, checking that every array has the same number of tuples
    pub fn from_arrays(arrays: Vec<FieldArray>) -> Result<Self, ArrayError> {
        let mut data = Self::new();
        for array in arrays {
            data.add_array(array)?;
        }
        Ok(data)
    }

    /// append an array. The array must agree with the existing arrays on the number of tuples
    pub fn add_array(&mut self, array: FieldArray) -> Result<(), ArrayError> {
        if let Some(expected) = self.num_tuples() {
            let actual = array.num_tuples();
            if actual != expected {
                return Err(ArrayError::TupleMismatch {
                    name: array.name,
                    expected,
                    actual,
                });
            }
        }
        self.0.push(array);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FieldArray> {
        self.0.iter().find(|array| array.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldArray> {
        self.0.iter_mut().find(|array| array.name == name)
    }

    /// number of tuples shared by all the arrays, `None` if there are no arrays
    pub fn num_tuples(&self) -> Option<usize> {
        self.0.first().map(FieldArray::num_tuples)
    }

    /// new field data with the same array names and component counts, zero filled
    pub fn zeros_like(&self, tuples: usize) -> Self {
        Self(
            self.0
                .iter()
                .map(|array| FieldArray::zeros(array.name.clone(), tuples, array.components()))
                .collect(),
        )
    }

    /// Copy tuple `source_index` of every array in `source` into tuple `target_index` of
    /// the array at the same position here.
    ///
    /// Both sides must have the same layout (as created by [`FieldData::zeros_like`]);
    /// out of range indices are skipped.
    pub fn copy_tuple(&mut self, source: &FieldData, source_index: usize, target_index: usize) {
        for (target, source) in self.0.iter_mut().zip(source.0.iter()) {
            if source_index >= source.num_tuples() || target_index >= target.num_tuples() {
                continue;
            }
            let row = source.values.row(source_index);
            target.values.row_mut(target_index).assign(&row);
        }
    }

    /// Set tuple `target_index` of every array to the average of the tuples in
    /// `source_indices` of the matching array of `source`.
    pub fn average_tuples(&mut self, source: &FieldData, source_indices: &[usize], target_index: usize) {
        if source_indices.is_empty() {
            return;
        }

        for (target, source) in self.0.iter_mut().zip(source.0.iter()) {
            if target_index >= target.num_tuples() {
                continue;
            }

            let mut sum = ndarray::Array1::<f64>::zeros(source.components());
            let mut count = 0usize;
            for index in source_indices.iter().filter(|i| **i < source.num_tuples()) {
                sum += &source.values.row(*index);
                count += 1;
            }

            if count > 0 {
                sum /= count as f64;
                target.values.row_mut(target_index).assign(&sum);
            }
        }
    }

    /// Copy the tuples of the sub-region `target_extent` out of data laid out over
    /// `source_extent`. Both extents must be expressed in the same index space (point
    /// extents for point data, cell extents for cell data).
    pub fn extract_extent(&self, source_extent: &Extent, target_extent: &Extent) -> FieldData {
        let mut out = self.zeros_like(target_extent.num_points());

        for ijk in target_extent.iter() {
            let source = structured::compute_point_id_for_extent(source_extent, ijk);
            let target = structured::compute_point_id_for_extent(target_extent, ijk);
            if let (Some(source), Some(target)) = (source, target) {
                out.copy_tuple(self, source, target);
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ragged_components_are_rejected() {
        let err = FieldArray::from_slice("u", 3, &[1.0, 2.0, 3.0, 4.0]).unwrap_err();
        assert!(matches!(err, ArrayError::RaggedComponents { .. }));
    }

    #[test]
    fn tuple_counts_must_agree() {
        let mut data = FieldData::new();
        data.add_array(FieldArray::from_slice("p", 1, &[1, 2, 3]).unwrap()).unwrap();
        let err = data
            .add_array(FieldArray::from_slice("rho", 1, &[1.0f32, 2.0]).unwrap())
            .unwrap_err();
        assert!(matches!(err, ArrayError::TupleMismatch { expected: 3, actual: 2, .. }));
    }

    #[test]
    fn copy_and_average() {
        let source = FieldData::from_arrays(vec![
            FieldArray::from_slice("v", 2, &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap(),
        ])
        .unwrap();

        let mut target = source.zeros_like(2);
        target.copy_tuple(&source, 2, 0);
        target.average_tuples(&source, &[0, 1, 2], 1);

        let values = target[0].values();
        assert_eq!(values.row(0).to_vec(), vec![4.0, 5.0]);
        assert_eq!(values.row(1).to_vec(), vec![2.0, 3.0]);
    }

    #[test]
    fn extract_sub_extent() {
        let extent = Extent::from_dimensions(3, 3, 1);
        let data = FieldData::from_arrays(vec![FieldArray::from_slice(
            "id",
            1,
            &(0..9).collect::<Vec<i32>>()[..],
        )
        .unwrap()])
        .unwrap();

        let sub = Extent::new(1, 2, 1, 2, 0, 0);
        let out = data.extract_extent(&extent, &sub);
        assert_eq!(out[0].iter_values().collect::<Vec<_>>(), vec![4.0, 5.0, 7.0, 8.0]);
    }
}
