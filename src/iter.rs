use crate::extent::Extent;

/// Iterator over the logical `(i, j, k)` coordinates of an [`Extent`], `i` varying fastest.
///
/// The order matches the linear point ids produced by
/// [`compute_point_id_for_extent`](crate::structured::compute_point_id_for_extent).
#[derive(Debug, Clone)]
pub struct ExtentIter {
    extent: Extent,
    next: Option<[i32; 3]>,
}

impl ExtentIter {
    pub(crate) fn new(extent: Extent) -> Self {
        let next = if extent.is_empty() {
            None
        } else {
            Some([extent.x_start, extent.y_start, extent.z_start])
        };

        Self { extent, next }
    }
}

impl Iterator for ExtentIter {
    type Item = [i32; 3];

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        // compare before stepping so extents ending at i32::MAX do not overflow
        let [i, j, k] = current;
        self.next = if i < self.extent.x_end {
            Some([i + 1, j, k])
        } else if j < self.extent.y_end {
            Some([self.extent.x_start, j + 1, k])
        } else if k < self.extent.z_end {
            Some([self.extent.x_start, self.extent.y_start, k + 1])
        } else {
            None
        };

        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.next {
            Some([i, j, k]) => {
                let [nx, ny, _] = self.extent.dimensions();
                let offset = |value: i32, start: i32| (value as i64 - start as i64) as usize;
                let consumed = offset(k, self.extent.z_start)
                    .saturating_mul(nx.saturating_mul(ny))
                    .saturating_add(offset(j, self.extent.y_start).saturating_mul(nx))
                    .saturating_add(offset(i, self.extent.x_start));
                let remaining = self.extent.num_points().saturating_sub(consumed);
                (remaining, Some(remaining))
            }
            None => (0, Some(0)),
        }
    }
}

impl ExactSizeIterator for ExtentIter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_i_fastest() {
        let extent = Extent::new(1, 2, 0, 1, 5, 5);
        let points: Vec<_> = extent.iter().collect();
        assert_eq!(
            points,
            vec![[1, 0, 5], [2, 0, 5], [1, 1, 5], [2, 1, 5]]
        );
        assert_eq!(extent.iter().len(), 4);
    }

    #[test]
    fn empty_extent_yields_nothing() {
        let extent = Extent::new(0, -1, 0, 3, 0, 3);
        assert_eq!(extent.iter().count(), 0);
    }

    #[test]
    fn extent_at_the_end_of_the_index_range() {
        let extent = Extent::new(i32::MAX - 1, i32::MAX, 0, 0, i32::MAX, i32::MAX);
        assert_eq!(
            extent.iter().collect::<Vec<_>>(),
            vec![[i32::MAX - 1, 0, i32::MAX], [i32::MAX, 0, i32::MAX]]
        );
    }

    #[test]
    fn huge_extents_saturate() {
        let extent = Extent::new(i32::MIN, i32::MAX, i32::MIN, i32::MAX, i32::MIN, i32::MAX);
        assert_eq!(extent.num_points(), usize::MAX);
        assert_eq!(extent.iter().len(), usize::MAX);
        assert_eq!(extent.iter().next(), Some([i32::MIN; 3]));
    }
}
