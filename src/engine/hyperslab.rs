//! Hyperslab addressing.
//!
//! A hyperslab is a rectangular sub-region of a variable's array, addressed
//! by a per-axis start offset and extent, optionally with a stride. Whole
//! array and zero-rank scalar addressing are degenerate cases of the same
//! walker: a slab covering the full shape, and a rank-0 slab with a single
//! offset.

use smallvec::{smallvec, SmallVec};

use super::StoreError;

type AxisVec = SmallVec<[usize; 4]>;

/// A validated start/count/stride selection over a variable of fixed rank.
#[derive(Clone, Debug)]
pub(crate) struct Hyperslab {
    start: AxisVec,
    count: AxisVec,
    stride: AxisVec,
}

impl Hyperslab {
    /// Build a selection, checking rank agreement and stride validity.
    pub fn new(
        start: &[usize],
        count: &[usize],
        stride: Option<&[usize]>,
        rank: usize,
    ) -> Result<Self, StoreError> {
        if start.len() != rank || count.len() != rank {
            return Err(StoreError::Range(format!(
                "selection rank {}/{} does not match variable rank {}",
                start.len(),
                count.len(),
                rank
            )));
        }
        let stride: AxisVec = match stride {
            Some(s) => {
                if s.len() != rank {
                    return Err(StoreError::Range(format!(
                        "stride rank {} does not match variable rank {}",
                        s.len(),
                        rank
                    )));
                }
                if s.contains(&0) {
                    return Err(StoreError::Range("stride must be at least 1".to_string()));
                }
                SmallVec::from_slice(s)
            }
            None => smallvec![1; rank],
        };
        Ok(Self {
            start: SmallVec::from_slice(start),
            count: SmallVec::from_slice(count),
            stride,
        })
    }

    /// Selection covering an entire array of the given shape.
    pub fn whole(shape: &[usize]) -> Self {
        Self {
            start: smallvec![0; shape.len()],
            count: SmallVec::from_slice(shape),
            stride: smallvec![1; shape.len()],
        }
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.start.len()
    }

    /// Number of elements the selection addresses. A rank-0 selection
    /// addresses exactly one element.
    pub fn num_elements(&self) -> usize {
        self.count.iter().product()
    }

    /// Extent the given axis must have for this selection to fit.
    pub fn required_extent(&self, axis: usize) -> usize {
        if self.count[axis] == 0 {
            self.start[axis]
        } else {
            self.start[axis] + (self.count[axis] - 1) * self.stride[axis] + 1
        }
    }

    /// Iterate the flat row-major element offsets of the selection within
    /// an array of the given shape. The caller must have bounds-checked
    /// the selection against `shape` first.
    pub fn offsets<'a>(&'a self, shape: &[usize]) -> Offsets<'a> {
        let rank = self.rank();
        let mut row_stride: AxisVec = smallvec![1; rank];
        for axis in (0..rank.saturating_sub(1)).rev() {
            row_stride[axis] = row_stride[axis + 1] * shape[axis + 1];
        }
        Offsets {
            slab: self,
            row_stride,
            coord: smallvec![0; rank],
            remaining: self.num_elements(),
        }
    }
}

/// Row-major odometer over a hyperslab's element offsets.
pub(crate) struct Offsets<'a> {
    slab: &'a Hyperslab,
    row_stride: AxisVec,
    coord: AxisVec,
    remaining: usize,
}

impl Iterator for Offsets<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let slab = self.slab;
        let flat: usize = (0..slab.rank())
            .map(|axis| {
                (slab.start[axis] + self.coord[axis] * slab.stride[axis]) * self.row_stride[axis]
            })
            .sum();

        // Advance the innermost axis first.
        for axis in (0..slab.rank()).rev() {
            self.coord[axis] += 1;
            if self.coord[axis] < slab.count[axis] {
                break;
            }
            self.coord[axis] = 0;
        }

        Some(flat)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_covers_array_in_order() {
        let shape = [2, 3];
        let slab = Hyperslab::whole(&shape);
        assert_eq!(slab.num_elements(), 6);
        let offsets: Vec<usize> = slab.offsets(&shape).collect();
        assert_eq!(offsets, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_scalar_rank0() {
        let slab = Hyperslab::whole(&[]);
        assert_eq!(slab.num_elements(), 1);
        let offsets: Vec<usize> = slab.offsets(&[]).collect();
        assert_eq!(offsets, vec![0]);
    }

    #[test]
    fn test_subarray_offsets() {
        // 4x4 array, 2x2 block at (1, 1)
        let shape = [4, 4];
        let slab = Hyperslab::new(&[1, 1], &[2, 2], None, 2).unwrap();
        let offsets: Vec<usize> = slab.offsets(&shape).collect();
        assert_eq!(offsets, vec![5, 6, 9, 10]);
    }

    #[test]
    fn test_strided_offsets() {
        // every other element of a length-8 axis starting at 1
        let shape = [8];
        let slab = Hyperslab::new(&[1], &[3], Some(&[2]), 1).unwrap();
        let offsets: Vec<usize> = slab.offsets(&shape).collect();
        assert_eq!(offsets, vec![1, 3, 5]);
        assert_eq!(slab.required_extent(0), 6);
    }

    #[test]
    fn test_required_extent() {
        let slab = Hyperslab::new(&[1, 1, 10], &[8, 8, 10], None, 3).unwrap();
        assert_eq!(slab.required_extent(0), 9);
        assert_eq!(slab.required_extent(1), 9);
        assert_eq!(slab.required_extent(2), 20);
    }

    #[test]
    fn test_rank_mismatch_rejected() {
        assert!(matches!(
            Hyperslab::new(&[0], &[1, 1], None, 2),
            Err(StoreError::Range(_))
        ));
        assert!(matches!(
            Hyperslab::new(&[0, 0], &[1, 1], Some(&[1]), 2),
            Err(StoreError::Range(_))
        ));
    }

    #[test]
    fn test_zero_stride_rejected() {
        assert!(matches!(
            Hyperslab::new(&[0], &[2], Some(&[0]), 1),
            Err(StoreError::Range(_))
        ));
    }

    #[test]
    fn test_empty_count() {
        let slab = Hyperslab::new(&[2, 0], &[0, 3], None, 2).unwrap();
        assert_eq!(slab.num_elements(), 0);
        assert_eq!(slab.offsets(&[4, 4]).count(), 0);
    }
}
