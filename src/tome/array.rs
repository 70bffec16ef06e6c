//! Row-major n-dimensional array: flat buffer plus shape.
//!
//! This is the canonical array representation of the engine. Strided or
//! column-major views are out of scope.

use crate::error::{ScribeError, ScribeResult};

/// Multi-dimensional array over `T` with value semantics.
///
/// Invariant: `data.len() == shape.iter().product()`.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray<T> {
    data: Vec<T>,
    shape: Vec<usize>,
}

impl<T> Default for NdArray<T> {
    /// Empty 1-D array.
    fn default() -> Self {
        Self {
            data: Vec::new(),
            shape: vec![0],
        }
    }
}

impl<T> NdArray<T> {
    /// 1-D array from a flat vector.
    pub fn from_vec(data: Vec<T>) -> Self {
        let shape = vec![data.len()];
        Self { data, shape }
    }

    /// Array from a flat row-major buffer and a shape.
    pub fn from_flat(data: Vec<T>, shape: Vec<usize>) -> ScribeResult<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(ScribeError::type_error(format!(
                "array size mismatch: got {} elements for shape {:?}",
                data.len(),
                shape
            )));
        }
        Ok(Self { data, shape })
    }

    /// Array of the given shape filled with `T::default()`.
    pub fn from_shape(shape: Vec<usize>) -> Self
    where
        T: Default + Clone,
    {
        let size = shape.iter().product();
        Self {
            data: vec![T::default(); size],
            shape,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Total element count; always equals the product of the shape.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat row-major view of the buffer.
    pub fn flat(&self) -> &[T] {
        &self.data
    }

    pub fn flat_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_flat(self) -> Vec<T> {
        self.data
    }

    /// Row-major flat position of a multi-index.
    pub fn flat_index(&self, indices: &[usize]) -> ScribeResult<usize> {
        if indices.len() != self.shape.len() {
            return Err(ScribeError::type_error(format!(
                "expected {} indices, got {}",
                self.shape.len(),
                indices.len()
            )));
        }
        let mut index = 0;
        for (i, (&idx, &dim)) in indices.iter().zip(&self.shape).enumerate() {
            if idx >= dim {
                return Err(ScribeError::type_error(format!(
                    "index {} out of bounds for dim {} of size {}",
                    idx, i, dim
                )));
            }
            index = index * dim + idx;
        }
        Ok(index)
    }

    /// Element at a multi-index.
    pub fn get(&self, indices: &[usize]) -> ScribeResult<&T> {
        Ok(&self.data[self.flat_index(indices)?])
    }

    pub fn get_mut(&mut self, indices: &[usize]) -> ScribeResult<&mut T> {
        let i = self.flat_index(indices)?;
        Ok(&mut self.data[i])
    }

    /// Append to a 1-D array.
    pub fn push(&mut self, value: T) -> ScribeResult<()> {
        if self.shape.len() != 1 {
            return Err(ScribeError::type_error(
                "called push on a non-1D array",
            ));
        }
        self.data.push(value);
        self.shape[0] = self.data.len();
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Map every element, keeping the shape.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> NdArray<U> {
        NdArray {
            data: self.data.iter().map(f).collect(),
            shape: self.shape.clone(),
        }
    }
}

impl<'a, T> IntoIterator for &'a NdArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty_1d() {
        let a: NdArray<i32> = NdArray::default();
        assert_eq!(a.shape(), &[0]);
        assert_eq!(a.size(), 0);
        assert_eq!(a.rank(), 1);
    }

    #[test]
    fn test_size_equals_shape_product() {
        let a = NdArray::from_flat(vec![0u8; 24], vec![2, 3, 4]).unwrap();
        assert_eq!(a.size(), 24);
        assert_eq!(a.shape().iter().product::<usize>(), a.size());
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let err = NdArray::from_flat(vec![1, 2, 3], vec![2, 2]).unwrap_err();
        assert!(matches!(err, ScribeError::Type(_)));
    }

    #[test]
    fn test_row_major_indexing() {
        let a = NdArray::from_flat(vec![1, 2, 3, 4, 5, 6], vec![2, 3]).unwrap();
        assert_eq!(*a.get(&[0, 0]).unwrap(), 1);
        assert_eq!(*a.get(&[0, 2]).unwrap(), 3);
        assert_eq!(*a.get(&[1, 0]).unwrap(), 4);
        assert_eq!(*a.get(&[1, 2]).unwrap(), 6);
    }

    #[test]
    fn test_index_out_of_bounds() {
        let a = NdArray::from_flat(vec![1, 2], vec![2]).unwrap();
        assert!(a.get(&[2]).is_err());
        assert!(a.get(&[0, 0]).is_err());
    }

    #[test]
    fn test_push_on_1d() {
        let mut a = NdArray::from_vec(vec![1, 2]);
        a.push(3).unwrap();
        assert_eq!(a.shape(), &[3]);
        assert_eq!(a.flat(), &[1, 2, 3]);
    }

    #[test]
    fn test_push_on_2d_fails() {
        let mut a = NdArray::from_flat(vec![1, 2, 3, 4], vec![2, 2]).unwrap();
        assert!(a.push(5).is_err());
    }

    #[test]
    fn test_zero_dim_allowed() {
        let a = NdArray::<f64>::from_flat(vec![], vec![0, 3]).unwrap();
        assert_eq!(a.size(), 0);
        assert_eq!(a.rank(), 2);
    }

    #[test]
    fn test_map_keeps_shape() {
        let a = NdArray::from_flat(vec![1, 2, 3, 4], vec![2, 2]).unwrap();
        let b = a.map(|x| x * 10);
        assert_eq!(b.shape(), &[2, 2]);
        assert_eq!(b.flat(), &[10, 20, 30, 40]);
    }

    #[test]
    fn test_independent_after_clone() {
        let a = NdArray::from_vec(vec![1, 2, 3]);
        let mut b = a.clone();
        b.flat_mut()[0] = 99;
        assert_eq!(a.flat()[0], 1);
        assert_eq!(b.flat()[0], 99);
    }
}
