//! `Coordinate`
//!
//! Integer vectors addressing points in an N-dimensional pixel
//! grid, and the helpers mapping them to and from flat buffer
//! offsets. Axis 0 is the fastest-varying axis of the buffer.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Index, IndexMut, Sub};

use itertools::Itertools;

use crate::errors::{ImageError, Result};
use crate::utils::access_check;

/// Largest number of axes a `Coordinate` can hold.
pub const MAX_DIMENSION : usize = 8;

/// An ordered tuple of signed integers, one per axis.
///
/// The storage is inline so `Coordinate`s are copied freely,
/// like any other small value type. A dimension of 0 means the
/// coordinate has not been configured yet; once set with
/// `set_dimension` (or by any constructor) it never changes.
#[derive(Clone, Copy)]
pub struct Coordinate {
    dim : usize,
    axes : [i64; MAX_DIMENSION],
}

impl Coordinate {
    /// A coordinate of `dim` axes, all zero.
    ///
    /// ## Panics
    ///
    /// If `dim` exceeds `MAX_DIMENSION`.
    pub fn new(dim : usize) -> Coordinate {
        assert!(dim <= MAX_DIMENSION, "Coordinates hold at most {} axes", MAX_DIMENSION);
        Coordinate { dim, axes : [0; MAX_DIMENSION] }
    }

    /// A coordinate of `dim` axes, all equal to `value`.
    ///
    /// ## Panics
    ///
    /// If `dim` exceeds `MAX_DIMENSION`.
    pub fn filled(dim : usize, value : i64) -> Coordinate {
        let mut coord = Coordinate::new(dim);
        coord.axes[..dim].iter_mut().for_each(|axis| *axis = value);
        coord
    }

    /// Builds a coordinate from its axis values, axis 0 first.
    ///
    /// ## Panics
    ///
    /// If `values` has more than `MAX_DIMENSION` elements.
    pub fn from_slice(values : &[i64]) -> Coordinate {
        let mut coord = Coordinate::new(values.len());
        coord.axes[..values.len()].copy_from_slice(values);
        coord
    }

    /// `from_slice` for values of unknown length.
    ///
    /// ## Errors
    ///
    /// * `BadParameters` if `values` has more than `MAX_DIMENSION` elements
    pub fn try_from_slice(values : &[i64]) -> Result<Coordinate> {
        if values.len() > MAX_DIMENSION {
            return Err(ImageError::BadParameters(format!(
                "Coordinates hold at most {} axes, got {}", MAX_DIMENSION, values.len()
            )));
        }
        Ok(Coordinate::from_slice(values))
    }

    /// Reads one coordinate of `dim` axes from the front of `table`.
    ///
    /// ## Example
    ///
    /// ```
    /// use yayi_core::Coordinate;
    ///
    /// let c = Coordinate::from_table(&[3, 4, 5], 2).unwrap();
    /// assert_eq!(c, Coordinate::from([3, 4]));
    /// ```
    pub fn from_table(table : &[i64], dim : usize) -> Result<Coordinate> {
        Self::check_dimension(dim)?;
        if table.len() < dim {
            return Err(ImageError::BadParameters(format!(
                "Table of {} values is too short for a coordinate of dimension {}",
                table.len(), dim
            )));
        }
        Ok(Coordinate::from_slice(&table[..dim]))
    }

    /// Reads consecutive coordinates of `dim` axes from a flat table.
    /// The table length must be a multiple of `dim`.
    pub fn from_table_multiple(table : &[i64], dim : usize) -> Result<Vec<Coordinate>> {
        Self::check_dimension(dim)?;
        if table.len() % dim != 0 {
            return Err(ImageError::BadParameters(format!(
                "Table of {} values is not a multiple of the dimension {}",
                table.len(), dim
            )));
        }
        Ok(table.chunks_exact(dim).map(Coordinate::from_slice).collect())
    }

    fn check_dimension(dim : usize) -> Result<()> {
        if dim == 0 || dim > MAX_DIMENSION {
            return Err(ImageError::BadParameters(format!(
                "Dimension must be in 1..={}, got {}", MAX_DIMENSION, dim
            )));
        }
        Ok(())
    }

    /// Configures the number of axes. Calling it again with the same
    /// value is accepted, any other value is refused.
    pub fn set_dimension(&mut self, dim : usize) -> Result<()> {
        Self::check_dimension(dim)?;
        match self.dim {
            0 => {
                self.dim = dim;
                Ok(())
            },
            current if current == dim => Ok(()),
            current => Err(ImageError::BadParameters(format!(
                "Coordinate dimension is already {}, cannot change it to {}",
                current, dim
            ))),
        }
    }

    /// Number of axes
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn as_slice(&self) -> &[i64] {
        &self.axes[..self.dim]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [i64] {
        &mut self.axes[..self.dim]
    }

    /// Checked axis access
    pub fn get(&self, axis : usize) -> Result<i64> {
        self.as_slice().get(axis).copied().ok_or_else(|| ImageError::OutOfBounds(
            format!("Axis {} of a coordinate of dimension {}", axis, self.dim)
        ))
    }

    /// Checked axis write
    pub fn set(&mut self, axis : usize, value : i64) -> Result<()> {
        let dim = self.dim;
        let slot = self.as_mut_slice().get_mut(axis).ok_or_else(|| ImageError::OutOfBounds(
            format!("Axis {} of a coordinate of dimension {}", axis, dim)
        ))?;
        *slot = value;
        Ok(())
    }

    /// Index of the last axis (the slowest-varying one).
    #[inline]
    pub fn last_axis(&self) -> usize {
        self.dim.saturating_sub(1)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, i64> {
        self.as_slice().iter()
    }
}

impl Default for Coordinate {
    fn default() -> Self {
        Coordinate::new(0)
    }
}

/// ## Panics
///
/// If `N` exceeds `MAX_DIMENSION`; use `Coordinate::try_from_slice`
/// for lengths not known to fit.
impl<const N : usize> From<[i64; N]> for Coordinate {
    fn from(values : [i64; N]) -> Self {
        Coordinate::from_slice(&values)
    }
}

impl TryFrom<&[i64]> for Coordinate {
    type Error = ImageError;

    fn try_from(values : &[i64]) -> Result<Coordinate> {
        Coordinate::try_from_slice(values)
    }
}

impl Index<usize> for Coordinate {
    type Output = i64;

    #[inline]
    fn index(&self, axis : usize) -> &i64 {
        access_check!(axis < self.dim, "Axis {} of a coordinate of dimension {}", axis, self.dim);
        &self.axes[axis]
    }
}

impl IndexMut<usize> for Coordinate {
    #[inline]
    fn index_mut(&mut self, axis : usize) -> &mut i64 {
        access_check!(axis < self.dim, "Axis {} of a coordinate of dimension {}", axis, self.dim);
        &mut self.axes[axis]
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other : &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Coordinate {}

impl Hash for Coordinate {
    fn hash<H : Hasher>(&self, state : &mut H) {
        self.as_slice().hash(state);
    }
}

impl PartialOrd for Coordinate {
    fn partial_cmp(&self, other : &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lexicographic, axis 0 first. Shorter coordinates sort first
/// on a common prefix.
impl Ord for Coordinate {
    fn cmp(&self, other : &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl Add for Coordinate {
    type Output = Coordinate;

    fn add(mut self, rhs : Coordinate) -> Coordinate {
        debug_assert_eq!(self.dim, rhs.dim, "Adding coordinates of different dimensions");
        self.as_mut_slice().iter_mut().zip(rhs.iter()).for_each(|(a, b)| *a += b);
        self
    }
}

impl Sub for Coordinate {
    type Output = Coordinate;

    fn sub(mut self, rhs : Coordinate) -> Coordinate {
        debug_assert_eq!(self.dim, rhs.dim, "Subtracting coordinates of different dimensions");
        self.as_mut_slice().iter_mut().zip(rhs.iter()).for_each(|(a, b)| *a -= b);
        self
    }
}

impl fmt::Debug for Coordinate {
    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coordinate{}", self)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.iter().join(", "))
    }
}

/// Product of all axis values: the number of pixels of an image
/// of size `size`. Accumulated in 64 bits.
pub fn total_number_of_points(size : &Coordinate) -> i64 {
    size.iter().product()
}

/// Like `total_number_of_points`, but fails on a non-positive axis
/// or when the product does not fit a buffer index.
pub fn checked_total_number_of_points(size : &Coordinate) -> Result<usize> {
    if size.dimension() == 0 {
        return Err(ImageError::BadParameters("Size has no axis".to_string()));
    }
    size.iter().enumerate().try_fold(1usize, |acc, (axis, &extent)| {
        if extent <= 0 {
            return Err(ImageError::BadParameters(format!(
                "Axis {} of size {} is not strictly positive", axis, size
            )));
        }
        usize::try_from(extent).ok()
            .and_then(|extent| acc.checked_mul(extent))
            .ok_or_else(|| ImageError::MemoryError(format!(
                "Number of points of size {} overflows the buffer index", size
            )))
    })
}

/// Converts a position to its row-major offset (axis 0 fastest)
/// in a grid of `size`. Only defined for positions inside
/// `[0, size)`.
#[inline]
pub fn from_coordinate_to_offset(size : &Coordinate, coord : &Coordinate) -> i64 {
    access_check!(
        size.dimension() == coord.dimension(),
        "Coordinate {} and size {} have different dimensions", coord, size
    );
    let mut offset = 0;
    let mut stride = 1;
    for (extent, value) in size.iter().zip(coord.iter()) {
        offset += value * stride;
        stride *= extent;
    }
    offset
}

/// Converts a row-major offset back to a position in a grid of
/// `size`. Negative offsets are not supported.
pub fn from_offset_to_coordinate(size : &Coordinate, offset : i64) -> Coordinate {
    access_check!(offset >= 0, "Negative offset {} cannot be converted to a coordinate", offset);
    let mut coord = Coordinate::new(size.dimension());
    let mut remaining = offset;
    let last = size.last_axis();
    for axis in 0..last {
        coord[axis] = remaining % size[axis];
        remaining /= size[axis];
    }
    if size.dimension() > 0 {
        coord[last] = remaining;
    }
    coord
}

/// Element-wise minimum
pub fn min_coordinate(a : &Coordinate, b : &Coordinate) -> Coordinate {
    let mut out = *a;
    out.as_mut_slice().iter_mut().zip(b.iter()).for_each(|(x, &y)| *x = (*x).min(y));
    out
}

/// Element-wise maximum
pub fn max_coordinate(a : &Coordinate, b : &Coordinate) -> Coordinate {
    let mut out = *a;
    out.as_mut_slice().iter_mut().zip(b.iter()).for_each(|(x, &y)| *x = (*x).max(y));
    out
}

/// True if `coord` lies in `[0, size)` on every axis.
#[inline]
pub fn is_point_inside(size : &Coordinate, coord : &Coordinate) -> bool {
    size.dimension() == coord.dimension()
        && size.iter().zip(coord.iter()).all(|(&extent, &value)| value >= 0 && value < extent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::iproduct;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_set_dimension() {
        let mut c = Coordinate::default();
        assert_eq!(c.dimension(), 0);
        c.set_dimension(3).unwrap();
        c.set_dimension(3).unwrap();
        assert!(matches!(c.set_dimension(2), Err(ImageError::BadParameters(_))));
        assert!(Coordinate::default().set_dimension(0).is_err());
        assert!(Coordinate::default().set_dimension(MAX_DIMENSION + 1).is_err());
        assert_eq!(c, Coordinate::new(3));
    }

    #[test]
    fn test_fallible_construction() {
        let too_long = [1i64; MAX_DIMENSION + 1];
        assert!(matches!(Coordinate::try_from_slice(&too_long), Err(ImageError::BadParameters(_))));
        assert!(Coordinate::try_from(&too_long[..]).is_err());
        assert!(Coordinate::from_table(&too_long, MAX_DIMENSION + 1).is_err());

        let fits = Coordinate::try_from(&too_long[..MAX_DIMENSION]).unwrap();
        assert_eq!(fits.dimension(), MAX_DIMENSION);
        assert_eq!(Coordinate::try_from_slice(&[4, 5]).unwrap(), Coordinate::from([4, 5]));
    }

    #[test]
    #[should_panic]
    fn test_array_longer_than_max_dimension_panics() {
        let _ = Coordinate::from([0i64; MAX_DIMENSION + 1]);
    }

    #[test]
    fn test_checked_axis_access() {
        let mut c = Coordinate::from([1, 2]);
        assert_eq!(c.get(1).unwrap(), 2);
        assert!(matches!(c.get(2), Err(ImageError::OutOfBounds(_))));
        c.set(0, 7).unwrap();
        assert_eq!(c[0], 7);
        assert!(c.set(5, 1).is_err());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn test_index_past_dimension_panics() {
        let c = Coordinate::from([1, 2]);
        let _ = c[2];
    }

    #[test]
    fn test_from_table() {
        let table = [1, 2, 3, 4, 5, 6];
        assert_eq!(Coordinate::from_table(&table, 3).unwrap(), Coordinate::from([1, 2, 3]));
        assert!(Coordinate::from_table(&table[..1], 2).is_err());

        let many = Coordinate::from_table_multiple(&table, 2).unwrap();
        assert_eq!(many, vec![
            Coordinate::from([1, 2]),
            Coordinate::from([3, 4]),
            Coordinate::from([5, 6]),
        ]);
        assert!(Coordinate::from_table_multiple(&table, 4).is_err());
    }

    #[test]
    fn test_arithmetic_and_order() {
        let a = Coordinate::from([1, 5]);
        let b = Coordinate::from([2, -1]);
        assert_eq!(a + b, Coordinate::from([3, 4]));
        assert_eq!(a - b, Coordinate::from([-1, 6]));
        assert!(a < b);
        assert!(Coordinate::from([1, 4]) < a);

        // usable as map keys
        let mut map = BTreeMap::new();
        map.insert(b, "b");
        map.insert(a, "a");
        assert_eq!(map.values().copied().collect::<Vec<_>>(), vec!["a", "b"]);

        assert_eq!(min_coordinate(&a, &b), Coordinate::from([1, -1]));
        assert_eq!(max_coordinate(&a, &b), Coordinate::from([2, 5]));
        assert_eq!(a.to_string(), "(1, 5)");
    }

    #[test]
    fn test_number_of_points() {
        assert_eq!(total_number_of_points(&Coordinate::from([10, 20, 3])), 600);
        assert_eq!(checked_total_number_of_points(&Coordinate::from([10, 20])).unwrap(), 200);
        assert!(checked_total_number_of_points(&Coordinate::from([10, 0])).is_err());
        assert!(checked_total_number_of_points(&Coordinate::from([-1, 4])).is_err());
        assert!(matches!(
            checked_total_number_of_points(&Coordinate::from([i64::MAX, i64::MAX])),
            Err(ImageError::MemoryError(_))
        ));
    }

    #[test]
    fn test_offset_layout_is_row_major() {
        let size = Coordinate::from([4, 3]);
        let mut expected = 0;
        for (y, x) in iproduct!(0..3, 0..4) {
            let c = Coordinate::from([x, y]);
            assert_eq!(from_coordinate_to_offset(&size, &c), expected);
            assert_eq!(from_offset_to_coordinate(&size, expected), c);
            assert!(is_point_inside(&size, &c));
            expected += 1;
        }
        assert!(!is_point_inside(&size, &Coordinate::from([4, 0])));
        assert!(!is_point_inside(&size, &Coordinate::from([0, -1])));
        // one past the end lands on the last axis
        assert_eq!(from_offset_to_coordinate(&size, 12), Coordinate::from([0, 3]));
    }

    proptest! {
        #[test]
        fn offset_coordinate_bijection(
            size in proptest::collection::vec(1i64..12, 1..5),
            seed in 0u64..u64::MAX,
        ) {
            let size = Coordinate::from_slice(&size);
            let total = total_number_of_points(&size);
            let offset = (seed % total as u64) as i64;
            let coord = from_offset_to_coordinate(&size, offset);
            prop_assert!(is_point_inside(&size, &coord));
            prop_assert_eq!(from_coordinate_to_offset(&size, &coord), offset);
        }
    }
}
