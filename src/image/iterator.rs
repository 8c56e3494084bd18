//! Pixel iterators over an image's buffer.
//!
//! An iterator is a borrowed slice plus a `Cursor`, which tracks
//! the position and the buffer offset together. Two cursor kinds
//! exist:
//!
//! * `BlockCursor` walks the whole buffer linearly
//! * `WindowCursor` walks a clipped window row by row: stepping
//! past the end of a window row jumps to the start of the next
//! window row, not the next image row.
//!
//! Ordering, distance and random access all use the logical index
//! of the traversal (0 at `begin`, `len` at `end`), never the raw
//! buffer offset.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::ops::{Add, Index, Sub};

use crate::coordinate::{
    from_coordinate_to_offset,
    from_offset_to_coordinate,
    is_point_inside,
    Coordinate,
};
use crate::errors::{ImageError, Result};
use crate::image::Window;
use crate::utils::access_check;

/// The traversal state of an iterator, independent of the buffer.
pub trait Cursor : Copy + Debug {
    /// Offset in the image buffer of the current pixel
    fn offset(&self) -> i64;

    /// Current position in image coordinates
    fn position(&self) -> Coordinate;

    /// Logical rank in the traversal, `0..=len()`
    fn index(&self) -> i64;

    /// Number of pixels of the traversal
    fn len(&self) -> i64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Moves to logical rank `index`. `len()` is the end sentinel.
    fn seek(&mut self, index : i64);

    fn increment(&mut self) {
        self.seek(self.index() + 1);
    }

    fn decrement(&mut self) {
        self.seek(self.index() - 1);
    }

    fn advance(&mut self, n : i64) {
        self.seek(self.index() + n);
    }

    /// Moves to the pixel at `coord`, which must belong to the traversal.
    fn set_position(&mut self, coord : &Coordinate) -> Result<()>;

    /// True if both cursors walk the same pixels in the same order.
    fn same_geometry(&self, other : &Self) -> bool;

    fn is_end(&self) -> bool {
        self.index() >= self.len()
    }
}

/// Linear traversal of the whole buffer.
#[derive(Clone, Copy, Debug)]
pub struct BlockCursor {
    size : Coordinate,
    offset : i64,
    len : i64,
}

impl BlockCursor {
    pub (crate) fn new(size : Coordinate, len : i64, offset : i64) -> BlockCursor {
        BlockCursor { size, offset, len }
    }
}

impl Cursor for BlockCursor {
    #[inline]
    fn offset(&self) -> i64 {
        self.offset
    }

    fn position(&self) -> Coordinate {
        from_offset_to_coordinate(&self.size, self.offset)
    }

    #[inline]
    fn index(&self) -> i64 {
        self.offset
    }

    #[inline]
    fn len(&self) -> i64 {
        self.len
    }

    #[inline]
    fn seek(&mut self, index : i64) {
        self.offset = index;
    }

    #[inline]
    fn increment(&mut self) {
        self.offset += 1;
    }

    #[inline]
    fn decrement(&mut self) {
        self.offset -= 1;
    }

    fn set_position(&mut self, coord : &Coordinate) -> Result<()> {
        if !is_point_inside(&self.size, coord) {
            return Err(ImageError::OutOfBounds(format!(
                "Position {} outside of image of size {}", coord, self.size
            )));
        }
        self.offset = from_coordinate_to_offset(&self.size, coord);
        Ok(())
    }

    fn same_geometry(&self, other : &Self) -> bool {
        self.size == other.size
    }
}

/// Row-by-row traversal of a clipped window.
#[derive(Clone, Copy, Debug)]
pub struct WindowCursor {
    /// buffer stride of each axis
    strides : Coordinate,
    begin : Coordinate,
    extent : Coordinate,
    position : Coordinate,
    offset : i64,
    index : i64,
    len : i64,
}

impl WindowCursor {
    /// `window` must already be clipped to `size`.
    pub (crate) fn new(size : &Coordinate, window : &Window) -> WindowCursor {
        let mut strides = Coordinate::new(size.dimension());
        let mut stride = 1;
        for axis in 0..size.dimension() {
            strides[axis] = stride;
            stride *= size[axis];
        }
        let mut cursor = WindowCursor {
            strides,
            begin : *window.origin(),
            extent : *window.extent(),
            position : *window.origin(),
            offset : 0,
            index : 0,
            len : window.number_of_points(),
        };
        cursor.seek(0);
        cursor
    }

    /// First position of the traversal
    pub fn window_origin(&self) -> &Coordinate {
        &self.begin
    }

    pub fn window_extent(&self) -> &Coordinate {
        &self.extent
    }

    fn update_offset(&mut self) {
        self.offset = self.position.iter()
            .zip(self.strides.iter())
            .map(|(p, s)| p * s)
            .sum();
    }
}

impl Cursor for WindowCursor {
    #[inline]
    fn offset(&self) -> i64 {
        self.offset
    }

    #[inline]
    fn position(&self) -> Coordinate {
        self.position
    }

    #[inline]
    fn index(&self) -> i64 {
        self.index
    }

    #[inline]
    fn len(&self) -> i64 {
        self.len
    }

    fn seek(&mut self, index : i64) {
        self.index = index;
        self.position = self.begin;
        if self.len == 0 {
            self.update_offset();
            return;
        }
        let last = self.begin.last_axis();
        let mut remaining = index;
        for axis in 0..last {
            self.position[axis] += remaining.rem_euclid(self.extent[axis]);
            remaining = remaining.div_euclid(self.extent[axis]);
        }
        self.position[last] += remaining;
        self.update_offset();
    }

    /// Odometer step: the first axis that does not overflow its
    /// window row takes the step, the ones before it wrap back.
    #[inline]
    fn increment(&mut self) {
        self.index += 1;
        let last = self.begin.last_axis();
        for axis in 0..=last {
            self.position[axis] += 1;
            self.offset += self.strides[axis];
            if axis == last || self.position[axis] < self.begin[axis] + self.extent[axis] {
                return;
            }
            self.position[axis] = self.begin[axis];
            self.offset -= self.extent[axis] * self.strides[axis];
        }
    }

    #[inline]
    fn decrement(&mut self) {
        self.index -= 1;
        let last = self.begin.last_axis();
        for axis in 0..=last {
            if axis == last || self.position[axis] > self.begin[axis] {
                self.position[axis] -= 1;
                self.offset -= self.strides[axis];
                return;
            }
            self.position[axis] = self.begin[axis] + self.extent[axis] - 1;
            self.offset += (self.extent[axis] - 1) * self.strides[axis];
        }
    }

    fn set_position(&mut self, coord : &Coordinate) -> Result<()> {
        let window = Window::new(self.begin, self.extent)?;
        if !window.contains(coord) {
            return Err(ImageError::OutOfBounds(format!(
                "Position {} outside of window {:?}", coord, window
            )));
        }
        let mut index = 0;
        let mut stride = 1;
        for axis in 0..coord.dimension() {
            index += (coord[axis] - self.begin[axis]) * stride;
            stride *= self.extent[axis];
        }
        self.index = index;
        self.position = *coord;
        self.update_offset();
        Ok(())
    }

    fn same_geometry(&self, other : &Self) -> bool {
        self.strides == other.strides && self.begin == other.begin && self.extent == other.extent
    }
}

#[inline]
fn checked_offset<C : Cursor>(cursor : &C, available : usize) -> usize {
    access_check!(
        cursor.index() >= 0 && cursor.index() < cursor.len(),
        "Dereferencing an iterator at rank {} of a range of {} pixels",
        cursor.index(), cursor.len()
    );
    access_check!(
        cursor.offset() >= 0 && (cursor.offset() as usize) < available,
        "Iterator offset {} outside of a buffer of {} pixels",
        cursor.offset(), available
    );
    cursor.offset() as usize
}

/// Read-only iterator. `values()`, or a `for` loop over the iterator
/// itself, yields every pixel from the current rank to the end of the
/// traversal.
///
/// ## Example
///
/// ```
/// use yayi_core::{Coordinate, Image, Window};
///
/// let mut image = Image::<u8>::with_size(Coordinate::from([4, 3])).unwrap();
/// image.allocate_image().unwrap();
/// image.as_mut_slice().iter_mut().enumerate().for_each(|(i, p)| *p = i as u8);
///
/// let window = Window::new(Coordinate::from([1, 1]), Coordinate::from([2, 2])).unwrap();
/// let values : Vec<u8> = image.begin_window(&window).unwrap().values().copied().collect();
/// assert_eq!(values, vec![5, 6, 9, 10]);
/// ```
#[derive(Debug)]
pub struct PixelIter<'a, T, C : Cursor> {
    pixels : &'a [T],
    cursor : C,
}

impl<'a, T, C : Cursor> Clone for PixelIter<'a, T, C> {
    fn clone(&self) -> Self {
        PixelIter { pixels : self.pixels, cursor : self.cursor }
    }
}

impl<'a, T, C : Cursor> PixelIter<'a, T, C> {
    pub (crate) fn new(pixels : &'a [T], cursor : C) -> Self {
        PixelIter { pixels, cursor }
    }

    /// The pixel under the iterator.
    #[inline]
    pub fn get(&self) -> &'a T {
        &self.pixels[checked_offset(&self.cursor, self.pixels.len())]
    }

    pub fn cursor(&self) -> C {
        self.cursor
    }

    pub fn position(&self) -> Coordinate {
        self.cursor.position()
    }

    pub fn offset(&self) -> i64 {
        self.cursor.offset()
    }

    pub fn index(&self) -> i64 {
        self.cursor.index()
    }

    pub fn is_end(&self) -> bool {
        self.cursor.is_end()
    }

    pub fn increment(&mut self) {
        self.cursor.increment();
    }

    pub fn decrement(&mut self) {
        self.cursor.decrement();
    }

    pub fn advance(&mut self, n : i64) {
        self.cursor.advance(n);
    }

    pub fn set_position(&mut self, coord : &Coordinate) -> Result<()> {
        self.cursor.set_position(coord)
    }

    /// Pixels from the current rank to the end of the traversal.
    pub fn values(self) -> Values<'a, T, C> {
        Values { iter : self }
    }

    /// Pairs every remaining pixel with its position.
    pub fn with_positions(self) -> impl Iterator<Item = (Coordinate, &'a T)> {
        let mut values = self.values();
        std::iter::from_fn(move || {
            let position = values.iter.position();
            values.next().map(|pixel| (position, pixel))
        })
    }
}

/// The Rust `Iterator` side of a `PixelIter`.
///
/// Kept apart from `PixelIter` so that `a.lt(&b)`, `a.partial_cmp(&b)`
/// and friends resolve to the rank ordering, never to the element-wise
/// comparisons of `Iterator`.
#[derive(Debug)]
pub struct Values<'a, T, C : Cursor> {
    iter : PixelIter<'a, T, C>,
}

impl<'a, T, C : Cursor> Clone for Values<'a, T, C> {
    fn clone(&self) -> Self {
        Values { iter : self.iter.clone() }
    }
}

impl<'a, T, C : Cursor> Iterator for Values<'a, T, C> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if self.iter.is_end() {
            return None;
        }
        let pixel = self.iter.get();
        self.iter.increment();
        Some(pixel)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.iter.cursor.len() - self.iter.cursor.index()).max(0) as usize;
        (remaining, Some(remaining))
    }
}

impl<'a, T, C : Cursor> ExactSizeIterator for Values<'a, T, C> {}

impl<'a, T, C : Cursor> IntoIterator for PixelIter<'a, T, C> {
    type Item = &'a T;
    type IntoIter = Values<'a, T, C>;

    fn into_iter(self) -> Values<'a, T, C> {
        self.values()
    }
}

impl<'a, T, C : Cursor> Add<i64> for PixelIter<'a, T, C> {
    type Output = Self;

    fn add(mut self, n : i64) -> Self {
        self.cursor.advance(n);
        self
    }
}

impl<'a, T, C : Cursor> Sub<i64> for PixelIter<'a, T, C> {
    type Output = Self;

    fn sub(mut self, n : i64) -> Self {
        self.cursor.advance(-n);
        self
    }
}

/// Distance in traversal order.
impl<'a, T, C : Cursor> Sub for &PixelIter<'a, T, C> {
    type Output = i64;

    fn sub(self, other : Self) -> i64 {
        debug_assert!(
            self.cursor.same_geometry(&other.cursor),
            "Distance between iterators of different ranges"
        );
        self.cursor.index() - other.cursor.index()
    }
}

/// `it[n]` is the pixel `n` ranks after `it`.
impl<'a, T, C : Cursor> Index<i64> for PixelIter<'a, T, C> {
    type Output = T;

    fn index(&self, n : i64) -> &T {
        let mut cursor = self.cursor;
        cursor.advance(n);
        &self.pixels[checked_offset(&cursor, self.pixels.len())]
    }
}

impl<'a, T, C : Cursor> PartialEq for PixelIter<'a, T, C> {
    fn eq(&self, other : &Self) -> bool {
        self.cursor.same_geometry(&other.cursor) && self.cursor.index() == other.cursor.index()
    }
}

impl<'a, T, C : Cursor> PartialEq<C> for PixelIter<'a, T, C> {
    fn eq(&self, other : &C) -> bool {
        self.cursor.same_geometry(other) && self.cursor.index() == other.index()
    }
}

/// Iterators of different ranges are unordered.
impl<'a, T, C : Cursor> PartialOrd for PixelIter<'a, T, C> {
    fn partial_cmp(&self, other : &Self) -> Option<Ordering> {
        if !self.cursor.same_geometry(&other.cursor) {
            return None;
        }
        Some(self.cursor.index().cmp(&other.cursor.index()))
    }
}

/// Mutable iterator. Not a Rust `Iterator`: it is driven by hand and
/// compared against the cursor of the matching `end_*` call.
///
/// ## Example
///
/// ```
/// use yayi_core::{Coordinate, Image, Window};
///
/// let mut image = Image::<u16>::with_size(Coordinate::from([5, 5])).unwrap();
/// image.allocate_image().unwrap();
///
/// let window = Window::new(Coordinate::from([1, 1]), Coordinate::from([3, 3])).unwrap();
/// let end = image.end_window(&window).unwrap().cursor();
/// let mut it = image.begin_window_mut(&window).unwrap();
/// while it != end {
///     *it.get_mut() = 7;
///     it.increment();
/// }
/// assert_eq!(image.as_slice().iter().filter(|&&p| p == 7).count(), 9);
/// ```
#[derive(Debug)]
pub struct PixelIterMut<'a, T, C : Cursor> {
    pixels : &'a mut [T],
    cursor : C,
}

impl<'a, T, C : Cursor> PixelIterMut<'a, T, C> {
    pub (crate) fn new(pixels : &'a mut [T], cursor : C) -> Self {
        PixelIterMut { pixels, cursor }
    }

    #[inline]
    pub fn get(&self) -> &T {
        &self.pixels[checked_offset(&self.cursor, self.pixels.len())]
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        let offset = checked_offset(&self.cursor, self.pixels.len());
        &mut self.pixels[offset]
    }

    /// The pixel `n` ranks after the iterator.
    pub fn at_mut(&mut self, n : i64) -> &mut T {
        let mut cursor = self.cursor;
        cursor.advance(n);
        let offset = checked_offset(&cursor, self.pixels.len());
        &mut self.pixels[offset]
    }

    pub fn cursor(&self) -> C {
        self.cursor
    }

    pub fn position(&self) -> Coordinate {
        self.cursor.position()
    }

    pub fn offset(&self) -> i64 {
        self.cursor.offset()
    }

    pub fn index(&self) -> i64 {
        self.cursor.index()
    }

    pub fn is_end(&self) -> bool {
        self.cursor.is_end()
    }

    #[inline]
    pub fn increment(&mut self) {
        self.cursor.increment();
    }

    pub fn decrement(&mut self) {
        self.cursor.decrement();
    }

    pub fn advance(&mut self, n : i64) {
        self.cursor.advance(n);
    }

    pub fn set_position(&mut self, coord : &Coordinate) -> Result<()> {
        self.cursor.set_position(coord)
    }
}

impl<'a, T, C : Cursor> PartialEq<C> for PixelIterMut<'a, T, C> {
    fn eq(&self, other : &C) -> bool {
        self.cursor.same_geometry(other) && self.cursor.index() == other.index()
    }
}

/// A mutable iterator gives up its write access to become a
/// read-only one. There is no conversion back.
impl<'a, T, C : Cursor> From<PixelIterMut<'a, T, C>> for PixelIter<'a, T, C> {
    fn from(iter : PixelIterMut<'a, T, C>) -> Self {
        let pixels : &'a [T] = iter.pixels;
        PixelIter { pixels, cursor : iter.cursor }
    }
}

pub type BlockIter<'a, T> = PixelIter<'a, T, BlockCursor>;
pub type BlockIterMut<'a, T> = PixelIterMut<'a, T, BlockCursor>;
pub type WindowIter<'a, T> = PixelIter<'a, T, WindowCursor>;
pub type WindowIterMut<'a, T> = PixelIterMut<'a, T, WindowCursor>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Image;
    use proptest::prelude::*;

    fn ramp(size : Coordinate) -> Image<i32> {
        let mut image = Image::<i32>::with_size(size).unwrap();
        image.allocate_image().unwrap();
        image.as_mut_slice().iter_mut().enumerate().for_each(|(i, p)| *p = i as i32);
        image
    }

    #[test]
    fn test_block_traversal() {
        let image = ramp(Coordinate::from([3, 4]));
        let begin = image.begin_block().unwrap();
        let end = image.end_block().unwrap();
        assert_eq!(&end - &begin, 12);
        assert_eq!(begin.clone().values().len(), 12);
        assert_eq!(begin.clone().values().copied().collect::<Vec<_>>(), (0..12).collect::<Vec<_>>());

        let mut it = begin.clone();
        it.set_position(&Coordinate::from([1, 2])).unwrap();
        assert_eq!(*it.get(), 7);
        assert!(it.set_position(&Coordinate::from([3, 0])).is_err());
    }

    #[test]
    fn test_window_row_jump() {
        let image = ramp(Coordinate::from([5, 4]));
        let window = Window::new(Coordinate::from([1, 1]), Coordinate::from([2, 2])).unwrap();
        let mut it = image.begin_window(&window).unwrap();
        assert_eq!(*it.get(), 6);
        it.increment();
        assert_eq!(*it.get(), 7);
        // end of window row jumps to the next window row
        it.increment();
        assert_eq!(it.position(), Coordinate::from([1, 2]));
        assert_eq!(*it.get(), 11);
        it.decrement();
        assert_eq!(it.position(), Coordinate::from([2, 1]));
        assert_eq!(it.offset(), 7);
    }

    #[test]
    fn test_random_access() {
        let image = ramp(Coordinate::from([6, 6]));
        let window = Window::new(Coordinate::from([2, 1]), Coordinate::from([3, 4])).unwrap();
        let begin = image.begin_window(&window).unwrap();
        let end = image.end_window(&window).unwrap();
        assert_eq!(&end - &begin, 12);

        let it = begin.clone() + 4;
        assert_eq!(it.position(), Coordinate::from([3, 2]));
        assert_eq!(begin[4], *it.get());
        assert_eq!(&it - &begin, 4);
        assert!(begin < it);
        assert!(it <= end);
        assert!((it.clone() - 4) == begin);
        assert_eq!(end.clone() - 12, begin);

        // stepping one by one visits the same pixels as indexing
        let mut walker = begin.clone();
        for n in 0..12 {
            assert_eq!(*walker.get(), begin[n]);
            walker.increment();
        }
        assert!(walker == end);
    }

    #[test]
    fn test_different_ranges_are_unordered() {
        let image = ramp(Coordinate::from([4, 4]));
        let a = Window::new(Coordinate::from([0, 0]), Coordinate::from([2, 2])).unwrap();
        let b = Window::new(Coordinate::from([1, 0]), Coordinate::from([2, 2])).unwrap();
        let ia = image.begin_window(&a).unwrap();
        let ib = image.begin_window(&b).unwrap();
        assert_eq!(ia.partial_cmp(&ib), None);
        assert!(ia != ib);
    }

    #[test]
    fn test_clipped_window_count() {
        let image = ramp(Coordinate::from([10, 10]));
        let window = Window::new(Coordinate::from([2, 2]), Coordinate::from([9, 9])).unwrap();
        let visited : Vec<_> = image.begin_window(&window).unwrap().with_positions().collect();
        assert_eq!(visited.len(), 64);
        for (position, &value) in visited {
            assert!((2..10).contains(&position[0]) && (2..10).contains(&position[1]));
            assert_eq!(value as i64, position[0] + 10 * position[1]);
        }

        let outside = Window::new(Coordinate::from([10, 0]), Coordinate::from([2, 2])).unwrap();
        let begin = image.begin_window(&outside).unwrap();
        assert!(begin == image.end_window(&outside).unwrap());
        assert_eq!(begin.values().count(), 0);
    }

    #[test]
    fn test_mutable_to_const() {
        let mut image = ramp(Coordinate::from([4, 2]));
        let end = image.end_block().unwrap().cursor();
        let mut it = image.begin_block_mut().unwrap();
        *it.at_mut(3) = -1;
        it.advance(2);
        assert!(it != end);
        let read_only : BlockIter<'_, i32> = it.into();
        assert_eq!(read_only.values().copied().collect::<Vec<_>>(), vec![2, -1, 4, 5, 6, 7]);
    }

    #[test]
    fn test_ordering_methods_follow_traversal() {
        // pixel values decrease along the traversal, ranks increase
        let mut image = Image::<i32>::with_size(Coordinate::from([4])).unwrap();
        image.allocate_image().unwrap();
        image.as_mut_slice().copy_from_slice(&[9, 1, 1, 1]);
        let begin = image.begin_block().unwrap();
        let next = begin.clone() + 1;

        assert!(begin < next);
        assert!(begin.lt(&next));
        assert!(begin.le(&next));
        assert!(next.gt(&begin));
        assert!(next.ge(&begin));
        assert_eq!(begin.partial_cmp(&next), Some(Ordering::Less));
        assert!(begin.ne(&next));
        assert!(begin.eq(&(next.clone() - 1)));

        let mut sum = 0;
        for &value in begin {
            sum += value;
        }
        assert_eq!(sum, 12);
    }

    #[test]
    fn test_window_set_position_matches_walk() {
        let image = ramp(Coordinate::from([5, 4, 3]));
        let window = Window::new(Coordinate::from([1, 1, 0]), Coordinate::from([3, 2, 3])).unwrap();
        let begin = image.begin_window(&window).unwrap();

        let mut walker = begin.clone();
        for _ in 0..11 {
            walker.increment();
        }
        // 11 = 2 + 3 * (1 + 2 * 1) in the 3x2x3 window
        assert_eq!(walker.position(), Coordinate::from([3, 2, 1]));

        let mut jumped = begin.clone();
        jumped.set_position(&walker.position()).unwrap();
        assert!(jumped == walker);
        assert_eq!(jumped.index(), 11);
        assert_eq!(jumped.offset(), walker.offset());
        assert_eq!(*jumped.get(), 3 + 5 * 2 + 20 * 1);

        // outside the window, even if inside the image
        assert!(jumped.set_position(&Coordinate::from([0, 1, 0])).is_err());
        assert!(jumped.set_position(&Coordinate::from([1, 3, 0])).is_err());
        assert_eq!(jumped.index(), 11);
    }

    proptest! {
        #[test]
        fn window_coverage(
            size in proptest::collection::vec(1i64..7, 1..4),
            seed in proptest::collection::vec((0i64..8, 1i64..8), 3),
        ) {
            let size = Coordinate::from_slice(&size);
            let dim = size.dimension();
            let origin = Coordinate::from_slice(&seed[..dim].iter().map(|s| s.0).collect::<Vec<_>>());
            let extent = Coordinate::from_slice(&seed[..dim].iter().map(|s| s.1).collect::<Vec<_>>());
            let window = Window::new(origin, extent).unwrap();
            let clipped = window.clip_to(&size);

            let image = ramp(size);
            let mut count = 0;
            for (position, _) in image.begin_window(&window).unwrap().with_positions() {
                prop_assert!(clipped.contains(&position));
                count += 1;
            }
            prop_assert_eq!(count, clipped.number_of_points());
        }
    }
}
