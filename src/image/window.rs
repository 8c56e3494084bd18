use crate::coordinate::{
    is_point_inside,
    max_coordinate,
    min_coordinate,
    total_number_of_points,
    Coordinate,
};
use crate::errors::{ImageError, Result};

/// An axis-aligned hyper-rectangle `[origin, origin + extent)`
/// of an image's coordinate space.
///
/// A `Window` built with `new` is validated (non-negative origin,
/// strictly positive extent). Clipping it to an image may produce
/// an empty window, which iterates over nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    origin : Coordinate,
    extent : Coordinate,
}

impl Window {
    /// ## Arguments
    ///
    /// * `origin` - First corner, every axis `>= 0`
    ///
    /// * `extent` - Number of points along each axis, every axis `> 0`
    ///
    /// ## Example
    ///
    /// ```
    /// use yayi_core::{Coordinate, Window};
    ///
    /// let w = Window::new(Coordinate::from([2, 2]), Coordinate::from([9, 9])).unwrap();
    /// let clipped = w.clip_to(&Coordinate::from([10, 10]));
    /// assert_eq!(clipped.number_of_points(), 64);
    /// ```
    pub fn new(origin : Coordinate, extent : Coordinate) -> Result<Window> {
        if origin.dimension() != extent.dimension() || origin.dimension() == 0 {
            return Err(ImageError::BadParameters(format!(
                "Window origin {} and extent {} must share a non-zero dimension",
                origin, extent
            )));
        }
        if origin.iter().any(|&v| v < 0) {
            return Err(ImageError::BadParameters(format!(
                "Window origin {} has a negative axis", origin
            )));
        }
        if extent.iter().any(|&v| v <= 0) {
            return Err(ImageError::BadParameters(format!(
                "Window extent {} has a non-positive axis", extent
            )));
        }
        Ok(Window { origin, extent })
    }

    /// The window covering a full image of size `size`.
    pub fn whole(size : &Coordinate) -> Window {
        Window { origin : Coordinate::new(size.dimension()), extent : *size }
    }

    pub fn origin(&self) -> &Coordinate {
        &self.origin
    }

    pub fn extent(&self) -> &Coordinate {
        &self.extent
    }

    /// One past the last corner
    pub fn end(&self) -> Coordinate {
        self.origin + self.extent
    }

    pub fn dimension(&self) -> usize {
        self.origin.dimension()
    }

    /// Intersection with the domain `[0, size)`. Axes starting past
    /// the image get a zero extent.
    pub fn clip_to(&self, size : &Coordinate) -> Window {
        let start = min_coordinate(&self.origin, size);
        let stop = min_coordinate(&(start + self.extent), size);
        let extent = max_coordinate(&(stop - start), &Coordinate::new(start.dimension()));
        Window { origin : start, extent }
    }

    pub fn is_empty(&self) -> bool {
        self.extent.iter().any(|&v| v <= 0)
    }

    pub fn contains(&self, coord : &Coordinate) -> bool {
        coord.dimension() == self.dimension()
            && is_point_inside(&self.extent, &(*coord - self.origin))
    }

    pub fn number_of_points(&self) -> i64 {
        if self.is_empty() {
            return 0;
        }
        total_number_of_points(&self.extent)
    }
}
