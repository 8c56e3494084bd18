//! Parallel per-pixel operations over image windows.
//!
//! The clipped window is cut along its slowest axis into chunks of
//! `rows_per_chunk` slices, and each chunk goes to one rayon task.
//! Chunks are disjoint, so workers never share a mutable pixel.

use ndarray::{Axis, AxisDescription, Dimension, Slice, Zip};
use rayon::prelude::*;

use crate::coordinate::Coordinate;
use crate::errors::{ImageError, Result};
use crate::image::{Image, Window};
use crate::pixel::PixelType;

/// Settings of a `WindowDispatcher`.
///
/// ## Example
///
/// ```
/// use yayi_core::ParallelConfig;
///
/// let config = ParallelConfig::default().num_threads(4).rows_per_chunk(16);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParallelConfig {
    /// Worker count, `None` lets rayon decide
    pub num_threads : Option<usize>,
    /// Slices of the slowest axis handed to one task
    pub rows_per_chunk : usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        ParallelConfig { num_threads : None, rows_per_chunk : 8 }
    }
}

impl ParallelConfig {
    pub fn num_threads(mut self, num_threads : usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    pub fn rows_per_chunk(mut self, rows_per_chunk : usize) -> Self {
        self.rows_per_chunk = rows_per_chunk;
        self
    }
}

/// Runs per-pixel operations over image windows on its own
/// thread pool, sized once at construction.
#[derive(Debug)]
pub struct WindowDispatcher {
    pool : rayon::ThreadPool,
    config : ParallelConfig,
}

/// Restricts ndarray axis `axis` (reversed image axis) to the window.
fn window_slice(window : &Window, axis : AxisDescription) -> Slice {
    let image_axis = window.dimension() - 1 - axis.axis.index();
    let start = window.origin()[image_axis] as isize;
    Slice::new(start, Some(start + window.extent()[image_axis] as isize), 1)
}

impl WindowDispatcher {
    /// ## Errors
    ///
    /// * `BadParameters` if `rows_per_chunk` is 0 or `num_threads` is `Some(0)`
    ///
    /// * `Unknown` if the operating system refuses to spawn the workers
    pub fn new(config : ParallelConfig) -> Result<WindowDispatcher> {
        if config.rows_per_chunk == 0 {
            return Err(ImageError::BadParameters("rows_per_chunk must be at least 1".to_string()));
        }
        if config.num_threads == Some(0) {
            return Err(ImageError::BadParameters("num_threads must be at least 1".to_string()));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_threads.unwrap_or(0))
            .build()
            .map_err(|err| ImageError::Unknown(format!("Cannot build the worker pool: {}", err)))?;
        log::debug!("Window dispatcher running {} workers", pool.current_num_threads());
        Ok(WindowDispatcher { pool, config })
    }

    pub fn config(&self) -> &ParallelConfig {
        &self.config
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Calls `op(position, pixel)` on every pixel of `window`
    /// clipped to `image`, in parallel.
    ///
    /// ## Arguments
    ///
    /// * `image` - Allocated image to modify
    ///
    /// * `window` - Region to visit, clipped to the image
    ///
    /// * `op` - Per-pixel operation. The first error stops the
    /// remaining tasks and is returned.
    ///
    /// ## Returns
    ///
    /// * `Result<usize>` - Number of pixels visited
    ///
    /// ## Example
    ///
    /// ```
    /// use yayi_core::{Coordinate, Image, ParallelConfig, Window, WindowDispatcher};
    ///
    /// let mut image = Image::<u32>::with_size(Coordinate::from([8, 8])).unwrap();
    /// image.allocate_image().unwrap();
    ///
    /// let dispatcher = WindowDispatcher::new(ParallelConfig::default().num_threads(2)).unwrap();
    /// let window = Window::whole(&image.size());
    /// let visited = dispatcher.apply_window(&mut image, &window, |position, pixel| {
    ///     *pixel = (position[0] * position[1]) as u32;
    ///     Ok(())
    /// }).unwrap();
    ///
    /// assert_eq!(visited, 64);
    /// assert_eq!(*image.pixel_at(&Coordinate::from([3, 5])), 15);
    /// ```
    pub fn apply_window<T, F>(&self, image : &mut Image<T>, window : &Window, op : F) -> Result<usize>
    where
        T : PixelType,
        F : Fn(&Coordinate, &mut T) -> Result<()> + Sync + Send,
    {
        let clipped = image.clipped(window)?;
        let visited = clipped.number_of_points() as usize;
        let rows = self.config.rows_per_chunk;
        let dim = clipped.dimension();

        let mut view = image.view_mut()?;
        view.slice_each_axis_inplace(|axis| window_slice(&clipped, axis));

        // Create an array of chunks to parallelize
        let chunks : Vec<_> = view.axis_chunks_iter_mut(Axis(0), rows).collect();

        self.pool.install(|| {
            chunks.into_par_iter().enumerate().try_for_each(
                |(chunk_idx, mut chunk)| -> Result<()> {
                    let mut position = *clipped.origin();
                    for (index, pixel) in chunk.indexed_iter_mut() {
                        for (k, &i) in index.slice().iter().enumerate() {
                            let axis = dim - 1 - k;
                            position[axis] = clipped.origin()[axis] + i as i64;
                        }
                        position[dim - 1] += (chunk_idx * rows) as i64;
                        op(&position, pixel)?;
                    }
                    Ok(())
                }
            )
        })?;

        log::debug!("Applied a per-pixel operation on {} pixels", visited);
        Ok(visited)
    }

    /// Writes `op(input pixel)` into the matching pixel of the
    /// output window, in parallel. The input is only read.
    ///
    /// ## Errors
    ///
    /// * `BadParameters` if the two clipped windows differ in extent
    ///
    /// * `NotAllocated` if either image is unallocated
    pub fn apply_window_binary<U, T, F>(
        &self,
        input : &Image<U>,
        in_window : &Window,
        output : &mut Image<T>,
        out_window : &Window,
        op : F,
    ) -> Result<usize>
    where
        U : PixelType,
        T : PixelType,
        F : Fn(&U) -> T + Sync + Send,
    {
        let in_clipped = input.clipped(in_window)?;
        let out_clipped = output.clipped(out_window)?;
        if in_clipped.extent() != out_clipped.extent() {
            return Err(ImageError::BadParameters(format!(
                "Input window extent {} differs from output window extent {}",
                in_clipped.extent(), out_clipped.extent()
            )));
        }
        let rows = self.config.rows_per_chunk;

        let mut in_view = input.view()?;
        in_view.slice_each_axis_inplace(|axis| window_slice(&in_clipped, axis));
        let mut out_view = output.view_mut()?;
        out_view.slice_each_axis_inplace(|axis| window_slice(&out_clipped, axis));

        let chunks : Vec<_> = in_view.axis_chunks_iter(Axis(0), rows)
            .zip(out_view.axis_chunks_iter_mut(Axis(0), rows))
            .collect();

        self.pool.install(|| {
            chunks.into_par_iter().for_each(|(in_chunk, mut out_chunk)| {
                Zip::from(&mut out_chunk).and(&in_chunk).for_each(|out, pixel| *out = op(pixel));
            });
        });

        Ok(in_clipped.number_of_points() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::Pixel3;

    fn ramp(size : Coordinate) -> Image<i64> {
        let mut image = Image::<i64>::with_size(size).unwrap();
        image.allocate_image().unwrap();
        image.as_mut_slice().iter_mut().enumerate().for_each(|(i, p)| *p = i as i64);
        image
    }

    #[test]
    fn test_config_validation() {
        assert!(WindowDispatcher::new(ParallelConfig::default().rows_per_chunk(0)).is_err());
        assert!(WindowDispatcher::new(ParallelConfig::default().num_threads(0)).is_err());
        let dispatcher = WindowDispatcher::new(ParallelConfig::default().num_threads(3)).unwrap();
        assert_eq!(dispatcher.num_threads(), 3);
    }

    #[test]
    fn test_positions_match_offsets() {
        let size = Coordinate::from([7, 5, 6]);
        let mut image = ramp(size);
        let dispatcher = WindowDispatcher::new(ParallelConfig::default().rows_per_chunk(2)).unwrap();
        let window = Window::new(Coordinate::from([1, 2, 1]), Coordinate::from([10, 2, 4])).unwrap();

        let visited = dispatcher.apply_window(&mut image, &window, |position, pixel| {
            let expected = crate::coordinate::from_coordinate_to_offset(&size, position);
            if *pixel != expected {
                return Err(ImageError::Unknown(format!("{} at {}", pixel, position)));
            }
            *pixel = -1;
            Ok(())
        }).unwrap();

        assert_eq!(visited, 6 * 2 * 4);
        let clipped = window.clip_to(&size);
        for (position, &value) in image.begin_block().unwrap().with_positions() {
            assert_eq!(value == -1, clipped.contains(&position), "at {}", position);
        }
    }

    #[test]
    fn test_first_error_is_returned() {
        let mut image = ramp(Coordinate::from([4, 4]));
        let dispatcher = WindowDispatcher::new(ParallelConfig::default()).unwrap();
        let window = Window::whole(&image.size());
        let result = dispatcher.apply_window(&mut image, &window, |position, _| {
            if position[1] == 3 {
                return Err(ImageError::BadParameters("last row".to_string()));
            }
            Ok(())
        });
        assert!(matches!(result, Err(ImageError::BadParameters(_))));
    }

    #[test]
    fn test_binary_window_copy() {
        let input = ramp(Coordinate::from([6, 6]));
        let mut output = Image::<Pixel3<i64>>::with_size(Coordinate::from([3, 3])).unwrap();
        output.allocate_image().unwrap();
        let dispatcher = WindowDispatcher::new(ParallelConfig::default().rows_per_chunk(1)).unwrap();

        let in_window = Window::new(Coordinate::from([2, 3]), Coordinate::from([2, 2])).unwrap();
        let out_window = Window::new(Coordinate::from([1, 1]), Coordinate::from([2, 2])).unwrap();
        let written = dispatcher.apply_window_binary(
            &input, &in_window, &mut output, &out_window, |&v| Pixel3([v, 0, -v])
        ).unwrap();

        assert_eq!(written, 4);
        assert_eq!(*output.pixel_at(&Coordinate::from([1, 1])), Pixel3([20, 0, -20]));
        assert_eq!(*output.pixel_at(&Coordinate::from([2, 2])), Pixel3([27, 0, -27]));
        assert_eq!(*output.pixel_at(&Coordinate::from([0, 0])), Pixel3::default());

        let wide = Window::new(Coordinate::from([0, 0]), Coordinate::from([3, 2])).unwrap();
        assert!(matches!(
            dispatcher.apply_window_binary(&input, &wide, &mut output, &out_window, |&v| Pixel3([v; 3])),
            Err(ImageError::BadParameters(_))
        ));
    }
}
