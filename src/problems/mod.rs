//! Example problems.
//!
//! - [`Landscape`] / [`Evolution2D`]: maximize (or minimize) a function of
//!   two variables over a square range
//! - [`Tsp`]: shortest closed tour through random nodes in the plane

mod landscape;
mod tsp;

pub use landscape::{Evolution2D, Landscape, LandscapeGrid, Point, ValueRange, MAX_GRID_AXIS};
pub use tsp::{Tour, TourMove, Tsp, TspConfig};
