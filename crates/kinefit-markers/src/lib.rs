//! Raw marker capture preparation.
//!
//! CSV ingestion, Gaussian temporal smoothing and subject scale calibration
//! for optical marker captures, upstream of the pose fitter.

pub mod calibrate;
pub mod error;
pub mod filter;
pub mod io;

pub use calibrate::scale_markers;
pub use error::MarkerError;
pub use filter::gaussian_filter;
pub use io::{
    load_points, load_points_2d, parse_points, parse_points_2d, points_to_string, save_points,
};
