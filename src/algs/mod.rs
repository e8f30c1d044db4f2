//! Parallel and cancellable algorithms over a `DataStructure`.

pub mod cancel;
pub mod crop;
pub mod parallel;

pub use cancel::CancelToken;
pub use crop::{CropRegion, crop_image_geometry, resample_image_geometry};
pub use parallel::{ParallelOptions, run_tasks};
