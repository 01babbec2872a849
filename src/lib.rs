//! Multi-level seam carving.
//!
//! A `Carver` removes (or duplicates) the least important seams of an
//! image to change its size without squashing its content.  The seams
//! are computed once into a visibility map; after that any size within
//! the map's range is a cheap table rebuild.
//!
//! ```no_run
//! use liquidcarve::{carver_from_image, LogProgress};
//!
//! let image = image::open("in.png").unwrap().to_rgba();
//! let mut carver = carver_from_image(&image).unwrap();
//! carver.init(1, 0.0).unwrap();
//! carver.set_progress(Box::new(LogProgress::default()));
//! carver.resize(image.width() as usize - 100, image.height() as usize).unwrap();
//! let out: image::RgbaImage = carver.to_image().unwrap();
//! out.save("out.png").unwrap();
//! ```

#[macro_use]
mod ternary;

pub mod attached;
pub mod bias;
pub mod carver;
pub mod energy;
pub mod error;
pub mod gradient;
pub mod imageio;
pub mod minpath;
pub mod pixelbuffer;
pub mod progress;
pub mod resize;
pub mod rigidity;
pub mod seam;
pub mod twodmap;
pub mod vmap;

pub use carver::{Carver, ResizeOrder};
pub use energy::calculate_energy;
pub use error::{CarverError, Result, Severity};
pub use gradient::{GradientFn, GradientFunction, UnknownGradient};
pub use imageio::{buffer_to_image, carver_from_image, energy_to_image};
pub use minpath::{minpath_map, TieBreak};
pub use pixelbuffer::{ColorDepth, PixelBuffer, Sample, Samples};
pub use progress::{LogProgress, Progress, ProgressMessages};
pub use rigidity::Rigidity;
pub use seam::{find_horizontal_seam, find_vertical_seam};
pub use twodmap::TwoDimensionalMap;
pub use vmap::VisibilityMap;
