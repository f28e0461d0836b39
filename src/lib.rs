//! Interactive region selection and cropping.
//!
//! A host UI feeds pointer events and live layout into a [`CropSession`];
//! the session keeps the selection inside the displayed image under zoom and,
//! on apply, cuts the matching native-pixel region out of the source image
//! and encodes it as JPEG.

pub mod config;
pub mod error;
pub mod executor;
pub mod geometry;
pub mod selection;
pub mod session;
pub mod viewport;
pub mod zoom;

pub use config::{CropConfig, load_config};
pub use error::{CropError, CropResult};
pub use executor::{EncodedImage, ImageSource};
pub use geometry::{NativeSize, PixelRect, Point, Rect};
pub use selection::{Corner, SelectionState};
pub use session::CropSession;
pub use viewport::LayoutProvider;
