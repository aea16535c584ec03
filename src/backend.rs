//! Contract for the pixel backend that executes a [`TransformPlan`].
//!
//! This crate never touches pixels. A backend implements the three primitive
//! operations and [`TransformPlan::apply`] maps each plan variant onto them:
//!
//! | Plan             | Calls                        |
//! |------------------|------------------------------|
//! | `ScaleOnly`      | `shrink(x_scale, y_scale)`   |
//! | `Identity`       | none                         |
//! | `ResizeOnly`     | `resize(width, height)`      |
//! | `ResizeThenCrop` | `resize(..)` then `crop(..)` |
//! | `CropOnly`       | `crop(..)`                   |

use crate::plan::TransformPlan;

/// Primitive operations a pixel backend provides.
pub trait TransformBackend {
    type Error;

    /// Resize to exactly `width × height`, ignoring the current aspect ratio.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), Self::Error>;

    /// Divide the current width by `x_scale` and height by `y_scale`.
    fn shrink(&mut self, x_scale: f64, y_scale: f64) -> Result<(), Self::Error>;

    /// Extract a `width × height` window at `(x, y)` of the current image.
    fn crop(&mut self, x: i64, y: i64, width: u32, height: u32) -> Result<(), Self::Error>;
}

impl TransformPlan {
    /// Drive `backend` through this plan.
    pub fn apply<B: TransformBackend + ?Sized>(&self, backend: &mut B) -> Result<(), B::Error> {
        match *self {
            Self::ScaleOnly { x_scale, y_scale } => backend.shrink(x_scale, y_scale),
            Self::Identity { .. } => Ok(()),
            Self::ResizeOnly { width, height, .. } => backend.resize(width, height),
            Self::ResizeThenCrop { resize_to, crop } => {
                backend.resize(resize_to.width, resize_to.height)?;
                backend.crop(crop.x.into(), crop.y.into(), crop.width, crop.height)
            }
            Self::CropOnly {
                width,
                height,
                x,
                y,
            } => backend.crop(x.into(), y.into(), width, height),
        }
    }
}
