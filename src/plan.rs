//! Transform plans: the numeric output of [`resolve`](crate::resolve()).
//!
//! A plan is a plain value telling a pixel backend what to do. Each variant
//! carries only the fields its mode needs; see [`TransformPlan`].
//!
//! # Rounding
//!
//! All ratio math happens in `f64`. Values are rounded exactly once, when a
//! plan field is built, by [`round_px`]: nearest integer, ties away from zero.
//! Sizes are additionally clamped to at least one pixel.

use num_traits::Float;

/// Width × height dimensions in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a new size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Create a new rect.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether this rect lies entirely inside `(0, 0, w, h)`.
    pub fn fits_within(&self, w: u32, h: u32) -> bool {
        self.x as u64 + self.width as u64 <= w as u64
            && self.y as u64 + self.height as u64 <= h as u64
    }
}

/// Which way the backend may scale when executing a [`TransformPlan::ResizeOnly`].
///
/// Derived from the conditional modifiers: `>` limits the backend to
/// shrinking, `<` to enlarging.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResizeDirection {
    /// Shrink only.
    Down,
    /// Enlarge only.
    Up,
    /// Either way.
    #[default]
    Both,
}

/// Resolved resize/crop instructions for one source image.
///
/// Sizes and offsets are whole pixels, already rounded with [`round_px`].
/// Scale factors stay fractional.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransformPlan {
    /// Scale each axis independently (`!`).
    ///
    /// Factors are source over target: the backend divides the source
    /// dimensions by them. This is the inverse of the `scale` field on the
    /// other variants.
    ScaleOnly { x_scale: f64, y_scale: f64 },

    /// Leave the image alone (`>` / `<` rule fired). `scale` is always 1.
    ///
    /// Only the requested axes are compared: `1000x>` fires for any source
    /// narrower than 1000 pixels, whatever its height.
    Identity { width: u32, height: u32, scale: f64 },

    /// Resize to exactly `width × height`; aspect ratio is already resolved.
    ///
    /// `scale` is target width over source width, computed before rounding.
    ResizeOnly {
        width: u32,
        height: u32,
        scale: f64,
        direction: ResizeDirection,
    },

    /// Resize to `resize_to`, then extract `crop` from the resized image.
    ResizeThenCrop { resize_to: Size, crop: Rect },

    /// Extract a rectangle from the untouched source.
    ///
    /// Offsets are taken verbatim from the descriptor and may be negative.
    CropOnly {
        width: u32,
        height: u32,
        x: i32,
        y: i32,
    },
}

/// Fieldless tag for a [`TransformPlan`] variant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlanKind {
    /// [`TransformPlan::ScaleOnly`].
    ScaleOnly,
    /// [`TransformPlan::Identity`].
    Identity,
    /// [`TransformPlan::ResizeOnly`].
    ResizeOnly,
    /// [`TransformPlan::ResizeThenCrop`].
    ResizeThenCrop,
    /// [`TransformPlan::CropOnly`].
    CropOnly,
}

impl TransformPlan {
    /// The variant tag, without its fields.
    pub fn kind(&self) -> PlanKind {
        match self {
            Self::ScaleOnly { .. } => PlanKind::ScaleOnly,
            Self::Identity { .. } => PlanKind::Identity,
            Self::ResizeOnly { .. } => PlanKind::ResizeOnly,
            Self::ResizeThenCrop { .. } => PlanKind::ResizeThenCrop,
            Self::CropOnly { .. } => PlanKind::CropOnly,
        }
    }

    /// Whether the backend has to resample pixels.
    pub fn needs_resize(&self) -> bool {
        match *self {
            Self::ScaleOnly { x_scale, y_scale } => x_scale != 1.0 || y_scale != 1.0,
            Self::ResizeOnly { .. } | Self::ResizeThenCrop { .. } => true,
            Self::Identity { .. } | Self::CropOnly { .. } => false,
        }
    }

    /// Whether the backend has to extract a sub-rectangle.
    pub fn needs_crop(&self) -> bool {
        matches!(self, Self::ResizeThenCrop { .. } | Self::CropOnly { .. })
    }

    /// Dimensions of the image the backend produces from a `source`-sized input.
    ///
    /// For [`CropOnly`](Self::CropOnly) this is the nominal rectangle; a
    /// backend may clip it when the offsets reach past the source edge.
    pub fn output_size(&self, source: Size) -> Size {
        match *self {
            Self::ScaleOnly { x_scale, y_scale } => Size::new(
                round_dim(source.width as f64 / x_scale),
                round_dim(source.height as f64 / y_scale),
            ),
            Self::Identity { width, height, .. }
            | Self::ResizeOnly { width, height, .. }
            | Self::CropOnly { width, height, .. } => Size::new(width, height),
            Self::ResizeThenCrop { crop, .. } => Size::new(crop.width, crop.height),
        }
    }
}

/// Round to the nearest whole pixel, ties away from zero.
///
/// Negative values and NaN become 0; values past `u32::MAX` saturate.
pub fn round_px(v: f64) -> u32 {
    let r = Float::round(v);
    if r.is_nan() || r <= 0.0 { 0 } else { r as u32 }
}

/// [`round_px`] clamped to at least one pixel.
pub(crate) fn round_dim(v: f64) -> u32 {
    round_px(v).max(1)
}

/// [`round_dim`], or `None` when the rounded value exceeds `u32::MAX`.
pub(crate) fn checked_dim(v: f64) -> Option<u32> {
    (Float::round(v) <= u32::MAX as f64).then(|| round_dim(v))
}
