//! Resolve ImageMagick-style geometry descriptors into resize and crop plans.
//!
//! Pure geometry: no pixel operations, no I/O, `no_std` compatible (needs
//! `alloc` for error messages). A pixel backend executes the resulting
//! [`TransformPlan`].
//!
//! # Modules
//!
//! - [`geometry`]: Descriptor grammar (`200x300^`, `100x100#c`, `128x128+64+64`)
//! - [`resolve`](mod@resolve): Mode precedence and plan computation
//! - [`plan`]: Plan variants, sizes, and the rounding rule
//! - [`backend`]: Contract for the backend that executes a plan
//!
//! # Example
//!
//! ```
//! use geomspec::{resolve, Rect, Size, TransformPlan};
//!
//! // 512×512 source, 100×100 crop anchored at the center.
//! let plan = resolve(512, 512, "100x100#c").unwrap();
//! assert_eq!(
//!     plan,
//!     TransformPlan::ResizeThenCrop {
//!         resize_to: Size::new(100, 100),
//!         crop: Rect::new(0, 0, 100, 100),
//!     }
//! );
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod backend;
pub mod error;
pub mod geometry;
pub mod plan;
pub mod resolve;

pub use backend::TransformBackend;
pub use error::{GeometryError, InvalidReason};
pub use geometry::{Anchor1D, GeometryDescriptor, Gravity, Modifier, Modifiers};
pub use plan::{PlanKind, Rect, ResizeDirection, Size, TransformPlan, round_px};
pub use resolve::{SourceDimensions, resolve, resolve_descriptor};
