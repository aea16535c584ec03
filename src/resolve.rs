//! Mode selection and plan computation.
//!
//! [`resolve_descriptor`] checks the modes below in order and returns on the
//! first match:
//!
//! 1. `!`: [`TransformPlan::ScaleOnly`], source over target per axis.
//! 2. `>` / `<`: [`TransformPlan::Identity`] when the source is strictly
//!    smaller (`>`) or strictly larger (`<`) on every requested axis.
//! 3. `^`: cover resize, [`TransformPlan::ResizeOnly`].
//! 4. `#` with gravity: cover resize, then crop, [`TransformPlan::ResizeThenCrop`].
//! 5. `+X+Y`: [`TransformPlan::CropOnly`] with the offsets as given.
//! 6. Otherwise: aspect-preserving resize, [`TransformPlan::ResizeOnly`].
//!
//! # Example
//!
//! ```
//! use geomspec::{resolve, TransformPlan};
//!
//! let plan = resolve(280, 355, "30x").unwrap();
//! assert!(matches!(plan, TransformPlan::ResizeOnly { width: 30, height: 38, .. }));
//! ```

use crate::error::{GeometryError, InvalidReason};
use crate::geometry::{GeometryDescriptor, Gravity, Modifier, Modifiers};
use crate::plan::{Rect, ResizeDirection, Size, TransformPlan, checked_dim, round_px};

/// Pixel dimensions of the source image. Both axes are positive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceDimensions {
    width: u32,
    height: u32,
}

impl SourceDimensions {
    /// Validate a source size. Either axis being zero is
    /// [`GeometryError::InvalidDimensions`].
    pub fn new(width: u32, height: u32) -> Result<Self, GeometryError> {
        if width == 0 || height == 0 {
            return Err(GeometryError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    /// Source width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Source height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Both axes as a [`Size`].
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Height over width.
    pub fn aspect_ratio(&self) -> f64 {
        self.height as f64 / self.width as f64
    }

    /// Square counts as landscape.
    pub fn is_landscape(&self) -> bool {
        self.aspect_ratio() <= 1.0
    }
}

/// Parse `descriptor` and resolve it against a `orig_width × orig_height` source.
///
/// Source dimensions are checked first, so a zero-sized source reports
/// [`GeometryError::InvalidDimensions`] even when the descriptor is also bad.
pub fn resolve(
    orig_width: u32,
    orig_height: u32,
    descriptor: &str,
) -> Result<TransformPlan, GeometryError> {
    let source = SourceDimensions::new(orig_width, orig_height)?;
    let geom = GeometryDescriptor::parse(descriptor)?;
    resolve_descriptor(source, &geom)
}

/// Resolve an already parsed (or programmatically built) descriptor.
///
/// Fails with [`InvalidReason::ResultOutOfRange`] when a derived size would
/// not fit in a `u32`.
pub fn resolve_descriptor(
    source: SourceDimensions,
    geom: &GeometryDescriptor,
) -> Result<TransformPlan, GeometryError> {
    geom.validate()?;
    let plan = select(source, geom)
        .map_err(|reason| GeometryError::invalid(alloc::format!("{geom}"), reason))?;
    tracing::debug!(
        source.width = source.width,
        source.height = source.height,
        geometry = %geom,
        kind = ?plan.kind(),
        "resolved geometry"
    );
    Ok(plan)
}

fn select(
    source: SourceDimensions,
    geom: &GeometryDescriptor,
) -> Result<TransformPlan, InvalidReason> {
    let ow = source.width as f64;
    let oh = source.height as f64;
    let direction = direction(geom.modifiers);

    // Modes 1, 3, 4 and 5 need both dimensions; validate() rejects those
    // descriptors otherwise.
    let both = geom.width.zip(geom.height);

    // 1. Ignore aspect ratio.
    if let Some((w, h)) = both.filter(|_| geom.has(Modifier::IgnoreAspectRatio)) {
        return Ok(TransformPlan::ScaleOnly {
            x_scale: ow / w as f64,
            y_scale: oh / h as f64,
        });
    }

    // 2. Conditional no-resize.
    if skips_resize(source, geom) {
        return Ok(TransformPlan::Identity {
            width: source.width,
            height: source.height,
            scale: 1.0,
        });
    }

    // 3. Fill area.
    if let Some((w, h)) = both.filter(|_| geom.has(Modifier::FillArea)) {
        let (fw, fh) = cover(ow, oh, w as f64, h as f64);
        let size = pixel_size(fw, fh)?;
        return Ok(TransformPlan::ResizeOnly {
            width: size.width,
            height: size.height,
            scale: fw / ow,
            direction,
        });
    }

    // 4. Crop with gravity.
    if let (Some((w, h)), Some(gravity)) = (both, geom.gravity) {
        return crop_with_gravity(ow, oh, w, h, gravity);
    }

    // 5. Crop with explicit offsets.
    if let (Some((w, h)), Some((x, y))) = (both, geom.offset) {
        return Ok(TransformPlan::CropOnly {
            width: w,
            height: h,
            x,
            y,
        });
    }

    // 6. Aspect-preserving resize.
    let (w, h) = proportional(source, geom.width, geom.height);
    let size = pixel_size(w, h)?;
    Ok(TransformPlan::ResizeOnly {
        width: size.width,
        height: size.height,
        scale: w / ow,
        direction,
    })
}

/// Round an exact size to whole pixels, refusing sizes past `u32::MAX`.
fn pixel_size(w: f64, h: f64) -> Result<Size, InvalidReason> {
    match (checked_dim(w), checked_dim(h)) {
        (Some(w), Some(h)) => Ok(Size::new(w, h)),
        _ => Err(InvalidReason::ResultOutOfRange),
    }
}

fn direction(modifiers: Modifiers) -> ResizeDirection {
    if modifiers.contains(Modifier::NoDownscale) {
        ResizeDirection::Down
    } else if modifiers.contains(Modifier::NoUpscale) {
        ResizeDirection::Up
    } else {
        ResizeDirection::Both
    }
}

/// `>` fires when the source is strictly smaller on every requested axis,
/// `<` when it is strictly larger. Absent axes do not take part.
fn skips_resize(source: SourceDimensions, geom: &GeometryDescriptor) -> bool {
    let every_axis = |cmp: fn(u32, u32) -> bool| {
        geom.width.is_none_or(|w| cmp(source.width, w))
            && geom.height.is_none_or(|h| cmp(source.height, h))
    };
    (geom.has(Modifier::NoDownscale) && every_axis(|o, r| o < r))
        || (geom.has(Modifier::NoUpscale) && every_axis(|o, r| o > r))
}

/// Smallest aspect-preserving size that covers `tw × th`.
/// One axis matches the target; the other is ≥ target.
fn cover(ow: f64, oh: f64, tw: f64, th: f64) -> (f64, f64) {
    let fw = if ow / oh > tw / th {
        // Source is wider than the target box: pin height.
        ow * th / oh
    } else {
        // Source is narrower (or equal): pin width.
        tw
    };
    (fw, fw * oh / ow)
}

fn crop_with_gravity(
    ow: f64,
    oh: f64,
    w: u32,
    h: u32,
    gravity: Gravity,
) -> Result<TransformPlan, InvalidReason> {
    let (fw, fh) = cover(ow, oh, w as f64, h as f64);
    let resize_to = pixel_size(fw, fh)?;
    let (ax, ay) = gravity.anchors();
    let crop = Rect::new(
        round_px(ax.offset(fw - w as f64)),
        round_px(ay.offset(fh - h as f64)),
        w,
        h,
    );
    debug_assert!(crop.fits_within(resize_to.width, resize_to.height));
    Ok(TransformPlan::ResizeThenCrop { resize_to, crop })
}

/// Pin one axis to the request and derive the other from the source aspect
/// ratio.
///
/// Landscape sources pin width when it was given; portrait sources pin
/// height when it was given. The other axis is derived.
fn proportional(source: SourceDimensions, w: Option<u32>, h: Option<u32>) -> (f64, f64) {
    let ar = source.aspect_ratio();
    let w = w.map(f64::from);
    let h = h.map(f64::from);
    match (source.is_landscape(), w, h) {
        (true, Some(w), _) | (false, Some(w), None) => (w, w * ar),
        (_, _, Some(h)) => (h / ar, h),
        // validate() guarantees at least one dimension.
        (_, None, None) => (source.width as f64, source.height as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::string::String;
    use alloc::vec::Vec;

    fn src(w: u32, h: u32) -> SourceDimensions {
        SourceDimensions::new(w, h).unwrap()
    }

    fn resize_size(plan: TransformPlan) -> (u32, u32) {
        match plan {
            TransformPlan::ResizeOnly { width, height, .. } => (width, height),
            other => panic!("expected ResizeOnly, got {other:?}"),
        }
    }

    // ── source dimensions ───────────────────────────────────────────────

    #[test]
    fn zero_source_rejected() {
        assert_eq!(
            resolve(0, 355, "30x"),
            Err(GeometryError::InvalidDimensions {
                width: 0,
                height: 355
            })
        );
        assert!(matches!(
            resolve(280, 0, "not a geometry"),
            Err(GeometryError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn orientation() {
        assert!(src(355, 280).is_landscape());
        assert!(src(512, 512).is_landscape());
        assert!(!src(280, 355).is_landscape());
    }

    // ── 1. ignore aspect ratio ──────────────────────────────────────────

    #[test]
    fn ignore_aspect_is_source_over_target() {
        for (sw, sh) in [(280, 355), (355, 280), (512, 512)] {
            for (tw, th) in [(200, 300), (300, 200), (100, 100)] {
                assert_eq!(
                    resolve(sw, sh, &format!("{tw}x{th}!")).unwrap(),
                    TransformPlan::ScaleOnly {
                        x_scale: sw as f64 / tw as f64,
                        y_scale: sh as f64 / th as f64,
                    },
                    "{sw}x{sh} -> {tw}x{th}!"
                );
            }
        }
    }

    #[test]
    fn ignore_aspect_beats_everything() {
        // `>` would fire (source smaller on both axes) but `!` comes first.
        let plan = resolve(280, 355, "1000x1000!>").unwrap();
        assert!(matches!(plan, TransformPlan::ScaleOnly { .. }));
    }

    // ── 2. conditional no-resize ────────────────────────────────────────

    #[test]
    fn no_downscale_when_smaller() {
        assert_eq!(
            resolve(280, 355, "1000x1000>").unwrap(),
            TransformPlan::Identity {
                width: 280,
                height: 355,
                scale: 1.0
            }
        );
    }

    #[test]
    fn no_downscale_falls_through_when_larger() {
        let plan = resolve(280, 355, "30x30>").unwrap();
        assert_eq!(resize_size(plan), (24, 30));
        assert!(matches!(
            plan,
            TransformPlan::ResizeOnly {
                direction: ResizeDirection::Down,
                ..
            }
        ));
    }

    #[test]
    fn no_upscale_when_larger() {
        assert!(matches!(
            resolve(280, 355, "10x10<").unwrap(),
            TransformPlan::Identity {
                width: 280,
                height: 355,
                ..
            }
        ));
    }

    #[test]
    fn no_upscale_falls_through_when_smaller() {
        let plan = resolve(280, 355, "500x500<").unwrap();
        assert_eq!(resize_size(plan), (394, 500));
        assert!(matches!(
            plan,
            TransformPlan::ResizeOnly {
                direction: ResizeDirection::Up,
                ..
            }
        ));
    }

    #[test]
    fn conditional_needs_every_axis() {
        // Narrower but taller than requested: neither rule fires.
        let plan = resolve(280, 355, "300x300>").unwrap();
        assert_eq!(plan.kind(), crate::PlanKind::ResizeOnly);
        let plan = resolve(280, 355, "300x300<").unwrap();
        assert_eq!(plan.kind(), crate::PlanKind::ResizeOnly);
        // Equal on one axis is not strictly smaller.
        let plan = resolve(280, 355, "280x1000>").unwrap();
        assert_eq!(plan.kind(), crate::PlanKind::ResizeOnly);
    }

    #[test]
    fn conditional_ignores_absent_axis() {
        assert_eq!(
            resolve(280, 355, "1000x>").unwrap().kind(),
            crate::PlanKind::Identity
        );
        assert_eq!(
            resolve(280, 355, "x100<").unwrap().kind(),
            crate::PlanKind::Identity
        );
    }

    // ── 3. fill area ────────────────────────────────────────────────────

    #[test]
    fn fill_pins_height_for_wider_source() {
        let plan = resolve(280, 355, "200x300^").unwrap();
        assert_eq!(resize_size(plan), (237, 300));
    }

    #[test]
    fn fill_pins_width_for_narrower_source() {
        assert_eq!(resize_size(resolve(280, 355, "500x400^").unwrap()), (500, 634));
        assert_eq!(resize_size(resolve(280, 355, "100x100^").unwrap()), (100, 127));
    }

    #[test]
    fn fill_scale_is_unrounded() {
        let TransformPlan::ResizeOnly { scale, .. } = resolve(280, 355, "200x300^").unwrap()
        else {
            panic!("expected ResizeOnly");
        };
        assert!((scale - 300.0 / 355.0).abs() < 1e-12);
    }

    #[test]
    fn fill_beats_gravity_crop() {
        let plan = resolve(512, 512, "100x50^#c").unwrap();
        assert_eq!(resize_size(plan), (100, 100));
    }

    // ── 4. crop with gravity ────────────────────────────────────────────

    #[test]
    fn gravity_center_square() {
        assert_eq!(
            resolve(512, 512, "100x100#c").unwrap(),
            TransformPlan::ResizeThenCrop {
                resize_to: Size::new(100, 100),
                crop: Rect::new(0, 0, 100, 100),
            }
        );
    }

    #[test]
    fn gravity_center_margins_are_symmetric() {
        let TransformPlan::ResizeThenCrop { resize_to, crop } =
            resolve(512, 512, "128x64#c").unwrap()
        else {
            panic!("expected ResizeThenCrop");
        };
        assert_eq!(resize_to, Size::new(128, 128));
        assert_eq!(crop, Rect::new(0, 32, 128, 64));
        assert_eq!(crop.y, resize_to.height - crop.y - crop.height);
    }

    #[test]
    fn gravity_pins_edges() {
        // 512x512 into 100x127: cover is 127x127, 27px spare horizontally.
        let case = |g: &str| match resolve(512, 512, &format!("100x127#{g}")).unwrap() {
            TransformPlan::ResizeThenCrop { resize_to, crop } => {
                assert_eq!(resize_to, Size::new(127, 127));
                (crop.x, crop.y)
            }
            other => panic!("expected ResizeThenCrop, got {other:?}"),
        };
        assert_eq!(case("w"), (0, 0));
        assert_eq!(case("e"), (27, 0));
        assert_eq!(case("c"), (14, 0)); // 13.5 rounds away from zero
        assert_eq!(case("n"), (14, 0));
        assert_eq!(case("ne"), (27, 0));
        assert_eq!(case("sw"), (0, 0));
    }

    #[test]
    fn gravity_pins_vertical_edges() {
        // 280x355 into 100x100: cover is 100x127 (portrait source).
        let case = |g: &str| match resolve(280, 355, &format!("100x100#{g}")).unwrap() {
            TransformPlan::ResizeThenCrop { resize_to, crop } => {
                assert_eq!(resize_to, Size::new(100, 127));
                (crop.x, crop.y)
            }
            other => panic!("expected ResizeThenCrop, got {other:?}"),
        };
        assert_eq!(case("n"), (0, 0));
        assert_eq!(case("s"), (0, 27));
        assert_eq!(case("c"), (0, 13)); // 26.79 / 2 = 13.39
        assert_eq!(case("e"), (0, 13));
        assert_eq!(case("se"), (0, 27));
    }

    #[test]
    fn unknown_gravity_never_defaults() {
        let err = resolve(512, 512, "100x100#xx").unwrap_err();
        assert_eq!(err.reason(), Some(InvalidReason::UnknownGravity));
    }

    #[test]
    fn crop_marker_without_gravity_falls_through() {
        let plan = resolve(280, 355, "30x#").unwrap();
        assert_eq!(resize_size(plan), (30, 38));
    }

    // ── 5. crop with offsets ────────────────────────────────────────────

    #[test]
    fn offsets_crop_verbatim() {
        assert_eq!(
            resolve(512, 512, "128x128+64+64").unwrap(),
            TransformPlan::CropOnly {
                width: 128,
                height: 128,
                x: 64,
                y: 64
            }
        );
        assert_eq!(
            resolve(512, 512, "70x55-10+20").unwrap(),
            TransformPlan::CropOnly {
                width: 70,
                height: 55,
                x: -10,
                y: 20
            }
        );
    }

    #[test]
    fn conflicting_crop_rejected_for_built_descriptor() {
        let geom = GeometryDescriptor::new(100, 100)
            .gravity(Gravity::Center)
            .offset(5, 5);
        let err = resolve_descriptor(src(512, 512), &geom).unwrap_err();
        assert_eq!(err.reason(), Some(InvalidReason::ConflictingCrop));
    }

    // ── 6. default resize ───────────────────────────────────────────────

    #[test]
    fn width_only_portrait() {
        let plan = resolve(280, 355, "30x").unwrap();
        assert_eq!(resize_size(plan), (30, 38));
        let TransformPlan::ResizeOnly {
            scale, direction, ..
        } = plan
        else {
            unreachable!()
        };
        assert!((scale - 30.0 / 280.0).abs() < 1e-12);
        assert_eq!(direction, ResizeDirection::Both);
    }

    #[test]
    fn height_only_landscape() {
        assert_eq!(resize_size(resolve(355, 280, "x30").unwrap()), (38, 30));
    }

    #[test]
    fn both_portrait_pins_height() {
        assert_eq!(resize_size(resolve(280, 355, "30x30").unwrap()), (24, 30));
    }

    #[test]
    fn both_landscape_pins_width() {
        // Landscape with both given pins width, even though height overshoots.
        assert_eq!(resize_size(resolve(355, 280, "100x10").unwrap()), (100, 79));
    }

    #[test]
    fn tiny_target_clamps_to_one_pixel() {
        assert_eq!(resize_size(resolve(10_000, 10, "1x").unwrap()), (1, 1));
    }

    // ── oversized results ───────────────────────────────────────────────

    #[test]
    fn oversized_results_are_rejected() {
        for (sw, sh, desc) in [
            (1, u32::MAX, "4294967295x1#c"),
            (1, u32::MAX, "4294967295x1^"),
            (u32::MAX, 1, "x4294967295"),
            (1, u32::MAX, "4294967295x"),
        ] {
            let err = resolve(sw, sh, desc).unwrap_err();
            assert_eq!(
                err,
                GeometryError::InvalidGeometry {
                    descriptor: desc.into(),
                    reason: InvalidReason::ResultOutOfRange,
                },
                "{sw}x{sh} {desc}"
            );
        }
    }

    #[test]
    fn largest_fitting_results_resolve() {
        assert_eq!(
            resolve(1, 1, "4294967295x").unwrap(),
            TransformPlan::ResizeOnly {
                width: u32::MAX,
                height: u32::MAX,
                scale: u32::MAX as f64,
                direction: ResizeDirection::Both,
            }
        );
        let plan = resolve(u32::MAX, 1, "1x1#e").unwrap();
        assert_eq!(
            plan,
            TransformPlan::ResizeThenCrop {
                resize_to: Size::new(u32::MAX, 1),
                crop: Rect::new(u32::MAX - 1, 0, 1, 1),
            }
        );
    }

    // ── sweeps ──────────────────────────────────────────────────────────

    const SOURCES: &[(u32, u32)] = &[
        (1, 1),
        (280, 355),
        (355, 280),
        (512, 512),
        (1200, 400),
        (400, 1200),
        (4000, 3000),
        (3, 7919),
        (7919, 3),
    ];

    const TARGETS: &[(u32, u32)] = &[
        (1, 1),
        (30, 30),
        (100, 127),
        (127, 100),
        (200, 300),
        (500, 400),
        (1000, 1000),
        (33, 4096),
    ];

    #[test]
    fn sweep_single_axis_preserves_aspect() {
        let mut failures: Vec<String> = Vec::new();
        for &(sw, sh) in SOURCES {
            for &(tw, th) in TARGETS {
                for (w, h) in [(Some(tw), None), (None, Some(th))] {
                    let geom = GeometryDescriptor::new(w.unwrap_or(0), h.unwrap_or(0));
                    let desc = format!("{geom}");
                    let (w, h) = resize_size(resolve_descriptor(src(sw, sh), &geom).unwrap());
                    let (fw, fh) = proportional(src(sw, sh), geom.width, geom.height);
                    // Rounded output is within half a pixel of the exact
                    // aspect-preserving size (or clamped to 1).
                    if (w as f64 - fw).abs() > 0.5 && w != 1 {
                        failures.push(format!("{sw}x{sh} {desc}: width {w} vs exact {fw}"));
                    }
                    if (h as f64 - fh).abs() > 0.5 && h != 1 {
                        failures.push(format!("{sw}x{sh} {desc}: height {h} vs exact {fh}"));
                    }
                    let exact_ratio = fh / fw;
                    let source_ratio = sh as f64 / sw as f64;
                    if (exact_ratio - source_ratio).abs() > 1e-9 * source_ratio {
                        failures.push(format!("{sw}x{sh} {desc}: ratio drift"));
                    }
                }
            }
        }
        assert!(failures.is_empty(), "{} failures:\n{}", failures.len(), failures.join("\n"));
    }

    #[test]
    fn sweep_fill_covers_target() {
        let mut failures: Vec<String> = Vec::new();
        for &(sw, sh) in SOURCES {
            for &(tw, th) in TARGETS {
                let (fw, fh) = cover(sw as f64, sh as f64, tw as f64, th as f64);
                if fw + 1e-9 < tw as f64 || fh + 1e-9 < th as f64 {
                    failures.push(format!("{sw}x{sh} -> {tw}x{th}: cover {fw}x{fh} too small"));
                }
                let pinned = (fw - tw as f64).abs() < 1e-9 || (fh - th as f64).abs() < 1e-9;
                if !pinned {
                    failures.push(format!("{sw}x{sh} -> {tw}x{th}: no axis pinned"));
                }
                let source_ratio = sh as f64 / sw as f64;
                if (fh / fw - source_ratio).abs() > 1e-9 * source_ratio {
                    failures.push(format!("{sw}x{sh} -> {tw}x{th}: cover ratio drift"));
                }
                let (w, h) = resize_size(resolve(sw, sh, &format!("{tw}x{th}^")).unwrap());
                if w < tw || h < th {
                    failures.push(format!("{sw}x{sh} -> {tw}x{th}^: rounded {w}x{h} too small"));
                }
                if (w as f64 - fw).abs() > 0.5 || (h as f64 - fh).abs() > 0.5 {
                    failures.push(format!("{sw}x{sh} -> {tw}x{th}^: rounded {w}x{h} vs exact {fw}x{fh}"));
                }
            }
        }
        assert!(failures.is_empty(), "{} failures:\n{}", failures.len(), failures.join("\n"));
    }

    #[test]
    fn sweep_gravity_crop_stays_inside_resize() {
        let codes = ["c", "n", "s", "e", "w", "ne", "nw", "se", "sw"];
        let mut failures: Vec<String> = Vec::new();
        for &(sw, sh) in SOURCES {
            for &(tw, th) in TARGETS {
                for code in codes {
                    let desc = format!("{tw}x{th}#{code}");
                    match resolve(sw, sh, &desc).unwrap() {
                        TransformPlan::ResizeThenCrop { resize_to, crop } => {
                            if !crop.fits_within(resize_to.width, resize_to.height) {
                                failures.push(format!("{sw}x{sh} {desc}: {crop:?} outside {resize_to:?}"));
                            }
                            if (crop.width, crop.height) != (tw, th) {
                                failures.push(format!("{sw}x{sh} {desc}: crop size {crop:?}"));
                            }
                        }
                        other => failures.push(format!("{sw}x{sh} {desc}: got {other:?}")),
                    }
                }
            }
        }
        assert!(failures.is_empty(), "{} failures:\n{}", failures.len(), failures.join("\n"));
    }
}
