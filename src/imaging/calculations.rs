//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate output dimensions for an exact resize.
///
/// A zero in `target` means "derive from the aspect ratio". Both zero keeps
/// the source size.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Requested dimensions (width, height), 0 = unconstrained
///
/// # Returns
/// * `(width, height)` - Final dimensions, each at least 1
///
/// # Examples
/// ```
/// # use picserve::imaging::resize_dimensions;
/// // Width only: height follows the aspect ratio
/// assert_eq!(resize_dimensions((1024, 819), (100, 0)), (100, 80));
///
/// // Both given: exact, aspect ratio ignored
/// assert_eq!(resize_dimensions((1024, 819), (100, 100)), (100, 100));
/// ```
pub fn resize_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    match target {
        (0, 0) => source,
        (w, 0) => (w, scale(src_h, w, src_w)),
        (0, h) => (scale(src_w, h, src_h), h),
        exact => exact,
    }
}

/// Calculate dimensions that fit inside `bounds` while keeping the aspect
/// ratio. Never upscales.
///
/// A zero bound leaves that axis unconstrained. Fractional results are
/// truncated, with a floor of 1 pixel.
///
/// # Examples
/// ```
/// # use picserve::imaging::thumbnail_dimensions;
/// assert_eq!(thumbnail_dimensions((1024, 819), (100, 100)), (100, 79));
///
/// // Already fits
/// assert_eq!(thumbnail_dimensions((80, 60), (100, 100)), (80, 60));
/// ```
pub fn thumbnail_dimensions(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;
    let max_w = if max_w == 0 { src_w } else { max_w };
    let max_h = if max_h == 0 { src_h } else { max_h };

    if src_w <= max_w && src_h <= max_h {
        return source;
    }
    if src_w == 0 || src_h == 0 {
        return source;
    }

    let ratio = f64::min(max_w as f64 / src_w as f64, max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * ratio) as u32).max(1);
    let h = ((src_h as f64 * ratio) as u32).max(1);
    (w.min(max_w), h.min(max_h))
}

/// True when `source` exceeds `limit` on either axis; 0 disables that axis.
pub fn exceeds(source: (u32, u32), limit: (u32, u32)) -> bool {
    let (w, h) = source;
    let (max_w, max_h) = limit;
    (max_w > 0 && w > max_w) || (max_h > 0 && h > max_h)
}

/// `value * num / den`, rounded, at least 1.
fn scale(value: u32, num: u32, den: u32) -> u32 {
    if den == 0 {
        return num.max(1);
    }
    ((value as f64 * num as f64 / den as f64).round() as u32).max(1)
}
