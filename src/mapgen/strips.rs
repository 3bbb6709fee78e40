// src/mapgen/strips.rs
//! Free-space strips: a sector's free area stored as horizontal bands, each
//! holding the free x-intervals at that height.
//!
//! All operations return new collections; strips are never edited in place.
//! Strip sets are kept sorted by `bottom` and their bands never overlap.

use bevy::prelude::*; // IVec2
use rand::{Rng, RngCore};

use super::core::BoundingBox;

/// Half-open interval `[start, end)` on the x axis.
pub type XRange = (i32, i32);

/// One horizontal band `[bottom, top)` and the free x-intervals inside it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FreeStrip {
    pub bottom: i32,
    pub top: i32,
    /// Sorted by start, non-overlapping.
    pub x_ranges: Vec<XRange>,
}

impl FreeStrip {
    pub fn new(bottom: i32, top: i32, x_ranges: Vec<XRange>) -> Self {
        Self { bottom, top, x_ranges }
    }

    /// A strip covering the whole of `tile`.
    pub fn from_box(tile: &BoundingBox) -> Self {
        Self::new(tile.bottom, tile.top(), vec![(tile.left, tile.right())])
    }

    #[inline]
    pub fn height(&self) -> i32 { self.top - self.bottom }

    pub fn free_width(&self) -> i64 {
        self.x_ranges.iter().map(|&(s, e)| (e - s) as i64).sum()
    }

    pub fn area(&self) -> i64 {
        self.height() as i64 * self.free_width()
    }

    /// Zero-height strips and strips with no free interval carry no space.
    pub fn is_empty(&self) -> bool {
        self.height() <= 0 || self.x_ranges.iter().all(|&(s, e)| e <= s)
    }
}

/// Total free area of a strip set.
pub fn strip_set_area(strips: &[FreeStrip]) -> i64 {
    strips.iter().map(FreeStrip::area).sum()
}

/// Removes `cut` from every interval in `ranges`; each interval yields zero, one or two pieces.
pub fn subtract_x_range(ranges: &[XRange], cut: XRange) -> Vec<XRange> {
    let mut out = Vec::with_capacity(ranges.len() + 1);
    for &(start, end) in ranges {
        if end <= cut.0 || start >= cut.1 {
            out.push((start, end));
            continue;
        }
        if start < cut.0 {
            out.push((start, cut.0));
        }
        if end > cut.1 {
            out.push((cut.1, end));
        }
    }
    out
}

/// True if any interval of `a` overlaps any interval of `b`.
pub fn x_ranges_overlap(a: &[XRange], b: &[XRange]) -> bool {
    a.iter().any(|&(s1, e1)| b.iter().any(|&(s2, e2)| s1 < e2 && e1 > s2))
}

/// Subtracts `removed` from the strip set.
///
/// Strips crossing the box's bottom or top edge are split into an untouched
/// sliver and a middle part with the box's x-interval cut out. Degenerate
/// boxes leave the set unchanged.
pub fn subtract(strips: &[FreeStrip], removed: &BoundingBox) -> Vec<FreeStrip> {
    if removed.is_degenerate() {
        return strips.to_vec();
    }

    let mut out = Vec::with_capacity(strips.len() + 2);
    for strip in strips {
        let overlaps = strip.bottom < removed.top() && strip.top > removed.bottom;
        if !overlaps {
            out.push(strip.clone());
            continue;
        }

        let mut middle_bottom = strip.bottom;
        let mut middle_top = strip.top;

        if removed.bottom > strip.bottom {
            out.push(FreeStrip::new(strip.bottom, removed.bottom, strip.x_ranges.clone()));
            middle_bottom = removed.bottom;
        }
        if removed.top() < strip.top {
            out.push(FreeStrip::new(removed.top(), strip.top, strip.x_ranges.clone()));
            middle_top = removed.top();
        }

        out.push(FreeStrip::new(
            middle_bottom,
            middle_top,
            subtract_x_range(&strip.x_ranges, (removed.left, removed.right())),
        ));
    }

    out.retain(|s| !s.is_empty());
    out.sort_by_key(|s| s.bottom);
    out
}

/// First interval of `strip` that, clipped to `[start, end)`, is still at least `min_width` wide.
fn clipped_run(strip: &FreeStrip, start: i32, end: i32, min_width: i32) -> Option<XRange> {
    strip
        .x_ranges
        .iter()
        .map(|&(s, e)| (s.max(start), e.min(end)))
        .find(|&(s, e)| e - s >= min_width)
}

/// Grows the band `[from_bottom, from_top) x [x_start, x_end)` through directly
/// adjacent strips, first downwards then upwards, narrowing the x-interval to
/// what each new strip has free. Stops in a direction as soon as the next
/// strip cannot keep at least `min_width` of it.
///
/// Greedy: the first qualifying interval of each neighbour is taken, so some
/// rectangles that would fit are never found.
pub fn merge_vertically(
    strips: &[FreeStrip],
    x_start: i32,
    x_end: i32,
    from_bottom: i32,
    from_top: i32,
    min_width: i32,
) -> FreeStrip {
    let (mut start, mut end) = (x_start, x_end);
    let (mut bottom, mut top) = (from_bottom, from_top);

    while let Some(below) = strips.iter().find(|s| s.top == bottom && s.height() > 0) {
        let Some((s, e)) = clipped_run(below, start, end, min_width) else { break };
        bottom = below.bottom;
        (start, end) = (s, e);
    }

    while let Some(above) = strips.iter().find(|s| s.bottom == top && s.height() > 0) {
        let Some((s, e)) = clipped_run(above, start, end, min_width) else { break };
        top = above.top;
        (start, end) = (s, e);
    }

    FreeStrip::new(bottom, top, vec![(start, end)])
}

/// Finds a random bottom-left position for a `width x height` box inside the
/// free space of `strips`, scanning from the top strip down.
pub fn find_fit(
    strips: &[FreeStrip],
    width: i32,
    height: i32,
    rng: &mut dyn RngCore,
) -> Option<IVec2> {
    if width <= 0 || height <= 0 {
        return None;
    }

    for strip in strips.iter().rev() {
        for &(start, end) in &strip.x_ranges {
            if end - start < width {
                continue;
            }

            let (run, bottom, top) = if strip.height() >= height {
                ((start, end), strip.bottom, strip.top)
            } else {
                let merged = merge_vertically(strips, start, end, strip.bottom, strip.top, width);
                (merged.x_ranges[0], merged.bottom, merged.top)
            };

            if top - bottom >= height && run.1 - run.0 >= width {
                let x = rng.random_range(run.0..=run.1 - width);
                let y = rng.random_range(bottom..=top - height);
                return Some(IVec2::new(x, y));
            }
        }
    }

    None
}

/// True if every cell of `area` is free in `strips`.
pub fn covers(strips: &[FreeStrip], area: &BoundingBox) -> bool {
    if area.is_degenerate() {
        return true;
    }
    let mut covered: i64 = 0;
    for strip in strips {
        let lo = strip.bottom.max(area.bottom);
        let hi = strip.top.min(area.top());
        if hi <= lo {
            continue;
        }
        let width: i64 = strip
            .x_ranges
            .iter()
            .map(|&(s, e)| (e.min(area.right()) - s.max(area.left)).max(0) as i64)
            .sum();
        covered += (hi - lo) as i64 * width;
    }
    covered == area.area()
}
