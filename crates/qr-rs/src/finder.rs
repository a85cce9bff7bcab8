//! Finder pattern localization.
//!
//! Scans every row for dark/light run quintets near the 1:1:3:1:1 finder
//! ratio, refines candidate centers against the central dark square,
//! confirms vertically, and clusters nearby hits.

use log::trace;

use crate::binarize::Bitmap;
use crate::geometry::{distance, Point};

/// A clustered finder-pattern candidate.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FinderPattern {
    pub center: Point,
    /// Estimated module size in pixels.
    pub module: f32,
    /// Number of scanline hits merged into this cluster.
    pub count: usize,
}

// Candidates closer than this many modules are the same pattern.
const CLUSTER_RADIUS_MODULES: f32 = 3.0;

pub(crate) fn find_patterns(bitmap: &Bitmap) -> Vec<FinderPattern> {
    let mut clusters: Vec<FinderPattern> = Vec::new();
    for y in 0..bitmap.height {
        let runs = row_runs(bitmap, y as i32);
        for window in runs.windows(5) {
            if !window[0].dark {
                continue;
            }
            let Some(module) = ratio_match(window) else {
                continue;
            };
            let Some((center, module)) = refine(bitmap, window[2], y as i32, module) else {
                continue;
            };
            merge(&mut clusters, center, module);
        }
    }
    clusters.sort_by(|a, b| b.count.cmp(&a.count));
    trace!("{} finder cluster(s)", clusters.len());
    clusters
}

#[derive(Debug, Clone, Copy)]
struct Run {
    dark: bool,
    start: i32,
    len: i32,
}

fn row_runs(bitmap: &Bitmap, y: i32) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for x in 0..bitmap.width as i32 {
        let dark = bitmap.dark(x, y);
        match runs.last_mut() {
            Some(run) if run.dark == dark => run.len += 1,
            _ => runs.push(Run { dark, start: x, len: 1 }),
        }
    }
    runs
}

// Checks a dark-led run quintet against 1:1:3:1:1 within half a module
// per run, returning the unit module estimate.
fn ratio_match(window: &[Run]) -> Option<f32> {
    let total: i32 = window.iter().map(|r| r.len).sum();
    let module = total as f32 / 7.0;
    if module < 1.0 {
        return None;
    }
    let tolerance = module / 2.0;
    for (run, nominal) in window.iter().zip([1.0f32, 1.0, 3.0, 1.0, 1.0]) {
        if (run.len as f32 - nominal * module).abs() >= nominal.max(1.5) * tolerance {
            return None;
        }
    }
    Some(module)
}

// Measures the central dark square around the matched middle run: its
// horizontal extent is the run itself; the vertical extent is flooded at
// the refined center column. Confirms the vertical profile and returns
// the center and per-axis module size.
fn refine(bitmap: &Bitmap, middle: Run, y: i32, module: f32) -> Option<(Point, f32)> {
    let left = middle.start;
    let right = middle.start + middle.len - 1;
    let cx = (left + right) as f32 / 2.0;
    let cxi = cx.round() as i32;

    let mut top = y;
    while top > 0 && bitmap.dark(cxi, top - 1) {
        top -= 1;
    }
    let mut bottom = y;
    while bottom + 1 < bitmap.height as i32 && bitmap.dark(cxi, bottom + 1) {
        bottom += 1;
    }
    let height = (bottom - top + 1) as f32;
    let width = middle.len as f32;

    // The central square is three modules on a side; wildly unequal axes
    // mean we hit a line, not a finder.
    if height < 2.0 * module || height > 4.5 * module {
        return None;
    }
    if !vertical_profile_holds(bitmap, cxi, top, bottom, module) {
        return None;
    }

    let cy = (top + bottom) as f32 / 2.0;
    Some((Point::new(cx, cy), (width + height) / 6.0))
}

// Above and below the central square there must be roughly one module of
// light and one of dark (the inner ring and the border).
fn vertical_profile_holds(bitmap: &Bitmap, x: i32, top: i32, bottom: i32, module: f32) -> bool {
    let limit = (module * 2.5).ceil() as i32;
    let run_ok = |len: i32| (len as f32) >= module * 0.4 && (len as f32) <= module * 2.0;

    for (edge, step) in [(top, -1i32), (bottom, 1i32)] {
        let mut pos = edge + step;
        let mut light = 0;
        while !bitmap.dark(x, pos) && light <= limit {
            light += 1;
            pos += step;
        }
        let mut dark = 0;
        while bitmap.dark(x, pos) && dark <= limit {
            dark += 1;
            pos += step;
        }
        if !run_ok(light) || !run_ok(dark) {
            return false;
        }
    }
    true
}

// Weighted-average the candidate into a nearby cluster, or start one.
fn merge(clusters: &mut Vec<FinderPattern>, center: Point, module: f32) {
    for cluster in clusters.iter_mut() {
        if distance(cluster.center, center) <= CLUSTER_RADIUS_MODULES * cluster.module {
            let n = cluster.count as f32;
            cluster.center = cluster
                .center
                .scale(n)
                .add(center)
                .scale(1.0 / (n + 1.0));
            cluster.module = (cluster.module * n + module) / (n + 1.0);
            cluster.count += 1;
            return;
        }
    }
    clusters.push(FinderPattern {
        center,
        module,
        count: 1,
    });
}
