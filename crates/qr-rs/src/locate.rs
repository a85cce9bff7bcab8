//! Orders the three finder patterns and builds the module sampling frame.

use crate::binarize::Bitmap;
use crate::finder::FinderPattern;
use crate::geometry::{cross, distance, Point};

/// The three finder centers in reading order, plus the averaged module
/// size in pixels.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Corners {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub module: f32,
}

/// Picks top-left as the vertex whose edges to the other two are most
/// nearly perpendicular and equal in length, splits the rest by x
/// projection, and fixes the handedness by cross product.
pub(crate) fn order_patterns(patterns: &[FinderPattern; 3]) -> Option<Corners> {
    let mut best: Option<(f32, usize)> = None;
    for i in 0..3 {
        let a = patterns[(i + 1) % 3].center.sub(patterns[i].center);
        let b = patterns[(i + 2) % 3].center.sub(patterns[i].center);
        let (la, lb) = (a.length(), b.length());
        if la == 0.0 || lb == 0.0 {
            return None;
        }
        // 0 for a perfect right angle with equal arms.
        let badness = (a.dot(b) / (la * lb)).abs() + (la - lb).abs() / la.max(lb);
        if best.map_or(true, |(score, _)| badness < score) {
            best = Some((badness, i));
        }
    }
    let (_, tl) = best?;
    let top_left = patterns[tl].center;
    let (mut p, mut q) = (patterns[(tl + 1) % 3], patterns[(tl + 2) % 3]);
    if q.center.sub(top_left).x > p.center.sub(top_left).x {
        std::mem::swap(&mut p, &mut q);
    }
    let (mut top_right, mut bottom_left) = (p.center, q.center);
    if cross(top_right.sub(top_left), bottom_left.sub(top_left)) < 0.0 {
        std::mem::swap(&mut top_right, &mut bottom_left);
    }
    let module = patterns.iter().map(|p| p.module).sum::<f32>() / 3.0;
    Some(Corners {
        top_left,
        top_right,
        bottom_left,
        module,
    })
}

/// Estimated modules per side from the finder spacing: the center-to-
/// center distance plus the seven modules the two finders themselves
/// span.
pub(crate) fn estimate_size(corners: &Corners) -> f32 {
    distance(corners.top_left, corners.top_right) / corners.module + 7.0
}

/// An affine module-to-pixel frame anchored on the finder centers.
pub(crate) struct Grid {
    origin: Point,
    dr: Point,
    dd: Point,
    pub size: usize,
}

impl Grid {
    /// Builds the frame for a symbol of `size` modules. The top-left
    /// finder center sits at module (3.5, 3.5), so the module origin is
    /// 3.5 basis steps back from it on both axes.
    pub fn new(corners: &Corners, size: usize) -> Self {
        let span = (size - 7) as f32;
        let dr = corners.top_right.sub(corners.top_left).scale(1.0 / span);
        let dd = corners.bottom_left.sub(corners.top_left).scale(1.0 / span);
        let origin = corners
            .top_left
            .sub(dr.scale(3.5))
            .sub(dd.scale(3.5));
        Self {
            origin,
            dr,
            dd,
            size,
        }
    }

    /// Samples the module at `(row, col)` at its center pixel.
    pub fn sample(&self, bitmap: &Bitmap, row: usize, col: usize) -> bool {
        let p = self
            .origin
            .add(self.dr.scale(col as f32 + 0.5))
            .add(self.dd.scale(row as f32 + 0.5));
        bitmap.dark(p.x.round() as i32, p.y.round() as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finder::FinderPattern;

    fn pattern(x: f32, y: f32) -> FinderPattern {
        FinderPattern {
            center: Point::new(x, y),
            module: 4.0,
            count: 10,
        }
    }

    #[test]
    fn orders_an_axis_aligned_triple() {
        let input = [pattern(86.0, 30.0), pattern(30.0, 86.0), pattern(30.0, 30.0)];
        let corners = order_patterns(&input).unwrap();
        assert_eq!(corners.top_left, Point::new(30.0, 30.0));
        assert_eq!(corners.top_right, Point::new(86.0, 30.0));
        assert_eq!(corners.bottom_left, Point::new(30.0, 86.0));
    }

    #[test]
    fn handedness_swap_restores_reading_order() {
        // Feed a mirrored-looking labeling: the x-projection split picks
        // the wrong arm, the cross product fixes it.
        let input = [pattern(30.0, 30.0), pattern(20.0, 90.0), pattern(90.0, 20.0)];
        let corners = order_patterns(&input).unwrap();
        assert!(cross(
            corners.top_right.sub(corners.top_left),
            corners.bottom_left.sub(corners.top_left)
        ) > 0.0);
    }

    #[test]
    fn size_estimate_for_version_one_spacing() {
        let input = [pattern(30.0, 30.0), pattern(86.0, 30.0), pattern(30.0, 86.0)];
        let corners = order_patterns(&input).unwrap();
        let est = estimate_size(&corners);
        assert!((est - 21.0).abs() < 0.5, "estimated {est}");
    }

    #[test]
    fn grid_samples_module_centers() {
        let input = [pattern(30.0, 30.0), pattern(86.0, 30.0), pattern(30.0, 86.0)];
        let corners = order_patterns(&input).unwrap();
        let grid = Grid::new(&corners, 21);
        // Module (0, 0) center lands 3.5 modules up-left of the finder
        // center plus half a module: 4 px/module puts it at 16 + 2.
        let p = grid
            .origin
            .add(grid.dr.scale(0.5))
            .add(grid.dd.scale(0.5));
        assert!((p.x - 18.0).abs() < 0.01);
        assert!((p.y - 18.0).abs() < 0.01);
    }
}
