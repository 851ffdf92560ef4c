//! Static k-d tree over tile mean colors
//!
//! The tree is stored implicitly: `order` is a permutation of point indices
//! arranged so that, for every range, the middle entry is the median along
//! that depth's axis, with smaller coordinates to its left and larger ones to
//! its right. Ranges at or below the leaf size are scanned linearly.

use crate::dataset::tile::COLOR_COMPONENTS;
use crate::io::configuration::KD_LEAF_SIZE;
use crate::io::error::{MosaicError, Result, corrupt_data, invalid_parameter};
use ndarray::ArrayView2;

/// A point in color space
pub type ColorPoint = [f64; COLOR_COMPONENTS];

/// Result of a nearest-neighbor query
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    /// Position of the matched tile in the corpus
    pub index: usize,
    /// Euclidean distance from the query point to the tile's mean color
    pub distance: f64,
}

/// Immutable nearest-neighbor index over tile mean colors
#[derive(Clone, Debug)]
pub struct ColorIndex {
    points: Vec<ColorPoint>,
    order: Vec<usize>,
}

// Best candidate seen so far; squared distance then index decides
struct Best {
    index: usize,
    distance_sq: f64,
}

impl Best {
    // Exact float equality is intended: ties are resolved by index
    #[allow(clippy::float_cmp)]
    fn offer(&mut self, index: usize, distance_sq: f64) {
        let closer = distance_sq < self.distance_sq;
        let tie_with_lower_index = distance_sq == self.distance_sq && index < self.index;
        if closer || tie_with_lower_index {
            self.index = index;
            self.distance_sq = distance_sq;
        }
    }
}

impl ColorIndex {
    /// Build an index over an (N, 3) array of quantized mean colors
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `means` has no rows
    /// - `means` rows do not have exactly three components
    pub fn build(means: ArrayView2<'_, u8>) -> Result<Self> {
        let (count, width) = means.dim();
        if width != COLOR_COMPONENTS {
            return Err(corrupt_data(&format!(
                "means rows have {width} components, expected {COLOR_COMPONENTS}"
            )));
        }
        if count == 0 {
            return Err(MosaicError::EmptyCorpus);
        }

        let points = means
            .rows()
            .into_iter()
            .map(|row| {
                let mut point = [0.0; COLOR_COMPONENTS];
                for (slot, &value) in point.iter_mut().zip(row.iter()) {
                    *slot = f64::from(value);
                }
                point
            })
            .collect();
        Self::from_points(points)
    }

    /// Build an index over arbitrary color points
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `points` is empty
    /// - Any coordinate is not finite
    pub fn from_points(points: Vec<ColorPoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(MosaicError::EmptyCorpus);
        }
        if let Some(position) = points.iter().position(|p| p.iter().any(|c| !c.is_finite())) {
            return Err(invalid_parameter(
                "points",
                &format!("{position}"),
                &"color coordinates must be finite",
            ));
        }

        let mut order: Vec<usize> = (0..points.len()).collect();
        partition(&points, &mut order, 0);
        Ok(Self { points, order })
    }

    /// Number of indexed points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the index holds no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Indexed point at `index`, in original order
    pub fn point(&self, index: usize) -> Option<ColorPoint> {
        self.points.get(index).copied()
    }

    /// Find the indexed point closest to `point`
    ///
    /// Among points at exactly the same distance the lowest original index wins.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The index is empty
    /// - Any coordinate of `point` is not finite
    pub fn query(&self, point: ColorPoint) -> Result<Neighbor> {
        if self.is_empty() {
            return Err(MosaicError::EmptyCorpus);
        }
        if point.iter().any(|c| !c.is_finite()) {
            return Err(invalid_parameter(
                "point",
                &format!("{point:?}"),
                &"query coordinates must be finite",
            ));
        }

        let mut best = Best {
            index: usize::MAX,
            distance_sq: f64::INFINITY,
        };
        self.search(&self.order, 0, &point, &mut best);

        Ok(Neighbor {
            index: best.index,
            distance: best.distance_sq.sqrt(),
        })
    }

    /// Find the indexed point closest to an 8-bit RGB color
    ///
    /// # Errors
    ///
    /// Returns an error if the index is empty
    pub fn query_color(&self, rgb: [u8; COLOR_COMPONENTS]) -> Result<Neighbor> {
        self.query(rgb.map(f64::from))
    }

    fn search(&self, range: &[usize], depth: usize, target: &ColorPoint, best: &mut Best) {
        if range.len() <= KD_LEAF_SIZE {
            for &index in range {
                if let Some(point) = self.points.get(index) {
                    best.offer(index, distance_sq(point, target));
                }
            }
            return;
        }

        let mid = range.len() / 2;
        let (left, rest) = range.split_at(mid);
        let Some((&median, right)) = rest.split_first() else {
            return;
        };
        let Some(median_point) = self.points.get(median) else {
            return;
        };
        best.offer(median, distance_sq(median_point, target));

        let axis = depth % COLOR_COMPONENTS;
        let diff = target.get(axis).copied().unwrap_or(0.0)
            - median_point.get(axis).copied().unwrap_or(0.0);
        let (near, far) = if diff < 0.0 {
            (left, right)
        } else {
            (right, left)
        };

        self.search(near, depth + 1, target, best);
        // Equal-distance points across the plane must still be seen for the tie rule
        if diff * diff <= best.distance_sq {
            self.search(far, depth + 1, target, best);
        }
    }
}

// Arrange `order` so each range's middle entry is its median on the depth axis
fn partition(points: &[ColorPoint], order: &mut [usize], depth: usize) {
    if order.len() <= KD_LEAF_SIZE {
        return;
    }

    let axis = depth % COLOR_COMPONENTS;
    let coordinate = |index: usize| {
        points
            .get(index)
            .and_then(|p| p.get(axis))
            .copied()
            .unwrap_or(0.0)
    };

    let mid = order.len() / 2;
    order.select_nth_unstable_by(mid, |&a, &b| {
        coordinate(a)
            .total_cmp(&coordinate(b))
            .then_with(|| a.cmp(&b))
    });

    let (left, rest) = order.split_at_mut(mid);
    partition(points, left, depth + 1);
    if let Some((_, right)) = rest.split_first_mut() {
        partition(points, right, depth + 1);
    }
}

fn distance_sq(a: &ColorPoint, b: &ColorPoint) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}
