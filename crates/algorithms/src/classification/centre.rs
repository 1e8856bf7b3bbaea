//! Cluster centres, per-pass accumulators and the distance metric

/// Mean squared per-band difference between a pixel and a centre.
///
/// No square root is taken; nearest-centre ordering is unaffected.
#[inline]
pub fn mean_sq_distance(a: &[f64], b: &[f64]) -> f64 {
    let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    sum / a.len() as f64
}

/// Euclidean distance between two centre positions
#[inline]
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Index of and distance to the nearest position.
///
/// Ties keep the earliest position. `positions` must not be empty.
#[inline]
pub fn nearest_centre(pixel: &[f64], positions: &[Vec<f64>]) -> (usize, f64) {
    let mut best = 0;
    let mut best_dist = mean_sq_distance(pixel, &positions[0]);
    for (i, position) in positions.iter().enumerate().skip(1) {
        let dist = mean_sq_distance(pixel, position);
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    (best, best_dist)
}

/// A K-Means cluster centre
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterCentre {
    pub id: u32,
    /// One value per band
    pub position: Vec<f64>,
}

/// An ISODATA cluster centre with the statistics of its last pass
#[derive(Debug, Clone, PartialEq)]
pub struct IsoClusterCentre {
    pub id: u32,
    pub position: Vec<f64>,
    /// Per-band standard deviation of the assigned pixels
    pub std_dev: Vec<f64>,
    pub point_count: usize,
    /// Mean distance of the assigned pixels to the centre
    pub avg_distance: f64,
    /// Marked for splitting this iteration
    pub split: bool,
}

impl IsoClusterCentre {
    pub fn new(id: u32, position: Vec<f64>) -> Self {
        let bands = position.len();
        Self {
            id,
            position,
            std_dev: vec![0.0; bands],
            point_count: 0,
            avg_distance: 0.0,
            split: false,
        }
    }
}

/// Running sums for one centre over one raster pass
#[derive(Debug, Clone)]
pub struct CentreAccumulator {
    /// Per-band sum of pixel values
    pub sum: Vec<f64>,
    /// Per-band sum of squared deviations from the centre
    pub sum_sq_dev: Vec<f64>,
    pub count: usize,
    pub distance_sum: f64,
}

impl CentreAccumulator {
    pub fn new(bands: usize) -> Self {
        Self {
            sum: vec![0.0; bands],
            sum_sq_dev: vec![0.0; bands],
            count: 0,
            distance_sum: 0.0,
        }
    }

    /// Add a pixel assigned to this centre at `distance`
    pub fn add(&mut self, pixel: &[f64], distance: f64) {
        for (s, &v) in self.sum.iter_mut().zip(pixel) {
            *s += v;
        }
        self.count += 1;
        self.distance_sum += distance;
    }

    /// Add the squared per-band deviation of a pixel from `centre`
    pub fn add_deviation(&mut self, pixel: &[f64], centre: &[f64]) {
        for ((s, &v), &c) in self.sum_sq_dev.iter_mut().zip(pixel).zip(centre) {
            *s += (v - c) * (v - c);
        }
        self.count += 1;
    }

    /// Mean position, `None` when no pixel was assigned
    pub fn mean(&self) -> Option<Vec<f64>> {
        (self.count > 0).then(|| self.sum.iter().map(|s| s / self.count as f64).collect())
    }

    /// Mean assignment distance, 0 when no pixel was assigned
    pub fn mean_distance(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.distance_sum / self.count as f64
        }
    }

    /// Per-band standard deviation from the accumulated deviations
    pub fn std_dev(&self) -> Vec<f64> {
        if self.count == 0 {
            return vec![0.0; self.sum_sq_dev.len()];
        }
        self.sum_sq_dev
            .iter()
            .map(|s| (s / self.count as f64).sqrt())
            .collect()
    }
}
