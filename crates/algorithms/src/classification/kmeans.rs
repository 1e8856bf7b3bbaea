//! K-Means clustering over multi-band rasters
//!
//! Fixed-K iterative clustering. Every iteration is one streaming pass over
//! the dataset: pixels are assigned to their nearest centre (mean squared
//! per-band difference) and each centre moves to the mean of its pixels.

use std::path::Path;

use rsgis_core::raster::Raster;
use rsgis_core::{Error, RasterDataset, RasterDatasetMut, Result};
use tracing::{debug, info};

use super::centre::{euclidean_distance, ClusterCentre};
use super::init::{self, InitMethod};
use super::scan::{self, PixelScanner, LABEL_NODATA};
use super::table;

/// Parameters for K-Means centre refinement
#[derive(Debug, Clone)]
pub struct KMeansParams {
    /// Stop once the mean centre displacement of an iteration falls below this
    pub move_threshold: f64,
    /// Maximum number of iterations (default: 100)
    pub max_iterations: usize,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            move_threshold: 0.0025,
            max_iterations: 100,
        }
    }
}

/// Outcome of a centre refinement run
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringSummary {
    /// Iterations (full passes) performed
    pub iterations: usize,
    /// Whether the movement threshold was reached before the iteration cap
    pub converged: bool,
    /// Mean centre displacement of the last iteration
    pub movement: f64,
    /// Number of centres after the run
    pub num_clusters: usize,
}

/// K-Means classifier bound to one input dataset.
///
/// # Example
/// ```ignore
/// let mut kmeans = KMeansClassifier::new(&image)?;
/// kmeans.init_cluster_centres_random(8, 42)?;
/// kmeans.calc_cluster_centres(&KMeansParams::default())?;
/// let labels = kmeans.generate_output_image()?;
/// ```
pub struct KMeansClassifier<'a, D: RasterDataset> {
    dataset: &'a D,
    centres: Vec<ClusterCentre>,
}

impl<'a, D: RasterDataset> KMeansClassifier<'a, D> {
    pub fn new(dataset: &'a D) -> Result<Self> {
        if dataset.band_count() == 0 {
            return Err(Error::RasterAccess("input image has no bands".into()));
        }
        Ok(Self {
            dataset,
            centres: Vec::new(),
        })
    }

    /// Initialise `num_clusters` centres with the given method
    pub fn init_cluster_centres(&mut self, num_clusters: usize, method: InitMethod, seed: u64) -> Result<()> {
        let positions = init::init_positions(self.dataset, num_clusters, method, seed)?;
        self.set_positions(positions);
        info!(num_clusters, %method, "initialised k-means centres");
        Ok(())
    }

    pub fn init_cluster_centres_random(&mut self, num_clusters: usize, seed: u64) -> Result<()> {
        self.init_cluster_centres(num_clusters, InitMethod::Random, seed)
    }

    pub fn init_cluster_centres_kpp(&mut self, num_clusters: usize, seed: u64) -> Result<()> {
        self.init_cluster_centres(num_clusters, InitMethod::KMeansPlusPlus, seed)
    }

    /// Use explicit centre positions, one value per band each
    pub fn init_cluster_centres_from(&mut self, positions: Vec<Vec<f64>>) -> Result<()> {
        init::check_positions(&positions, self.dataset.band_count())?;
        self.set_positions(positions);
        Ok(())
    }

    fn set_positions(&mut self, positions: Vec<Vec<f64>>) {
        self.centres = positions
            .into_iter()
            .enumerate()
            .map(|(id, position)| ClusterCentre { id: id as u32, position })
            .collect();
    }

    pub fn is_initialised(&self) -> bool {
        !self.centres.is_empty()
    }

    pub fn centres(&self) -> &[ClusterCentre] {
        &self.centres
    }

    fn positions(&self) -> Vec<Vec<f64>> {
        self.centres.iter().map(|c| c.position.clone()).collect()
    }

    fn ensure_initialised(&self) -> Result<()> {
        if self.is_initialised() {
            Ok(())
        } else {
            Err(Error::Classification("k-means cluster centres have not been initialised".into()))
        }
    }

    /// Iterate assignment / update passes until convergence or the iteration cap.
    ///
    /// A centre that receives no pixels keeps its previous position.
    pub fn calc_cluster_centres(&mut self, params: &KMeansParams) -> Result<ClusteringSummary> {
        self.ensure_initialised()?;
        let mut scanner = PixelScanner::new(self.dataset);
        let mut summary = ClusteringSummary {
            iterations: 0,
            converged: false,
            movement: 0.0,
            num_clusters: self.centres.len(),
        };

        for iteration in 1..=params.max_iterations {
            let positions = self.positions();
            let acc = scan::accumulate_pass(&mut scanner, &positions)?;

            let mut movement = 0.0;
            for (centre, acc) in self.centres.iter_mut().zip(&acc) {
                if let Some(mean) = acc.mean() {
                    movement += euclidean_distance(&centre.position, &mean);
                    centre.position = mean;
                }
            }
            movement /= self.centres.len() as f64;

            summary.iterations = iteration;
            summary.movement = movement;
            debug!(iteration, movement, "k-means iteration");

            if movement < params.move_threshold {
                summary.converged = true;
                break;
            }
        }

        info!(
            iterations = summary.iterations,
            converged = summary.converged,
            movement = summary.movement,
            "k-means finished"
        );
        Ok(summary)
    }

    /// Write the centres as a CSV table (`Cluster,b1,...,bN`)
    pub fn write_centres<W: std::io::Write>(&self, writer: W) -> Result<()> {
        self.ensure_initialised()?;
        table::write_centre_table(
            writer,
            self.dataset.band_count(),
            self.centres.iter().map(|c| (c.id, c.position.as_slice())),
        )
    }

    pub fn save_centres<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        self.write_centres(file)
    }

    /// Label every pixel of `output` (band 0) with its nearest centre index
    pub fn classify_into<O: RasterDatasetMut<Cell = u32>>(&self, output: &mut O) -> Result<()> {
        self.ensure_initialised()?;
        scan::label_into(self.dataset, &self.positions(), output)
    }

    /// Labelled raster shaped and georeferenced like the input
    pub fn generate_output_image(&self) -> Result<Raster<u32>> {
        let mut output = Raster::from_template(self.dataset);
        output.set_nodata(Some(LABEL_NODATA));
        self.classify_into(&mut output)?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rsgis_core::{GeoTransform, MultiBandRaster};

    fn two_groups() -> Raster<f32> {
        let mut r = Raster::new(10, 10);
        r.set_transform(GeoTransform::new(0.0, 10.0, 1.0, -1.0));
        for row in 0..10 {
            for col in 0..10 {
                let val = if row < 5 { 10.0 } else { 100.0 };
                r.set(row, col, val).unwrap();
            }
        }
        r
    }

    #[test]
    fn test_kmeans_basic() {
        let r = two_groups();
        let mut kmeans = KMeansClassifier::new(&r).unwrap();
        kmeans.init_cluster_centres_from(vec![vec![0.0], vec![50.0]]).unwrap();
        let summary = kmeans.calc_cluster_centres(&KMeansParams::default()).unwrap();

        assert!(summary.converged);
        assert_relative_eq!(kmeans.centres()[0].position[0], 10.0);
        assert_relative_eq!(kmeans.centres()[1].position[0], 100.0);

        let labels = kmeans.generate_output_image().unwrap();
        assert_eq!(labels.get(0, 0).unwrap(), 0);
        assert_eq!(labels.get(9, 0).unwrap(), 1);
        assert_eq!(labels.transform(), r.transform());
    }

    #[test]
    fn test_empty_cluster_keeps_position() {
        let r = two_groups();
        let mut kmeans = KMeansClassifier::new(&r).unwrap();
        kmeans
            .init_cluster_centres_from(vec![vec![10.0], vec![100.0], vec![1000.0]])
            .unwrap();
        kmeans
            .calc_cluster_centres(&KMeansParams { move_threshold: 0.0, max_iterations: 3 })
            .unwrap();

        assert_eq!(kmeans.centres()[2].position, vec![1000.0]);
        assert!(kmeans.centres().iter().all(|c| c.position[0].is_finite()));
    }

    #[test]
    fn test_centre_count_is_fixed_and_iterations_capped() {
        let data: Vec<f32> = (0..300).map(|i| (i * 37 % 101) as f32).collect();
        let image = MultiBandRaster::from_vec(data, 3, 10, 10).unwrap();
        let mut kmeans = KMeansClassifier::new(&image).unwrap();
        kmeans.init_cluster_centres_random(5, 11).unwrap();

        let summary = kmeans
            .calc_cluster_centres(&KMeansParams { move_threshold: -1.0, max_iterations: 4 })
            .unwrap();
        assert_eq!(summary.iterations, 4);
        assert!(!summary.converged);
        assert!(summary.movement >= 0.0);
        assert_eq!(kmeans.centres().len(), 5);
        assert!(kmeans.centres().iter().all(|c| c.position.len() == 3));
    }

    #[test]
    fn test_uninitialised_errors() {
        let r = two_groups();
        let mut kmeans = KMeansClassifier::new(&r).unwrap();
        assert!(matches!(
            kmeans.calc_cluster_centres(&KMeansParams::default()),
            Err(Error::Classification(_))
        ));
        assert!(matches!(kmeans.generate_output_image(), Err(Error::Classification(_))));
    }

    #[test]
    fn test_centre_band_mismatch() {
        let r = two_groups();
        let mut kmeans = KMeansClassifier::new(&r).unwrap();
        let err = kmeans.init_cluster_centres_from(vec![vec![1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, Error::Classification(_)));
    }

    #[test]
    fn test_centre_table() {
        let image = MultiBandRaster::from_vec(vec![1.0f32, 3.0, 10.0, 30.0], 2, 1, 2).unwrap();
        let mut kmeans = KMeansClassifier::new(&image).unwrap();
        kmeans
            .init_cluster_centres_from(vec![vec![2.0, 20.0], vec![0.5, 7.25]])
            .unwrap();

        let mut out = Vec::new();
        kmeans.write_centres(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "Cluster,b1,b2\n0,2,20\n1,0.5,7.25\n");
    }

    #[test]
    fn test_nodata_of_a_later_band_is_masked() {
        let a = Raster::filled(2, 2, 10.0f32);
        let mut b = Raster::from_vec(vec![20.0f32, 20.0, 20.0, -9999.0], 2, 2).unwrap();
        b.set_nodata(Some(-9999.0));
        let image = MultiBandRaster::stack(&[a, b]).unwrap();

        let mut kmeans = KMeansClassifier::new(&image).unwrap();
        kmeans.init_cluster_centres_from(vec![vec![0.0, 0.0]]).unwrap();
        kmeans.calc_cluster_centres(&KMeansParams::default()).unwrap();

        assert_relative_eq!(kmeans.centres()[0].position[0], 10.0);
        assert_relative_eq!(kmeans.centres()[0].position[1], 20.0);

        let labels = kmeans.generate_output_image().unwrap();
        assert_eq!(labels.get(0, 0).unwrap(), 0);
        assert_eq!(labels.get(1, 1).unwrap(), LABEL_NODATA);
    }
}
