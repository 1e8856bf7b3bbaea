//! ISODATA clustering algorithm
//!
//! Iterative Self-Organizing Data Analysis Technique. Extends K-means
//! with discard, merge and split of clusters based on point counts,
//! inter-centre distances and per-band spread.
//!
//! Every iteration builds the next centre list from scratch in stages
//! (discard, merge, split) instead of editing the live list.

use std::path::Path;

use rsgis_core::raster::Raster;
use rsgis_core::{Error, RasterDataset, RasterDatasetMut, Result};
use tracing::{debug, info};

use super::centre::{euclidean_distance, nearest_centre, CentreAccumulator, IsoClusterCentre};
use super::init::{self, InitMethod};
use super::kmeans::ClusteringSummary;
use super::scan::{self, PixelScanner, LABEL_NODATA};
use super::table;

/// Parameters for ISODATA
#[derive(Debug, Clone)]
pub struct IsodataParams {
    /// Stop once the mean centre displacement of an iteration falls below this
    pub move_threshold: f64,
    /// Maximum iterations
    pub max_iterations: usize,
    /// Centres with fewer assigned pixels are discarded
    pub min_points_per_cluster: usize,
    /// Centre pairs closer than this (Euclidean) are merged
    pub min_inter_centre_distance: f64,
    /// A centre with any band std-dev above this is split
    pub max_std_dev: f64,
    /// A centre whose average distance exceeds this multiple of the mean
    /// average distance is split
    pub proportion_of_avg_distance: f64,
}

impl Default for IsodataParams {
    fn default() -> Self {
        Self {
            move_threshold: 0.0025,
            max_iterations: 100,
            min_points_per_cluster: 10,
            min_inter_centre_distance: 5.0,
            max_std_dev: 10.0,
            proportion_of_avg_distance: 2.0,
        }
    }
}

/// ISODATA classifier bound to one input dataset
pub struct IsodataClassifier<'a, D: RasterDataset> {
    dataset: &'a D,
    centres: Vec<IsoClusterCentre>,
    /// Next id to hand out; never decreases during a run
    next_id: u32,
}

impl<'a, D: RasterDataset> IsodataClassifier<'a, D> {
    pub fn new(dataset: &'a D) -> Result<Self> {
        if dataset.band_count() == 0 {
            return Err(Error::RasterAccess("input image has no bands".into()));
        }
        Ok(Self {
            dataset,
            centres: Vec::new(),
            next_id: 0,
        })
    }

    pub fn init_cluster_centres(&mut self, num_clusters: usize, method: InitMethod, seed: u64) -> Result<()> {
        let positions = init::init_positions(self.dataset, num_clusters, method, seed)?;
        self.set_positions(positions);
        info!(num_clusters, %method, "initialised isodata centres");
        Ok(())
    }

    pub fn init_cluster_centres_random(&mut self, num_clusters: usize, seed: u64) -> Result<()> {
        self.init_cluster_centres(num_clusters, InitMethod::Random, seed)
    }

    pub fn init_cluster_centres_kpp(&mut self, num_clusters: usize, seed: u64) -> Result<()> {
        self.init_cluster_centres(num_clusters, InitMethod::KMeansPlusPlus, seed)
    }

    pub fn init_cluster_centres_from(&mut self, positions: Vec<Vec<f64>>) -> Result<()> {
        init::check_positions(&positions, self.dataset.band_count())?;
        self.set_positions(positions);
        Ok(())
    }

    fn set_positions(&mut self, positions: Vec<Vec<f64>>) {
        self.next_id = 0;
        self.centres = positions
            .into_iter()
            .map(|p| IsoClusterCentre::new(self.allocate_id(), p))
            .collect();
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn is_initialised(&self) -> bool {
        !self.centres.is_empty()
    }

    pub fn centres(&self) -> &[IsoClusterCentre] {
        &self.centres
    }

    fn positions(&self) -> Vec<Vec<f64>> {
        self.centres.iter().map(|c| c.position.clone()).collect()
    }

    fn ensure_initialised(&self) -> Result<()> {
        if self.is_initialised() {
            Ok(())
        } else {
            Err(Error::Classification("isodata cluster centres have not been initialised".into()))
        }
    }

    pub fn calc_cluster_centres(&mut self, params: &IsodataParams) -> Result<ClusteringSummary> {
        self.ensure_initialised()?;
        let mut scanner = PixelScanner::new(self.dataset);
        let mut summary = ClusteringSummary {
            iterations: 0,
            converged: false,
            movement: 0.0,
            num_clusters: self.centres.len(),
        };

        for iteration in 1..=params.max_iterations {
            summary.iterations = iteration;

            // Recompute positions and average distances.
            let acc = scan::accumulate_pass(&mut scanner, &self.positions())?;
            let mut movement = 0.0;
            for (centre, acc) in self.centres.iter_mut().zip(&acc) {
                if let Some(mean) = acc.mean() {
                    movement += euclidean_distance(&centre.position, &mean);
                    centre.position = mean;
                }
                centre.avg_distance = acc.mean_distance();
            }
            movement /= self.centres.len() as f64;
            summary.movement = movement;

            if movement < params.move_threshold {
                summary.converged = true;
                debug!(iteration, movement, clusters = self.centres.len(), "isodata converged");
                break;
            }

            self.update_spread(&mut scanner)?;

            // centres stay in place if every one is discarded
            let survivors = discard_small(self.centres.clone(), params.min_points_per_cluster);
            if survivors.is_empty() {
                return Err(Error::Classification(format!(
                    "every cluster centre had fewer than {} pixels",
                    params.min_points_per_cluster
                )));
            }
            let merged = merge_close(survivors, params.min_inter_centre_distance);
            let flagged = flag_splits(merged, params.max_std_dev, params.proportion_of_avg_distance);
            self.centres = self.split_flagged(flagged);

            debug!(iteration, movement, clusters = self.centres.len(), "isodata iteration");
        }

        summary.num_clusters = self.centres.len();
        info!(
            iterations = summary.iterations,
            converged = summary.converged,
            clusters = summary.num_clusters,
            "isodata finished"
        );
        Ok(summary)
    }

    /// Second pass: reassign to the updated positions and take per-band
    /// standard deviations and point counts.
    fn update_spread(&mut self, scanner: &mut PixelScanner<'_, D>) -> Result<()> {
        let positions = self.positions();
        let mut acc = vec![CentreAccumulator::new(scanner.bands()); positions.len()];
        scanner.for_each_row("spread", |_, row| {
            for col in (0..row.width()).filter(|&c| row.is_valid(c)) {
                let pixel = row.pixel(col);
                let (idx, _) = nearest_centre(pixel, &positions);
                acc[idx].add_deviation(pixel, &positions[idx]);
            }
            Ok(())
        })?;

        for (centre, acc) in self.centres.iter_mut().zip(&acc) {
            centre.std_dev = acc.std_dev();
            centre.point_count = acc.count;
        }
        Ok(())
    }

    fn split_flagged(&mut self, centres: Vec<IsoClusterCentre>) -> Vec<IsoClusterCentre> {
        let mut next = Vec::with_capacity(centres.len() * 2);
        for centre in centres {
            if !centre.split {
                next.push(centre);
                continue;
            }
            let upper = centre.position.iter().zip(&centre.std_dev).map(|(p, s)| p + s).collect();
            let lower = centre.position.iter().zip(&centre.std_dev).map(|(p, s)| p - s).collect();
            debug!(id = centre.id, "splitting centre");
            next.push(IsoClusterCentre::new(self.allocate_id(), upper));
            next.push(IsoClusterCentre::new(self.allocate_id(), lower));
        }
        next
    }

    /// Renumber the surviving centres densely from 0
    fn renumber(&mut self) {
        for (i, centre) in self.centres.iter_mut().enumerate() {
            centre.id = i as u32;
        }
        self.next_id = self.centres.len() as u32;
    }

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

    /// Renumber the centres, then label `output` (band 0) with them
    pub fn classify_into<O: RasterDatasetMut<Cell = u32>>(&mut self, output: &mut O) -> Result<()> {
        self.ensure_initialised()?;
        self.renumber();
        scan::label_into(self.dataset, &self.positions(), output)
    }

    pub fn generate_output_image(&mut self) -> Result<Raster<u32>> {
        let mut output = Raster::from_template(self.dataset);
        output.set_nodata(Some(LABEL_NODATA));
        self.classify_into(&mut output)?;
        Ok(output)
    }
}

/// Keep the centres with at least `min_points` pixels
fn discard_small(centres: Vec<IsoClusterCentre>, min_points: usize) -> Vec<IsoClusterCentre> {
    centres
        .into_iter()
        .filter(|c| {
            let keep = c.point_count >= min_points;
            if !keep {
                debug!(id = c.id, points = c.point_count, "discarding centre");
            }
            keep
        })
        .collect()
}

/// Repeatedly drop the smaller centre of the first pair closer than
/// `min_distance` (and not coincident). Equal counts drop the later one.
fn merge_close(mut centres: Vec<IsoClusterCentre>, min_distance: f64) -> Vec<IsoClusterCentre> {
    loop {
        let pair = (0..centres.len())
            .flat_map(|i| (i + 1..centres.len()).map(move |j| (i, j)))
            .find(|&(i, j)| {
                let d = euclidean_distance(&centres[i].position, &centres[j].position);
                d > 0.0 && d < min_distance
            });

        let Some((i, j)) = pair else {
            return centres;
        };
        let loser = if centres[j].point_count <= centres[i].point_count { j } else { i };
        debug!(kept = centres[i + j - loser].id, removed = centres[loser].id, "merging centres");
        centres = centres
            .into_iter()
            .enumerate()
            .filter(|&(k, _)| k != loser)
            .map(|(_, c)| c)
            .collect();
    }
}

/// Mark centres whose spread or average distance is too large
fn flag_splits(centres: Vec<IsoClusterCentre>, max_std_dev: f64, proportion: f64) -> Vec<IsoClusterCentre> {
    if centres.is_empty() {
        return centres;
    }
    let mean_avg = centres.iter().map(|c| c.avg_distance).sum::<f64>() / centres.len() as f64;
    let limit = proportion * mean_avg;
    centres
        .into_iter()
        .map(|mut c| {
            c.split = c.avg_distance > limit || c.std_dev.iter().any(|&s| s > max_std_dev);
            c
        })
        .collect()
}
