//! Cluster-centre initialization shared by the K-Means and ISODATA classifiers

use std::fmt;
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rsgis_core::{Error, RasterDataset, Result};
use tracing::debug;

use super::centre::nearest_centre;
use super::scan::PixelScanner;

/// How the initial cluster centres are placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitMethod {
    /// One random integer per band, uniform over the band's [min, max]
    #[default]
    Random,
    /// k-means++: distance-weighted sampling of image pixels
    KMeansPlusPlus,
}

impl FromStr for InitMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "random" | "rand" => Ok(InitMethod::Random),
            "kpp" | "kmeans++" | "k-means++" => Ok(InitMethod::KMeansPlusPlus),
            other => Err(Error::Classification(format!(
                "unknown centre initialization method '{}' (use random or kpp)",
                other
            ))),
        }
    }
}

impl fmt::Display for InitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitMethod::Random => write!(f, "random"),
            InitMethod::KMeansPlusPlus => write!(f, "kpp"),
        }
    }
}

pub(crate) fn check_cluster_count(num_clusters: usize) -> Result<()> {
    if num_clusters == 0 {
        return Err(Error::Classification("at least one cluster centre is required".into()));
    }
    Ok(())
}

/// Validate explicit positions against the dataset band count
pub(crate) fn check_positions(positions: &[Vec<f64>], bands: usize) -> Result<()> {
    check_cluster_count(positions.len())?;
    if let Some(bad) = positions.iter().find(|p| p.len() != bands) {
        return Err(Error::Classification(format!(
            "cluster centre has {} values but the image has {} bands",
            bad.len(),
            bands
        )));
    }
    Ok(())
}

pub(crate) fn init_positions<D: RasterDataset>(
    dataset: &D,
    num_clusters: usize,
    method: InitMethod,
    seed: u64,
) -> Result<Vec<Vec<f64>>> {
    match method {
        InitMethod::Random => random_positions(dataset, num_clusters, seed),
        InitMethod::KMeansPlusPlus => kpp_positions(dataset, num_clusters, seed),
    }
}

/// Draw each centre band by band from the integers of `[floor(min), ceil(max)]`
pub(crate) fn random_positions<D: RasterDataset>(
    dataset: &D,
    num_clusters: usize,
    seed: u64,
) -> Result<Vec<Vec<f64>>> {
    check_cluster_count(num_clusters)?;
    let ranges = (0..dataset.band_count())
        .map(|band| {
            let (min, max) = dataset.band_min_max(band)?;
            Ok((min.floor() as i64, max.ceil() as i64))
        })
        .collect::<Result<Vec<_>>>()?;
    debug!(?ranges, "band ranges for random centres");

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    Ok((0..num_clusters)
        .map(|_| {
            ranges
                .iter()
                .map(|&(lo, hi)| rng.gen_range(lo..=hi) as f64)
                .collect()
        })
        .collect())
}

/// k-means++ seeding.
///
/// The first centre is a uniformly chosen valid pixel; each further centre
/// is a pixel chosen with probability proportional to its squared distance
/// to the nearest centre so far. Each draw is one streaming pass using
/// weighted reservoir sampling, so no per-pixel state is kept.
pub(crate) fn kpp_positions<D: RasterDataset>(
    dataset: &D,
    num_clusters: usize,
    seed: u64,
) -> Result<Vec<Vec<f64>>> {
    check_cluster_count(num_clusters)?;
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut scanner = PixelScanner::new(dataset);
    let mut positions: Vec<Vec<f64>> = Vec::with_capacity(num_clusters);

    while positions.len() < num_clusters {
        let mut chosen: Option<Vec<f64>> = None;
        let mut total = 0.0;

        scanner.for_each_row("kpp", |_, row| {
            for col in (0..row.width()).filter(|&c| row.is_valid(c)) {
                let pixel = row.pixel(col);
                let weight = if positions.is_empty() {
                    1.0
                } else {
                    nearest_centre(pixel, &positions).1
                };
                if weight <= 0.0 {
                    continue;
                }
                total += weight;
                if rng.gen::<f64>() * total < weight {
                    chosen = Some(pixel.to_vec());
                }
            }
            Ok(())
        })?;

        match chosen {
            Some(position) => positions.push(position),
            None => {
                return Err(Error::Classification(format!(
                    "k-means++ found only {} distinct centres, {} requested",
                    positions.len(),
                    num_clusters
                )))
            }
        }
    }

    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsgis_core::{MultiBandRaster, Raster};

    #[test]
    fn test_parse_init_method() {
        assert_eq!("random".parse::<InitMethod>().unwrap(), InitMethod::Random);
        assert_eq!("KPP".parse::<InitMethod>().unwrap(), InitMethod::KMeansPlusPlus);
        assert!(matches!(
            "diagonal".parse::<InitMethod>(),
            Err(Error::Classification(_))
        ));
    }

    #[test]
    fn test_random_positions_within_band_ranges() {
        let mut data = vec![0.0f32; 200];
        for (i, v) in data.iter_mut().enumerate() {
            *v = if i < 100 { 10.0 + (i % 20) as f32 } else { 200.0 + (i % 50) as f32 };
        }
        let raster = MultiBandRaster::from_vec(data, 2, 10, 10).unwrap();
        let positions = random_positions(&raster, 8, 7).unwrap();

        assert_eq!(positions.len(), 8);
        for p in &positions {
            assert_eq!(p.len(), 2);
            assert!((10.0..=29.0).contains(&p[0]));
            assert!((200.0..=249.0).contains(&p[1]));
            assert_eq!(p[0].fract(), 0.0);
        }
        assert_eq!(positions, random_positions(&raster, 8, 7).unwrap());
    }

    #[test]
    fn test_kpp_picks_each_group() {
        let data: Vec<f32> = (0..100).map(|i| if i % 2 == 0 { 5.0 } else { 500.0 }).collect();
        let raster = Raster::from_vec(data, 10, 10).unwrap();
        let mut positions = kpp_positions(&raster, 2, 3).unwrap();
        positions.sort_by(|a, b| a[0].total_cmp(&b[0]));
        assert_eq!(positions, vec![vec![5.0], vec![500.0]]);
    }

    #[test]
    fn test_kpp_too_few_distinct_values() {
        let raster = Raster::filled(4, 4, 1.0f32);
        assert!(matches!(kpp_positions(&raster, 2, 0), Err(Error::Classification(_))));
    }

    #[test]
    fn test_zero_clusters_rejected() {
        let raster = Raster::filled(2, 2, 1.0f32);
        assert!(random_positions(&raster, 0, 0).is_err());
    }
}
