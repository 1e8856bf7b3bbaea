//! Native GeoTIFF reading/writing (without GDAL dependency)
//!
//! Uses the `tiff` crate. Interleaved multi-sample images are split into
//! bands. Floating point rasters are written as 32-bit float samples,
//! integer rasters as 32-bit unsigned samples. For projections and native
//! sample types enable the `gdal` feature.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, MultiBandRaster, Raster, RasterElement};
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{self, Gray32, Gray32Float};
use tiff::encoder::{TiffEncoder, TiffValue};
use tiff::tags::Tag;

/// Options for writing GeoTIFF files
#[derive(Debug, Clone)]
pub struct GeoTiffOptions {
    /// Compression (ignored by the native writer)
    pub compression: String,
}

impl Default for GeoTiffOptions {
    fn default() -> Self {
        Self {
            compression: "NONE".to_string(),
        }
    }
}

/// Read one band (0-indexed, default 0) of a GeoTIFF
pub fn read_geotiff<T, P>(path: P, band: Option<usize>) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    read_multiband_geotiff(path)?.band(band.unwrap_or(0))
}

/// Read every band of a GeoTIFF
pub fn read_multiband_geotiff<T, P>(path: P) -> Result<MultiBandRaster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| Error::RasterAccess(format!("cannot open {}: {}", path.display(), e)))?;
    decode_geotiff(file)
}

fn cast_all<S: Copy + num_traits::NumCast, T: RasterElement>(buf: Vec<S>) -> Vec<T> {
    buf.into_iter()
        .map(|v| num_traits::cast(v).unwrap_or_else(T::default_nodata))
        .collect()
}

fn decode_geotiff<T, R>(reader: R) -> Result<MultiBandRaster<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let decode_err = |e: tiff::TiffError| Error::RasterAccess(format!("TIFF decode error: {}", e));

    let mut decoder = Decoder::new(reader).map_err(decode_err)?;
    let (width, height) = decoder.dimensions().map_err(decode_err)?;
    let (rows, cols) = (height as usize, width as usize);

    let samples = decoder
        .find_tag_unsigned::<u16>(Tag::SamplesPerPixel)
        .map_err(decode_err)?
        .unwrap_or(1) as usize;

    let interleaved: Vec<T> = match decoder.read_image().map_err(decode_err)? {
        DecodingResult::F32(buf) => cast_all(buf),
        DecodingResult::F64(buf) => cast_all(buf),
        DecodingResult::U8(buf) => cast_all(buf),
        DecodingResult::U16(buf) => cast_all(buf),
        DecodingResult::U32(buf) => cast_all(buf),
        DecodingResult::I8(buf) => cast_all(buf),
        DecodingResult::I16(buf) => cast_all(buf),
        DecodingResult::I32(buf) => cast_all(buf),
        _ => return Err(Error::UnsupportedDataType("unsupported TIFF pixel format".into())),
    };

    if interleaved.len() != rows * cols * samples {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    // pixel-interleaved -> band-sequential
    let cells = rows * cols;
    let mut planar = Vec::with_capacity(interleaved.len());
    for band in 0..samples {
        planar.extend((0..cells).map(|i| interleaved[i * samples + band]));
    }
    let mut raster = MultiBandRaster::from_vec(planar, samples, rows, cols)?;

    if let Ok(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    if let Ok(nodata) = decoder.get_tag_ascii_string(Tag::GdalNodata) {
        if let Ok(value) = nodata.trim_matches(char::from(0)).trim().parse::<f64>() {
            raster.set_nodata(num_traits::cast(value));
        }
    }

    Ok(raster)
}

/// GeoTransform from ModelTiepointTag + ModelPixelScaleTag
fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .map_err(|_| Error::Other("No pixel scale tag".into()))?;
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::ModelTiepointTag)
        .map_err(|_| Error::Other("No tiepoint tag".into()))?;

    if scale.len() >= 2 && tiepoint.len() >= 6 {
        // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
        let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
        let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
        return Ok(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
    }

    Err(Error::Other("Cannot determine geotransform".into()))
}

/// Write a single-band Raster to a GeoTIFF file
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P, _options: Option<GeoTiffOptions>) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    encode_geotiff(raster, file)
}

fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W) -> Result<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let mut encoder = TiffEncoder::new(writer)
        .map_err(|e| Error::RasterAccess(format!("TIFF encoder error: {}", e)))?;

    if T::is_float() {
        let data: Vec<f32> = raster
            .data()
            .iter()
            .map(|&v| num_traits::cast(v).unwrap_or(f32::NAN))
            .collect();
        encode_band::<Gray32Float, _, _>(&mut encoder, raster, &data)
    } else {
        let data: Vec<u32> = raster
            .data()
            .iter()
            .map(|&v| num_traits::cast(v).unwrap_or(u32::MAX))
            .collect();
        encode_band::<Gray32, _, _>(&mut encoder, raster, &data)
    }
}

fn encode_band<C, T, W>(encoder: &mut TiffEncoder<W>, raster: &Raster<T>, data: &[C::Inner]) -> Result<()>
where
    C: colortype::ColorType,
    [C::Inner]: TiffValue,
    T: RasterElement,
    W: Write + Seek,
{
    let tag_err = |e: tiff::TiffError| Error::RasterAccess(format!("Cannot write TIFF tag: {}", e));
    let (rows, cols) = raster.shape();

    let mut image = encoder
        .new_image::<C>(cols as u32, rows as u32)
        .map_err(|e| Error::RasterAccess(format!("Cannot create TIFF image: {}", e)))?;

    let gt = raster.transform();
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image.encoder().write_tag(Tag::ModelPixelScaleTag, &scale[..]).map_err(tag_err)?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image.encoder().write_tag(Tag::ModelTiepointTag, &tiepoint[..]).map_err(tag_err)?;

    // Minimal GeoKey directory: version 1.1.0, ModelTypeProjected, RasterPixelIsArea
    let geokeys: [u16; 12] = [1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 1];
    image.encoder().write_tag(Tag::GeoKeyDirectoryTag, &geokeys[..]).map_err(tag_err)?;

    if let Some(nodata) = raster.nodata() {
        image
            .encoder()
            .write_tag(Tag::GdalNodata, nodata.to_string().as_str())
            .map_err(tag_err)?;
    }

    image
        .write_data(data)
        .map_err(|e| Error::RasterAccess(format!("Cannot write image data: {}", e)))?;
    Ok(())
}
