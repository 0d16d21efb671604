//! The tiled scale operator.

use crate::core::border::BorderMode;
use crate::core::error::{ConfigError, ConfigResult, ScaleError, ScaleResult};
use crate::core::geometry::{Rect, TileGrid};
use crate::core::roi::{NoDataRange, Roi, RoiMask};
use crate::core::source::ImageSource;
use crate::core::types::{Raster, SampleType};
use crate::execution::engine::{ExecutionOptions, ExecutionResult, TileEngine, TiledOperator};
use crate::scale::config::ScaleConfig;
use crate::scale::dispatch::{PixelKernel, TileCase};
use crate::scale::interp::Interpolation;
use crate::scale::mapping::Mapper;
use crate::scale::params::ScaleParams;
use crate::scale::positions::AxisPositions;
use crate::scale::splitter::TileSplitter;
use log::{debug, trace};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Scales and translates a tiled source image.
///
/// Destination pixel `(x, y)` samples the source around
/// `((x + 1/2 - tx) / sx, (y + 1/2 - ty) / sy)`. Geometry is exact; only the
/// interpolation weights are floating point. Pixels that cannot be computed
/// (outside the computable bounds, outside the ROI or with only no-data
/// neighbours) take the destination no-data value.
pub struct ScaleOp {
    source: Arc<dyn ImageSource>,
    params: ScaleParams,
    interp: Interpolation,
    mapper: Mapper,
    border: Option<BorderMode>,
    bounds: Rect,
    computable: Rect,
    grid: TileGrid,
    dest_no_data: Vec<f64>,
    roi: Option<Arc<dyn Roi>>,
    roi_mask: OnceLock<Arc<RoiMask>>,
    no_data: Option<NoDataRange>,
    options: ExecutionOptions,
}

impl ScaleOp {
    /// Build the operator for `source`.
    pub fn new(source: Arc<dyn ImageSource>, config: &ScaleConfig) -> ConfigResult<Self> {
        config.validate()?;
        let params = config.params()?;
        let interp = config.interpolation()?;

        let source_bounds = source.bounds();
        if source_bounds.is_empty() {
            return Err(ConfigError::EmptySource);
        }
        let dest_no_data = band_values(&config.dest_no_data, source.bands())?;

        let mapper = Mapper::new(&params, &interp);
        let extended = config.border.is_some();
        let bounds = mapper.destination_bounds(&source_bounds, extended);
        let computable = mapper.computable_bounds(&source_bounds, &bounds, extended);
        let grid = TileGrid::new(bounds.x, bounds.y, config.tile_width, config.tile_height);

        debug!(
            "scale op: {} {} {}, source {} -> bounds {}, computable {}",
            params,
            interp.kind(),
            source.sample_type(),
            source_bounds,
            bounds,
            computable
        );

        Ok(Self {
            source,
            params,
            interp,
            mapper,
            border: config.border,
            bounds,
            computable,
            grid,
            dest_no_data,
            roi: None,
            roi_mask: OnceLock::new(),
            no_data: None,
            options: config.execution_options(),
        })
    }

    /// Restrict contributing source pixels to `roi`.
    pub fn with_roi(mut self, roi: Arc<dyn Roi>) -> Self {
        self.roi = Some(roi);
        self.roi_mask = OnceLock::new();
        self
    }

    /// Exclude source samples whose value falls in `range`.
    pub fn with_no_data(mut self, range: NoDataRange) -> Self {
        self.no_data = Some(range);
        self
    }

    /// Override how [`ScaleOp::compute_image`] schedules tiles.
    pub fn with_execution_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    /// Destination image bounds.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Part of the bounds that is computed rather than filled with no-data.
    pub fn computable_bounds(&self) -> Rect {
        self.computable
    }

    /// Destination tile layout, anchored at the bounds origin.
    pub fn tile_grid(&self) -> TileGrid {
        self.grid
    }

    /// Validated transform.
    pub fn params(&self) -> &ScaleParams {
        &self.params
    }

    /// Kernel with its weight table.
    pub fn interpolation(&self) -> &Interpolation {
        &self.interp
    }

    /// Destination to source mapping.
    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    /// Bands per pixel, taken from the source.
    pub fn bands(&self) -> usize {
        self.source.bands()
    }

    /// Sample type, taken from the source.
    pub fn sample_type(&self) -> SampleType {
        self.source.sample_type()
    }

    /// Destination no-data, one value per band.
    pub fn dest_no_data(&self) -> &[f64] {
        &self.dest_no_data
    }

    /// Compute one destination tile, clipped to the bounds.
    pub fn compute_tile(&self, tile_x: i64, tile_y: i64) -> ScaleResult<Raster> {
        let rect = self.grid.tile_rect(tile_x, tile_y).intersect(&self.bounds);
        if rect.is_empty() {
            return Err(ScaleError::TileOutOfRange { tile_x, tile_y });
        }

        let mut out = Raster::filled(rect, self.sample_type(), &self.dest_no_data);
        let area = rect.intersect(&self.computable);
        if area.is_empty() {
            return Ok(out);
        }

        let footprint = self.mapper.backward_map(&area);
        let case = TileCase::select(self.roi.as_deref(), self.no_data.as_ref(), &footprint);
        trace!("tile ({}, {}) {}: {}", tile_x, tile_y, area, case);
        if case == TileCase::OutsideRoi {
            return Ok(out);
        }

        let mask = if case.uses_roi() { self.roi_mask() } else { None };
        let kernel = PixelKernel {
            interp: &self.interp,
            case,
            roi: mask.as_deref(),
            no_data: self.no_data.as_ref(),
            dest_no_data: &self.dest_no_data,
        };

        let splitter = TileSplitter::new(&self.mapper, self.source.tile_grid());
        let bits = self.interp.subsample_bits();
        for item in splitter.split(&area) {
            let src = self.read_source(item.src)?;
            let xs = AxisPositions::compute(self.mapper.x(), item.dst.x, item.dst.right(), bits);
            let ys = AxisPositions::compute(self.mapper.y(), item.dst.y, item.dst.bottom(), bits);
            kernel.resample(&src, &xs, &ys, &mut out)?;
        }
        Ok(out)
    }

    /// Compute every tile and assemble the destination image.
    pub fn compute_image(&self) -> ScaleResult<Raster> {
        Ok(self.execute()?.image)
    }

    /// Like [`ScaleOp::compute_image`], with execution statistics.
    pub fn execute(&self) -> ScaleResult<ExecutionResult> {
        TileEngine::new(self.options.clone()).execute(self)
    }

    fn read_source(&self, region: Rect) -> ScaleResult<Raster> {
        match &self.border {
            Some(border) => border.read_extended(self.source.as_ref(), region),
            None => self.source.read_region(region),
        }
    }

    /// The ROI rendered over the source area any tile may read.
    fn roi_mask(&self) -> Option<Arc<RoiMask>> {
        let roi = self.roi.as_ref()?;
        let mask = self.roi_mask.get_or_init(|| {
            let area = self.mapper.backward_map(&self.computable);
            let mask = RoiMask::render(roi.as_ref(), area);
            debug!("rendered ROI mask over {}", mask.rect());
            Arc::new(mask)
        });
        Some(Arc::clone(mask))
    }
}

impl TiledOperator for ScaleOp {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn tile_grid(&self) -> TileGrid {
        self.grid
    }

    fn compute_tile(&self, tile_x: i64, tile_y: i64) -> ScaleResult<Raster> {
        ScaleOp::compute_tile(self, tile_x, tile_y)
    }

    fn blank(&self, rect: Rect) -> Raster {
        Raster::filled(rect, self.sample_type(), &self.dest_no_data)
    }
}

impl fmt::Debug for ScaleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScaleOp")
            .field("params", &self.params)
            .field("interpolation", &self.interp.kind())
            .field("border", &self.border)
            .field("bounds", &self.bounds)
            .field("computable", &self.computable)
            .field("roi", &self.roi)
            .field("no_data", &self.no_data)
            .finish()
    }
}

/// One value per band: a shorter list repeats its last value.
fn band_values(values: &[f64], bands: usize) -> ConfigResult<Vec<f64>> {
    if values.len() > bands {
        return Err(ConfigError::NoDataBands {
            bands,
            got: values.len(),
        });
    }
    let last = values.last().copied().unwrap_or(0.0);
    let mut out = values.to_vec();
    out.resize(bands, last);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::roi::RectRoi;
    use crate::core::source::MemoryImage;
    use crate::scale::interp::InterpolationKind;

    fn ramp(width: i64, height: i64, bands: usize) -> Arc<dyn ImageSource> {
        let raster = Raster::from_fn(Rect::new(0, 0, width, height), bands, |x, y, b| {
            (y * width + x) as f32 + 1000.0 * b as f32
        });
        Arc::new(MemoryImage::new(raster, 4, 4))
    }

    #[test]
    fn test_band_values() {
        assert_eq!(band_values(&[1.0], 3).unwrap(), vec![1.0, 1.0, 1.0]);
        assert_eq!(band_values(&[1.0, 2.0], 3).unwrap(), vec![1.0, 2.0, 2.0]);
        assert_eq!(band_values(&[], 2).unwrap(), vec![0.0, 0.0]);
        assert!(matches!(
            band_values(&[1.0, 2.0], 1),
            Err(ConfigError::NoDataBands { bands: 1, got: 2 })
        ));
    }

    #[test]
    fn test_new_rejects_empty_source() {
        let raster = Raster::filled(Rect::new(0, 0, 0, 4), SampleType::U8, &[0.0]);
        let source: Arc<dyn ImageSource> = Arc::new(MemoryImage::new(raster, 4, 4));
        let err = ScaleOp::new(source, &ScaleConfig::new()).unwrap_err();
        assert!(matches!(err, ConfigError::EmptySource));
    }

    #[test]
    fn test_identity_reproduces_source() {
        let source = ramp(9, 7, 2);
        let expected = source.read_region(source.bounds()).unwrap();
        let op = ScaleOp::new(source, &ScaleConfig::new().with_tile_size(4, 3)).unwrap();
        assert_eq!(op.bounds(), Rect::new(0, 0, 9, 7));
        assert_eq!(op.compute_image().unwrap(), expected);
    }

    #[test]
    fn test_tile_out_of_range() {
        let op = ScaleOp::new(ramp(8, 8, 1), &ScaleConfig::new().with_tile_size(4, 4)).unwrap();
        assert!(op.compute_tile(1, 1).is_ok());
        assert!(matches!(
            op.compute_tile(2, 0),
            Err(ScaleError::TileOutOfRange { tile_x: 2, tile_y: 0 })
        ));
    }

    #[test]
    fn test_uncomputable_margin_is_no_data() {
        let config = ScaleConfig::new()
            .with_interpolation(InterpolationKind::Bilinear)
            .with_scale(2.0, 2.0)
            .with_dest_no_data(vec![-7.0]);
        let op = ScaleOp::new(ramp(6, 6, 1), &config).unwrap();
        // Without a border the bounds equal the computable bounds.
        assert_eq!(op.bounds(), op.computable_bounds());

        let config = config.with_border(BorderMode::Copy);
        let op = ScaleOp::new(ramp(6, 6, 1), &config).unwrap();
        assert_eq!(op.bounds(), Rect::new(0, 0, 12, 12));
        let image = op.compute_image().unwrap();
        // Copy extension makes the corner equal to the corner source pixel.
        assert_eq!(image.get(0, 0, 0), Some(0.0));
        assert_eq!(image.get(11, 11, 0), Some(35.0));
    }

    #[test]
    fn test_roi_mask_is_rendered_once() {
        let roi: Arc<dyn Roi> = Arc::new(RectRoi::new(Rect::new(0, 0, 3, 8)));
        let op = ScaleOp::new(ramp(8, 8, 1), &ScaleConfig::new().with_tile_size(4, 4))
            .unwrap()
            .with_roi(roi);
        let first = op.roi_mask().unwrap();
        let second = op.roi_mask().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let tile = op.compute_tile(0, 0).unwrap();
        assert_eq!(tile.get(2, 0, 0), Some(2.0));
        assert_eq!(tile.get(3, 0, 0), Some(0.0));
        // The right tile column misses the ROI entirely.
        let right = op.compute_tile(1, 0).unwrap();
        assert!(right.as_slice::<f32>().unwrap().iter().all(|&v| v == 0.0));
    }
}
