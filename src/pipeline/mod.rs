//! The export pipeline: mesh in, `.goo` file out.
//!
//! Stages run in order: cross-sectioning, optional grid infill,
//! rasterization, RLE encoding, file assembly. Rasterization and
//! encoding are per-layer independent and run on the rayon pool; the
//! results are collected back in bottom-up layer order before assembly.
//!
//! Both the geometry kernel and the rasterizer are injected at
//! construction, so alternative implementations slot in without
//! touching the orchestration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;

use log::{info, warn};
use rayon::prelude::*;

use crate::config::JobConfig;
use crate::geometry::{BoundingBox2, Point2, Polygon};
use crate::goo::{encode_rle, GooDocument, GooHeader, GooLayer};
use crate::infill::{InfillGenerator, Segment};
use crate::kernel::{GeometryKernel, SectionKernel};
use crate::mesh::TriangleMesh;
use crate::raster::{RasterFrame, Rasterizer, ScanlineRasterizer};
use crate::slice::{SliceLayer, Slicer};
use crate::{CoordF, Error, Result, VERSION};

/// Assumed cured-resin density for the weight estimate (g/cm3).
const RESIN_DENSITY: f64 = 1.1;

/// Pipeline stage reported through progress callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Slicing,
    Rasterizing,
    Assembling,
    Writing,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Slicing => "slicing",
            PipelineStage::Rasterizing => "rasterizing",
            PipelineStage::Assembling => "assembling",
            PipelineStage::Writing => "writing",
        };
        f.write_str(name)
    }
}

/// Outcome of a finished export.
#[derive(Clone, Debug)]
pub struct ExportSummary {
    pub layer_count: usize,
    pub file_bytes: usize,
    /// Cured material estimate (cm3).
    pub volume_cm3: f64,
    /// Print duration estimate (s).
    pub printing_time_s: u32,
    /// Layers that had contours but no valid one and were replaced by a
    /// blank mask.
    pub degenerate_layers: usize,
    pub path: Option<PathBuf>,
}

/// The mesh-to-GOO export pipeline.
pub struct Pipeline<K = SectionKernel, R = ScanlineRasterizer> {
    config: JobConfig,
    kernel: K,
    rasterizer: R,
}

impl Pipeline {
    pub fn new(config: JobConfig) -> Self {
        Self::with_components(config, SectionKernel::new(), ScanlineRasterizer::new())
    }
}

impl<K, R> Pipeline<K, R>
where
    K: GeometryKernel + Sync,
    R: Rasterizer + Sync,
{
    /// Build a pipeline around caller-supplied kernel and rasterizer.
    pub fn with_components(config: JobConfig, kernel: K, rasterizer: R) -> Self {
        Self {
            config,
            kernel,
            rasterizer,
        }
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Run the full pipeline, producing the in-memory document.
    pub fn export(&self, mesh: &TriangleMesh) -> Result<GooDocument> {
        self.export_with(mesh, |_, _| {}, None)
    }

    /// Run the full pipeline with stage-local progress in `0.0..=1.0`
    /// and an optional cancellation flag.
    ///
    /// Cancellation is checked between layers; a cancelled export
    /// returns [`Error::Cancelled`] and writes nothing.
    pub fn export_with<F>(
        &self,
        mesh: &TriangleMesh,
        progress: F,
        cancel: Option<&AtomicBool>,
    ) -> Result<GooDocument>
    where
        F: Fn(PipelineStage, f64) + Sync,
    {
        self.run(mesh, progress, cancel).map(|(document, _)| document)
    }

    /// Pipeline body; also reports how many layers fell back to a blank
    /// mask so the export summary can surface it.
    fn run<F>(
        &self,
        mesh: &TriangleMesh,
        progress: F,
        cancel: Option<&AtomicBool>,
    ) -> Result<(GooDocument, usize)>
    where
        F: Fn(PipelineStage, f64) + Sync,
    {
        self.config.validate()?;
        let cancelled = || cancel.is_some_and(|c| c.load(Ordering::Relaxed));

        let bb = mesh.bounding_box();
        let size = bb.size();
        let platform = &self.config.platform;
        if size.x > platform.x_size || size.y > platform.y_size || size.z > platform.z_size {
            return Err(Error::Mesh(format!(
                "model ({:.1} x {:.1} x {:.1} mm) exceeds the build volume ({:.1} x {:.1} x {:.1} mm)",
                size.x, size.y, size.z, platform.x_size, platform.y_size, platform.z_size
            )));
        }

        let slicer = Slicer::new(&self.kernel, self.config.slicing);
        let mut layers = slicer.slice_with_progress(mesh, |done, total| {
            progress(PipelineStage::Slicing, done as f64 / total as f64);
        })?;
        if cancelled() {
            return Err(Error::Cancelled);
        }

        // Center the model on the optical axis: the rasterizer maps the
        // platform extents onto the full pixel area with the origin at
        // the image center.
        let center = bb.to_2d().center();
        for layer in &mut layers {
            for polygon in &mut layer.polygons {
                polygon.translate(-center.x, -center.y);
            }
        }

        let mut model_bounds = bb.to_2d();
        model_bounds.min -= center;
        model_bounds.max -= center;
        let platform_bounds = platform_extents(platform.x_size, platform.y_size);

        let infill = self
            .config
            .infill_enabled
            .then(|| InfillGenerator::new(self.config.infill.clone()));

        let total = layers.len();
        let volume_cm3 = self.estimate_volume(&layers);
        let printing_time_s = self.estimate_print_time(total);
        let mut document = GooDocument::new(self.build_header(volume_cm3, printing_time_s));

        // Rasterize and encode on the rayon pool, handing finished
        // layers to this thread over a bounded channel. The encoder
        // consumes them in strict bottom-up order; out-of-order
        // arrivals wait in a small reorder buffer. Dropping the
        // receiver is what stops the workers.
        let abort = AtomicBool::new(false);
        let degenerate = AtomicUsize::new(0);
        let stopped = || abort.load(Ordering::Relaxed) || cancelled();
        let (tx, rx) = mpsc::sync_channel::<(usize, Result<Vec<u8>>)>(
            rayon::current_num_threads().max(1) * 2,
        );

        let layers_ref = &layers;
        let degenerate_ref = &degenerate;
        std::thread::scope(|scope| -> Result<()> {
            // Owned here so an early error return drops the receiver,
            // unblocking any worker waiting on a full channel.
            let rx = rx;
            scope.spawn(move || {
                layers_ref
                    .par_iter()
                    .enumerate()
                    .for_each_with(tx, |tx, (i, layer)| {
                        if stopped() {
                            return;
                        }
                        let result = self.encode_layer(
                            layer,
                            &model_bounds,
                            &platform_bounds,
                            infill.as_ref(),
                            degenerate_ref,
                        );
                        // A closed channel means the consumer gave up.
                        let _ = tx.send((i, result));
                    });
            });

            let mut pending: BTreeMap<usize, Vec<u8>> = BTreeMap::new();
            let mut next_index = 0;
            while next_index < total {
                if cancelled() {
                    abort.store(true, Ordering::Relaxed);
                    return Err(Error::Cancelled);
                }
                let (index, result) = rx.recv().map_err(|_| Error::Cancelled)?;
                match result {
                    Ok(bytes) => {
                        pending.insert(index, bytes);
                    }
                    Err(e) => {
                        abort.store(true, Ordering::Relaxed);
                        return Err(e);
                    }
                }
                while let Some(bytes) = pending.remove(&next_index) {
                    document
                        .add_encoded_layer(self.build_layer_record(&layers_ref[next_index]), bytes);
                    next_index += 1;
                    progress(PipelineStage::Rasterizing, next_index as f64 / total as f64);
                }
            }
            Ok(())
        })?;

        let degenerate_count = degenerate.load(Ordering::Relaxed);
        if degenerate_count == total {
            return Err(Error::EmptyMesh);
        }
        if degenerate_count > 0 {
            warn!("{degenerate_count} of {total} layers fell back to a blank mask");
        }

        progress(PipelineStage::Assembling, 1.0);

        info!(
            "assembled {} layers, est. {:.2} cm3 of resin, est. {} s print",
            total, volume_cm3, printing_time_s
        );
        Ok((document, degenerate_count))
    }

    /// Run the pipeline and publish the result to `path`.
    pub fn export_to_file<P: AsRef<Path>>(
        &self,
        mesh: &TriangleMesh,
        path: P,
    ) -> Result<ExportSummary> {
        self.export_to_file_with(mesh, path, |_, _| {}, None)
    }

    pub fn export_to_file_with<P, F>(
        &self,
        mesh: &TriangleMesh,
        path: P,
        progress: F,
        cancel: Option<&AtomicBool>,
    ) -> Result<ExportSummary>
    where
        P: AsRef<Path>,
        F: Fn(PipelineStage, f64) + Sync,
    {
        let (document, degenerate_layers) = self.run(mesh, &progress, cancel)?;
        if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            return Err(Error::Cancelled);
        }
        progress(PipelineStage::Writing, 0.0);
        let path = path.as_ref();
        document.save(path)?;
        progress(PipelineStage::Writing, 1.0);

        let bytes = document.to_bytes()?.len();
        Ok(ExportSummary {
            layer_count: document.layer_count(),
            file_bytes: bytes,
            volume_cm3: self.estimate_volume_from_header(&document),
            printing_time_s: document.header().printing_time,
            degenerate_layers,
            path: Some(path.to_path_buf()),
        })
    }

    /// Rasterize and RLE-encode one layer.
    ///
    /// A degenerate layer (contours present but none with enough
    /// vertices to enclose area) is logged and replaced by an
    /// all-background mask rather than failing the export.
    fn encode_layer(
        &self,
        layer: &SliceLayer,
        model_bounds: &BoundingBox2,
        platform_bounds: &BoundingBox2,
        infill: Option<&InfillGenerator>,
        degenerate: &AtomicUsize,
    ) -> Result<Vec<u8>> {
        let width = self.config.platform.x_resolution as usize;
        let height = self.config.platform.y_resolution as usize;
        let frame = match self.render_layer(layer, model_bounds, platform_bounds, infill) {
            Ok(frame) => frame,
            Err(e @ Error::DegenerateLayer { .. }) => {
                warn!("{e}; emitting a blank mask");
                degenerate.fetch_add(1, Ordering::Relaxed);
                RasterFrame::new(width, height)
            }
            Err(e) => return Err(e),
        };
        encode_rle(frame.pixels())
    }

    /// Rasterize one layer.
    ///
    /// Without infill the solid cross-section is cured as is. With
    /// infill the interior is hollowed: the cured pattern is the grid
    /// strokes plus a shell along every contour, intersected with the
    /// solid mask so no stroke escapes into a hole or past the outer
    /// boundary.
    ///
    /// A layer with no geometry at all still yields a frame, all
    /// background; the printer wants a record for every layer.
    fn render_layer(
        &self,
        layer: &SliceLayer,
        model_bounds: &BoundingBox2,
        platform_bounds: &BoundingBox2,
        infill: Option<&InfillGenerator>,
    ) -> Result<RasterFrame> {
        let width = self.config.platform.x_resolution as usize;
        let height = self.config.platform.y_resolution as usize;
        if layer.is_empty() {
            return Ok(RasterFrame::new(width, height));
        }
        if !layer.polygons.iter().any(|p| p.is_valid()) {
            return Err(Error::DegenerateLayer {
                layer: layer.index,
                reason: "no contour has three or more vertices".into(),
            });
        }

        let solid = self
            .rasterizer
            .rasterize(&layer.polygons, platform_bounds, width, height);
        let Some(generator) = infill else {
            return Ok(solid);
        };
        let result = generator.generate(layer, model_bounds);
        if result.is_empty() {
            return Ok(solid);
        }

        let half_width = generator.config().line_width * 0.5;
        let mut strokes: Vec<Polygon> = result
            .segments
            .iter()
            .filter_map(|s| stroke_segment(s, half_width))
            .collect();
        for polygon in &layer.polygons {
            if !polygon.is_valid() {
                continue;
            }
            for edge in polygon.edges() {
                let seg = Segment {
                    start: edge.a,
                    end: edge.b,
                };
                strokes.extend(stroke_segment(&seg, half_width));
            }
        }
        let mut pattern = self
            .rasterizer
            .rasterize(&strokes, platform_bounds, width, height);
        pattern.intersect(&solid);
        Ok(pattern)
    }

    fn build_header(&self, volume_cm3: f64, printing_time_s: u32) -> GooHeader {
        let platform = &self.config.platform;
        let exposure = &self.config.exposure;
        GooHeader {
            software_info: "resin-slicer".into(),
            software_version: VERSION.into(),
            printer_name: platform.printer_name.clone(),
            printer_type: platform.printer_type.clone(),
            profile_name: self.config.profile_name.clone(),
            x_resolution: platform.x_resolution,
            y_resolution: platform.y_resolution,
            x_mirror: platform.x_mirror,
            y_mirror: platform.y_mirror,
            x_size_platform: platform.x_size as f32,
            y_size_platform: platform.y_size as f32,
            z_size_platform: platform.z_size as f32,
            layer_thickness: self.config.slicing.layer_height as f32,
            exposure_time: exposure.exposure_time as f32,
            turn_off_time: exposure.turn_off_time as f32,
            bottom_exposure_time: exposure.bottom_exposure_time as f32,
            bottom_layers: exposure.bottom_layers,
            bottom_lift_distance: exposure.lift_distance as f32,
            bottom_lift_speed: exposure.bottom_lift_speed as f32,
            lift_distance: exposure.lift_distance as f32,
            lift_speed: exposure.lift_speed as f32,
            bottom_retract_distance: exposure.retract_distance as f32,
            bottom_retract_speed: exposure.retract_speed as f32,
            retract_distance: exposure.retract_distance as f32,
            retract_speed: exposure.retract_speed as f32,
            bottom_light_pwm: exposure.bottom_light_pwm,
            light_pwm: exposure.light_pwm,
            printing_time: printing_time_s,
            total_volume: volume_cm3 as f32,
            total_weight: (volume_cm3 * RESIN_DENSITY) as f32,
            ..GooHeader::default()
        }
    }

    fn build_layer_record(&self, layer: &SliceLayer) -> GooLayer {
        let exposure = &self.config.exposure;
        let bottom = (layer.index as u32) < exposure.bottom_layers;
        GooLayer {
            layer_position_z: layer.height as f32,
            layer_exposure_time: exposure.exposure_for(layer.index) as f32,
            layer_off_time: exposure.turn_off_time as f32,
            lift_distance: exposure.lift_distance as f32,
            lift_speed: if bottom {
                exposure.bottom_lift_speed as f32
            } else {
                exposure.lift_speed as f32
            },
            retract_distance: exposure.retract_distance as f32,
            retract_speed: exposure.retract_speed as f32,
            light_pwm: if bottom {
                exposure.bottom_light_pwm
            } else {
                exposure.light_pwm
            },
            ..GooLayer::default()
        }
    }

    /// Material estimate: per-layer solid area times the layer pitch,
    /// mm3 converted to cm3.
    fn estimate_volume(&self, layers: &[SliceLayer]) -> f64 {
        let area_sum: CoordF = layers.iter().map(|l| l.solid_area().max(0.0)).sum();
        area_sum * self.config.slicing.layer_height / 1000.0
    }

    fn estimate_volume_from_header(&self, document: &GooDocument) -> f64 {
        f64::from(document.header().total_volume)
    }

    /// Duration estimate: exposures plus light-off dwell and Z travel,
    /// with lift/retract speeds given in mm/min.
    fn estimate_print_time(&self, layer_count: usize) -> u32 {
        let exposure = &self.config.exposure;
        let bottom = (exposure.bottom_layers as usize).min(layer_count);
        let normal = layer_count - bottom;
        let travel = if exposure.lift_speed > 0.0 && exposure.retract_speed > 0.0 {
            exposure.lift_distance / exposure.lift_speed * 60.0
                + exposure.retract_distance / exposure.retract_speed * 60.0
        } else {
            0.0
        };
        let per_layer_overhead = exposure.turn_off_time + travel;
        let total = bottom as f64 * exposure.bottom_exposure_time
            + normal as f64 * exposure.exposure_time
            + layer_count as f64 * per_layer_overhead;
        total.round() as u32
    }
}

/// Platform extents centered on the origin, for mapping model space
/// onto the full mask.
fn platform_extents(x_size: CoordF, y_size: CoordF) -> BoundingBox2 {
    BoundingBox2::from_points(&[
        Point2::new(-x_size * 0.5, -y_size * 0.5),
        Point2::new(x_size * 0.5, y_size * 0.5),
    ])
}

/// Expand an infill segment into a counter-clockwise quad of the given
/// half-width. Degenerate segments produce nothing.
fn stroke_segment(segment: &Segment, half_width: CoordF) -> Option<Polygon> {
    let d = segment.end - segment.start;
    let len = d.length();
    if len < 1e-9 || half_width <= 0.0 {
        return None;
    }
    let n = Point2::new(-d.y / len, d.x / len) * half_width;
    Some(Polygon::from_points(vec![
        segment.start - n,
        segment.end - n,
        segment.end + n,
        segment.start + n,
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Mutex;

    fn small_config() -> JobConfig {
        JobConfig::default()
            .layer_height(1.0)
            .resolution(64, 64)
            .platform_size(20.0, 20.0, 50.0)
    }

    #[test]
    fn cube_exports_one_layer_per_pitch() {
        let mesh = TriangleMesh::cube(10.0);
        let pipeline = Pipeline::new(small_config());
        let document = pipeline.export(&mesh).unwrap();
        assert_eq!(document.layer_count(), 10);
    }

    #[test]
    fn oversized_model_is_rejected() {
        let mesh = TriangleMesh::cube(30.0);
        let pipeline = Pipeline::new(small_config());
        assert!(matches!(pipeline.export(&mesh), Err(Error::Mesh(_))));
    }

    #[test]
    fn preset_cancel_flag_aborts() {
        let mesh = TriangleMesh::cube(10.0);
        let pipeline = Pipeline::new(small_config());
        let cancel = AtomicBool::new(true);
        let result = pipeline.export_with(&mesh, |_, _| {}, Some(&cancel));
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn progress_visits_each_stage_in_order() {
        let mesh = TriangleMesh::cube(5.0);
        let pipeline = Pipeline::new(small_config());
        let stages = Mutex::new(Vec::new());
        pipeline
            .export_with(
                &mesh,
                |stage, fraction| {
                    assert!((0.0..=1.0).contains(&fraction));
                    stages.lock().unwrap().push(stage);
                },
                None,
            )
            .unwrap();
        let stages = stages.into_inner().unwrap();
        assert_eq!(stages.first(), Some(&PipelineStage::Slicing));
        assert_eq!(stages.last(), Some(&PipelineStage::Assembling));
        assert!(stages.contains(&PipelineStage::Rasterizing));
    }

    #[test]
    fn rendered_cube_layer_lights_the_center() {
        let config = small_config();
        let mesh = TriangleMesh::cube(10.0);
        let pipeline = Pipeline::new(config);
        let document = pipeline.export(&mesh).unwrap();
        let bytes = document.to_bytes().unwrap();
        // Cube covers half the 20 mm platform in each axis, so the mask
        // is a centered 32x32 square: 1024 of 4096 pixels lit.
        assert!(bytes.len() > 1000);
    }

    #[test]
    fn layer_records_follow_exposure_schedule() {
        let mut config = small_config();
        config.exposure.bottom_layers = 2;
        let pipeline = Pipeline::new(config);
        let record0 = pipeline.build_layer_record(&SliceLayer::new(0, 0.5, vec![]));
        let record5 = pipeline.build_layer_record(&SliceLayer::new(5, 5.5, vec![]));
        assert_eq!(record0.layer_exposure_time, 60.0);
        assert_eq!(record5.layer_exposure_time, 8.0);
    }

    #[test]
    fn export_to_file_publishes_goo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.goo");
        let mesh = TriangleMesh::cube(10.0);
        let pipeline = Pipeline::new(small_config());
        let summary = pipeline.export_to_file(&mesh, &path).unwrap();
        assert_eq!(summary.layer_count, 10);
        assert_eq!(std::fs::metadata(&path).unwrap().len() as usize, summary.file_bytes);
        assert!(summary.volume_cm3 > 0.9 && summary.volume_cm3 < 1.1);
    }

    #[test]
    fn degenerate_layer_falls_back_to_blank_mask() {
        let pipeline = Pipeline::new(small_config());
        let stub = Polygon::from_points(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
        let layer = SliceLayer::new(3, 3.5, vec![stub]);
        let bounds = platform_extents(20.0, 20.0);

        assert!(matches!(
            pipeline.render_layer(&layer, &bounds, &bounds, None),
            Err(Error::DegenerateLayer { layer: 3, .. })
        ));
        let counter = AtomicUsize::new(0);
        let bytes = pipeline
            .encode_layer(&layer, &bounds, &bounds, None, &counter)
            .unwrap();
        let pixels = crate::goo::decode_rle(&bytes, 64 * 64).unwrap();
        assert!(pixels.iter().all(|&p| p == 0));
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn infill_never_cures_inside_holes() {
        use crate::raster::{BACKGROUND, FOREGROUND};

        let mut config = small_config().resolution(200, 200).with_infill(0.5);
        config.infill.line_width = 1.0;
        let pipeline = Pipeline::new(config);

        let outer = Polygon::from_points(vec![
            Point2::new(-5.0, -5.0),
            Point2::new(5.0, -5.0),
            Point2::new(5.0, 5.0),
            Point2::new(-5.0, 5.0),
        ]);
        let mut hole = Polygon::from_points(vec![
            Point2::new(-2.0, -2.0),
            Point2::new(2.0, -2.0),
            Point2::new(2.0, 2.0),
            Point2::new(-2.0, 2.0),
        ]);
        hole.reverse();
        let layer = SliceLayer::new(0, 0.5, vec![outer, hole]);
        let model_bounds = layer.bounding_box();
        let platform_bounds = platform_extents(20.0, 20.0);
        let generator = InfillGenerator::new(pipeline.config().infill.clone());

        let frame = pipeline
            .render_layer(&layer, &model_bounds, &platform_bounds, Some(&generator))
            .unwrap();

        // The hole spans model (-2, -2)..(2, 2); at 10 px/mm on the 20 mm
        // platform that is pixels 80..120. Nothing inside may cure.
        for y in 81..119 {
            for x in 81..119 {
                assert_eq!(
                    frame.get(x, y),
                    BACKGROUND,
                    "cured pixel inside the hole at ({x}, {y})"
                );
            }
        }
        // The shell along the outer boundary cures.
        assert_eq!(frame.get(100, 52), FOREGROUND);
        // The interior between grid strokes stays hollow.
        assert_eq!(frame.get(130, 57), BACKGROUND);
        assert!(frame.coverage() > 0.0);
    }

    #[test]
    fn infill_strokes_become_quads() {
        let segment = Segment {
            start: Point2::new(0.0, 0.0),
            end: Point2::new(2.0, 0.0),
        };
        let quad = stroke_segment(&segment, 0.25).unwrap();
        assert_eq!(quad.len(), 4);
        assert!(quad.is_counter_clockwise());
        assert!((quad.signed_area() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_stroke_dropped() {
        let segment = Segment {
            start: Point2::new(1.0, 1.0),
            end: Point2::new(1.0, 1.0),
        };
        assert!(stroke_segment(&segment, 0.25).is_none());
    }
}
