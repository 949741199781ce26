use anyhow::{anyhow, Result};
use image::{imageops::FilterType, Rgb, RgbImage};
use ndarray::{Array4, ArrayView2, ArrayViewD, Axis, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Value;
use std::fs;

use crate::domain::detection::{BoundingBox, Detection};
use crate::domain::model::YoloParams;

pub struct OnnxYoloEngine {
    session: Session,
    params: YoloParams,
}

impl OnnxYoloEngine {
    pub fn load(path: &str, params: YoloParams) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(4)?;

        // CUDA is optional: registered when available, otherwise CPU.
        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let model_bytes = fs::read(path)?;
        let session = builder.commit_from_memory(&model_bytes)?;

        Ok(Self { session, params })
    }

    pub fn infer(&mut self, rgb: &RgbImage, conf_threshold: f32) -> Result<Vec<Detection>> {
        let imgsz = self.params.input_size as usize;
        let (padded, geometry) = letterbox(rgb, self.params.input_size);

        let mut input = Array4::<f32>::zeros((1, 3, imgsz, imgsz));
        for (x, y, pixel) in padded.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }

        let input_shape = vec![1, 3, imgsz as i64, imgsz as i64];
        let input_tensor = Value::from_array((input_shape, input.into_raw_vec_and_offset().0))?;

        let outputs = self.session.run(ort::inputs![input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = shape_out.iter().map(|&x| x as usize).collect();
        if dims.len() != 3 || dims[1] <= 4 {
            return Err(anyhow!("unexpected YOLO output shape {:?}", dims));
        }
        let array_view = ArrayViewD::from_shape(IxDyn(&dims), data_out)?;
        let view = array_view
            .index_axis(Axis(0), 0)
            .into_dimensionality::<ndarray::Ix2>()?;

        let candidates = decode_predictions(view, conf_threshold, &geometry, (rgb.width(), rgb.height()));
        Ok(non_max_suppression(
            candidates,
            self.params.iou_threshold,
            self.params.max_detections,
        ))
    }
}

const PAD_GRAY: Rgb<u8> = Rgb([114, 114, 114]);

/// Aspect-preserving fit of a source image into the square model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub resized: (u32, u32),
    pub pad: (u32, u32),
}

impl Letterbox {
    pub fn fit(width: u32, height: u32, size: u32) -> Self {
        let scale = (size as f32 / width as f32).min(size as f32 / height as f32);
        let new_w = ((width as f32 * scale).round() as u32).clamp(1, size);
        let new_h = ((height as f32 * scale).round() as u32).clamp(1, size);
        Self {
            scale,
            resized: (new_w, new_h),
            pad: ((size - new_w) / 2, (size - new_h) / 2),
        }
    }

    /// Maps a point in model-input space back onto the source image.
    pub fn source_point(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad.0 as f32) / self.scale, (y - self.pad.1 as f32) / self.scale)
    }
}

/// Resizes without distortion and centres the result on a gray square canvas.
pub fn letterbox(rgb: &RgbImage, size: u32) -> (RgbImage, Letterbox) {
    let geometry = Letterbox::fit(rgb.width(), rgb.height(), size);
    let (new_w, new_h) = geometry.resized;
    let resized = image::imageops::resize(rgb, new_w, new_h, FilterType::Triangle);

    let mut canvas = RgbImage::from_pixel(size, size, PAD_GRAY);
    image::imageops::replace(&mut canvas, &resized, geometry.pad.0 as i64, geometry.pad.1 as i64);
    (canvas, geometry)
}

/// Reads a `[4 + classes, candidates]` prediction matrix (cx, cy, w, h, scores...)
/// and keeps the best class of every candidate scoring above `conf_threshold`.
pub fn decode_predictions(
    view: ArrayView2<f32>,
    conf_threshold: f32,
    geometry: &Letterbox,
    (width, height): (u32, u32),
) -> Vec<Detection> {
    let num_candidates = view.shape()[1];
    let (max_x, max_y) = (width as f32, height as f32);
    let mut detections = Vec::new();

    for i in 0..num_candidates {
        let column = view.column(i);
        let Some((class_id, &score)) = column
            .iter()
            .skip(4)
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
        else {
            continue;
        };

        if !score.is_finite() || score <= conf_threshold {
            continue;
        }

        let (cx, cy, w, h) = (column[0], column[1], column[2], column[3]);
        if w <= 0.0 || h <= 0.0 {
            continue;
        }

        let (x1, y1) = geometry.source_point(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = geometry.source_point(cx + w / 2.0, cy + h / 2.0);
        detections.push(Detection {
            class_id,
            score,
            bbox: BoundingBox {
                x1: x1.clamp(0.0, max_x),
                y1: y1.clamp(0.0, max_y),
                x2: x2.clamp(0.0, max_x),
                y2: y2.clamp(0.0, max_y),
            },
        });
    }
    detections
}

/// Class-wise NMS; output is ordered by descending score.
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32, max_detections: usize) -> Vec<Detection> {
    detections.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Detection> = Vec::new();
    for det in detections {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == det.class_id && k.bbox.iou(&det.bbox) > iou_threshold);
        if !suppressed {
            kept.push(det);
        }
    }
    kept
}
