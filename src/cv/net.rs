use crate::conf::DetectionConf;
use crate::cv::tensor::TensorView;
use anyhow::{Context, Result, anyhow};
use log::{debug, error, info};
use opencv::core::{self, CV_32F, Mat, Rect, Scalar, Size, Vector};
use opencv::dnn;
use opencv::prelude::*;
use std::path::Path;
use std::time::Instant;

/// COCO class id of "person".
pub const PERSON_CLASS: usize = 0;

/// Grey used by the model's own letterboxing.
const PAD_VALUE: f64 = 114.;

/// A detected person in model input pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

pub trait PersonDetector<F> {
    fn detect_people(&mut self, frame: &F) -> Result<Vec<BoundingBox>>;

    fn count_people(&mut self, frame: &F) -> Result<usize> {
        Ok(self.detect_people(frame)?.len())
    }
}

/// YOLOv8 style ONNX model run through the OpenCV DNN module.
pub struct YoloPersonDetector {
    net: dnn::Net,
    settings: DetectionConf,
}

impl YoloPersonDetector {
    pub fn new(model: &Path, settings: DetectionConf) -> Result<Self> {
        let path = model.to_str().context("Invalid model path")?;
        debug!("Loading detection model from '{}'", path);
        let start_time = Instant::now();

        let net = match dnn::read_net_from_onnx(path) {
            Ok(net) => {
                info!(
                    "Detection model loaded successfully in {:?}",
                    start_time.elapsed()
                );
                net
            }
            Err(e) => {
                error!("Failed to load detection model: {}", e);
                return Err(e).with_context(|| format!("Failed to load model {}", path));
            }
        };

        Ok(Self { net, settings })
    }
}

/// Pads `frame` at the bottom and right with grey so it becomes square.
pub fn pad_to_square(frame: &Mat) -> Result<Mat> {
    let size = frame.size()?;
    let edge = size.width.max(size.height);
    debug!(
        "Padding {}x{} frame to {}x{}",
        size.width, size.height, edge, edge
    );

    let mut square = Mat::default();
    core::copy_make_border(
        frame,
        &mut square,
        0,
        edge - size.height,
        0,
        edge - size.width,
        core::BORDER_CONSTANT,
        Scalar::all(PAD_VALUE),
    )?;
    Ok(square)
}

/// Scales a square BGR image into a `[1, 3, input, input]` RGB blob in `[0, 1]`.
pub fn blob_from_square(square: &Mat, input: i32) -> Result<Mat> {
    let blob = dnn::blob_from_image(
        square,
        1.0 / 255.0,
        Size::new(input, input),
        Scalar::default(),
        true,
        false,
        CV_32F,
    )?;
    Ok(blob)
}

impl PersonDetector<Mat> for YoloPersonDetector {
    fn detect_people(&mut self, frame: &Mat) -> Result<Vec<BoundingBox>> {
        let process_start = Instant::now();

        let square = pad_to_square(frame)?;
        let blob = blob_from_square(&square, self.settings.input_size)?;
        self.net.set_input_def(&blob)?;
        let output = self.net.forward_single_def()?;
        debug!("Forward pass completed in {:?}", process_start.elapsed());

        let view = TensorView::from_mat(&output)?;
        let candidates = person_candidates(&view, self.settings.confidence)?;
        debug!("Found {} person candidates", candidates.len());

        let people = suppress_overlaps(&candidates, self.settings.confidence, self.settings.iou)?;

        info!(
            "Frame processing complete: found {} people in {:?}",
            people.len(),
            process_start.elapsed()
        );
        Ok(people)
    }
}

/// Decodes a `[1, 4 + classes, anchors]` output into person boxes.
///
/// An anchor counts only when person is its best class and the score is
/// above `confidence`.
pub fn person_candidates(output: &TensorView, confidence: f32) -> Result<Vec<BoundingBox>> {
    let dims = output.dims();
    if dims.len() != 3 || dims[0] != 1 || dims[1] <= 4 + PERSON_CLASS {
        return Err(anyhow!("Invalid model output shape {:?}", dims));
    }
    let (attributes, anchors) = (dims[1], dims[2]);

    let mut candidates = Vec::new();
    for i in 0..anchors {
        let mut best_class = 0;
        let mut best_score = f32::MIN;
        for class in 0..attributes - 4 {
            let score = output.get(&[0, 4 + class, i])?;
            if score > best_score {
                best_class = class;
                best_score = score;
            }
        }

        if best_class != PERSON_CLASS || best_score <= confidence {
            continue;
        }

        let cx = output.get(&[0, 0, i])?;
        let cy = output.get(&[0, 1, i])?;
        let width = output.get(&[0, 2, i])?;
        let height = output.get(&[0, 3, i])?;

        candidates.push(BoundingBox {
            x: cx - width / 2.,
            y: cy - height / 2.,
            width,
            height,
            confidence: best_score,
        });
    }

    Ok(candidates)
}

fn suppress_overlaps(
    candidates: &[BoundingBox],
    confidence: f32,
    iou: f32,
) -> Result<Vec<BoundingBox>> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let rects: Vector<Rect> = candidates
        .iter()
        .map(|b| {
            Rect::new(
                b.x.round() as i32,
                b.y.round() as i32,
                b.width.round() as i32,
                b.height.round() as i32,
            )
        })
        .collect();
    let scores: Vector<f32> = candidates.iter().map(|b| b.confidence).collect();

    let mut keep = Vector::<i32>::new();
    dnn::nms_boxes_def(&rects, &scores, confidence, iou, &mut keep)?;

    Ok(keep
        .iter()
        .filter_map(|idx| usize::try_from(idx).ok())
        .filter_map(|idx| candidates.get(idx).copied())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lays out `[cx, cy, w, h, person, other]` per anchor as `[1, 6, anchors]`.
    fn output(anchors: &[[f32; 6]]) -> Vec<f32> {
        let mut data = vec![0.; 6 * anchors.len()];
        for (i, anchor) in anchors.iter().enumerate() {
            for (row, value) in anchor.iter().enumerate() {
                data[row * anchors.len() + i] = *value;
            }
        }
        data
    }

    #[test]
    fn keeps_confident_people_only() {
        let data = output(&[
            [100., 200., 40., 80., 0.9, 0.1],
            [300., 300., 50., 50., 0.3, 0.8],
            [400., 100., 20., 20., 0.1, 0.0],
        ]);
        let view = TensorView::new(&[1, 6, 3], &data).unwrap();

        let people = person_candidates(&view, 0.25).unwrap();

        assert_eq!(
            people,
            vec![BoundingBox {
                x: 80.,
                y: 160.,
                width: 40.,
                height: 80.,
                confidence: 0.9,
            }]
        );
    }

    #[test]
    fn threshold_is_exclusive() {
        let data = output(&[[10., 10., 4., 4., 0.25, 0.0]]);
        let view = TensorView::new(&[1, 6, 1], &data).unwrap();

        assert!(person_candidates(&view, 0.25).unwrap().is_empty());
    }

    #[test]
    fn empty_output_yields_nobody() {
        let data = output(&[[10., 10., 4., 4., 0.01, 0.02]; 4]);
        let view = TensorView::new(&[1, 6, 4], &data).unwrap();

        assert!(person_candidates(&view, 0.25).unwrap().is_empty());
        assert!(suppress_overlaps(&[], 0.25, 0.7).unwrap().is_empty());
    }

    #[test]
    fn rejects_unexpected_shape() {
        let data = [0f32; 12];
        let view = TensorView::new(&[1, 4, 3], &data).unwrap();
        assert!(person_candidates(&view, 0.25).is_err());

        let view = TensorView::new(&[12], &data).unwrap();
        assert!(person_candidates(&view, 0.25).is_err());
    }

    #[test]
    fn landscape_frame_is_padded_below() {
        let frame =
            Mat::new_rows_cols_with_default(480, 640, core::CV_8UC3, Scalar::all(0.)).unwrap();

        let square = pad_to_square(&frame).unwrap();

        assert_eq!(square.rows(), 640);
        assert_eq!(square.cols(), 640);
        assert_eq!(square.at_2d::<core::Vec3b>(100, 100).unwrap().0, [0, 0, 0]);
        assert_eq!(square.at_2d::<core::Vec3b>(479, 639).unwrap().0, [0, 0, 0]);
        assert_eq!(square.at_2d::<core::Vec3b>(480, 0).unwrap().0, [114, 114, 114]);
        assert_eq!(square.at_2d::<core::Vec3b>(639, 639).unwrap().0, [114, 114, 114]);
    }

    #[test]
    fn portrait_frame_is_padded_right() {
        let frame =
            Mat::new_rows_cols_with_default(300, 200, core::CV_8UC3, Scalar::all(10.)).unwrap();

        let square = pad_to_square(&frame).unwrap();

        assert_eq!((square.rows(), square.cols()), (300, 300));
        assert_eq!(square.at_2d::<core::Vec3b>(299, 199).unwrap().0, [10, 10, 10]);
        assert_eq!(square.at_2d::<core::Vec3b>(0, 200).unwrap().0, [114, 114, 114]);
    }

    #[test]
    fn blob_has_model_input_shape() {
        let frame =
            Mat::new_rows_cols_with_default(480, 640, core::CV_8UC3, Scalar::all(255.)).unwrap();
        let square = pad_to_square(&frame).unwrap();

        let blob = blob_from_square(&square, 640).unwrap();

        assert_eq!(blob.mat_size().to_vec(), vec![1, 3, 640, 640]);
        let view = TensorView::from_mat(&blob).unwrap();
        assert!((view.get(&[0, 0, 0, 0]).unwrap() - 1.).abs() < 1e-6);
        assert!((view.get(&[0, 0, 639, 0]).unwrap() - 114. / 255.).abs() < 1e-6);
    }

    #[test]
    fn overlapping_boxes_collapse() {
        let candidates = [
            BoundingBox { x: 10., y: 10., width: 100., height: 200., confidence: 0.9 },
            BoundingBox { x: 12., y: 11., width: 100., height: 200., confidence: 0.6 },
            BoundingBox { x: 400., y: 10., width: 100., height: 200., confidence: 0.5 },
        ];

        let people = suppress_overlaps(&candidates, 0.25, 0.7).unwrap();

        assert_eq!(people.len(), 2);
        assert!(people.contains(&candidates[0]));
        assert!(people.contains(&candidates[2]));
    }
}
