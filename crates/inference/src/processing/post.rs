use crate::error::PipelineError;
use ndarray::{Array2, Array3, ArrayView3, ArrayViewD, Axis, Ix4, Zip, s};

/// Classes of the CIHP human-parsing label set.
pub const NUM_PARSING_CLASSES: usize = 20;

/// Left/right part channels that trade places when the image is mirrored
/// (arms, legs, shoes). Channels 0..14 have no side.
pub const CIHP_MIRROR_PAIRS: [(usize, usize); 3] = [(14, 15), (16, 17), (18, 19)];

/// Swap the left/right channels of a `[20, H, W]` parsing output.
pub fn flip_cihp(logits: &ArrayView3<f32>) -> Result<Array3<f32>, PipelineError> {
    if logits.shape()[0] != NUM_PARSING_CLASSES {
        return Err(PipelineError::shape("[20, H, W]", logits.shape()));
    }

    let mut swapped = logits.to_owned();
    for (left, right) in CIHP_MIRROR_PAIRS {
        swapped
            .index_axis_mut(Axis(0), left)
            .assign(&logits.index_axis(Axis(0), right));
        swapped
            .index_axis_mut(Axis(0), right)
            .assign(&logits.index_axis(Axis(0), left));
    }
    Ok(swapped)
}

/// Reverse the width axis of a `[C, H, W]` tensor. The result is in standard layout.
pub fn flip_horizontal(x: &ArrayView3<f32>) -> Array3<f32> {
    x.slice(s![.., .., ..;-1]).as_standard_layout().into_owned()
}

/// Average the prediction on the original image with the un-mirrored
/// prediction on the flipped image.
///
/// `output` is the raw `[2, 20, H, W]` network output for a batch of
/// (original, mirrored).
pub fn fuse_flipped(output: &ArrayViewD<f32>) -> Result<Array3<f32>, PipelineError> {
    let output = output
        .view()
        .into_dimensionality::<Ix4>()
        .map_err(|_| PipelineError::shape("[2, 20, H, W]", output.shape()))?;
    if output.shape()[0] != 2 {
        return Err(PipelineError::shape("[2, 20, H, W]", output.shape()));
    }

    let original = output.index_axis(Axis(0), 0);
    let mirrored = output.index_axis(Axis(0), 1);
    let restored = flip_horizontal(&flip_cihp(&mirrored)?.view());

    Ok((&original + &restored) / 2.0)
}

/// Bilinear resize of a `[C, h, w]` tensor with corner pixels aligned.
pub fn upsample_bilinear(x: &ArrayView3<f32>, size: (usize, usize)) -> Array3<f32> {
    let (channels, in_h, in_w) = x.dim();
    let (out_h, out_w) = size;
    if (in_h, in_w) == (out_h, out_w) {
        return x.to_owned();
    }

    let ys: Vec<_> = (0..out_h).map(|o| source_coord(o, in_h, out_h)).collect();
    let xs: Vec<_> = (0..out_w).map(|o| source_coord(o, in_w, out_w)).collect();

    let mut out = Array3::<f32>::zeros((channels, out_h, out_w));
    for c in 0..channels {
        let plane = x.index_axis(Axis(0), c);
        let mut dst = out.index_axis_mut(Axis(0), c);
        for (oy, &(y0, y1, wy)) in ys.iter().enumerate() {
            for (ox, &(x0, x1, wx)) in xs.iter().enumerate() {
                let top = plane[[y0, x0]] * (1.0 - wx) + plane[[y0, x1]] * wx;
                let bottom = plane[[y1, x0]] * (1.0 - wx) + plane[[y1, x1]] * wx;
                dst[[oy, ox]] = top * (1.0 - wy) + bottom * wy;
            }
        }
    }
    out
}

/// (lower index, upper index, upper weight) for an align-corners sample.
#[inline]
fn source_coord(out_idx: usize, in_len: usize, out_len: usize) -> (usize, usize, f32) {
    if out_len <= 1 || in_len <= 1 {
        return (0, 0, 0.0);
    }
    let src = out_idx as f32 * (in_len - 1) as f32 / (out_len - 1) as f32;
    let lower = (src.floor() as usize).min(in_len - 1);
    let upper = (lower + 1).min(in_len - 1);
    (lower, upper, src - lower as f32)
}

/// Sums fused per-scale logits at the resolution of the first scale.
#[derive(Debug)]
pub struct MultiScaleAccumulator {
    reference: (usize, usize),
    sum: Option<Array3<f32>>,
    scales_seen: usize,
}

impl MultiScaleAccumulator {
    /// `reference` is `(height, width)` of the first pyramid level.
    pub fn new(reference: (usize, usize)) -> Self {
        Self {
            reference,
            sum: None,
            scales_seen: 0,
        }
    }

    pub fn add(&mut self, fused: &ArrayView3<f32>) -> Result<(), PipelineError> {
        let resized = upsample_bilinear(fused, self.reference);
        match self.sum.as_mut() {
            Some(sum) => {
                if sum.shape()[0] != resized.shape()[0] {
                    return Err(PipelineError::shape(
                        "same class count at every scale",
                        resized.shape(),
                    ));
                }
                *sum += &resized;
            }
            None => self.sum = Some(resized),
        }
        self.scales_seen += 1;
        Ok(())
    }

    pub fn scales_seen(&self) -> usize {
        self.scales_seen
    }

    pub fn finish(self) -> Option<Array3<f32>> {
        self.sum
    }
}

/// Per-pixel class with the highest score; ties keep the lowest class.
pub fn argmax_labels(logits: &ArrayView3<f32>) -> Array2<u8> {
    let (_, height, width) = logits.dim();
    let mut best = Array2::<f32>::from_elem((height, width), f32::NEG_INFINITY);
    let mut labels = Array2::<u8>::zeros((height, width));

    for (class, plane) in logits.axis_iter(Axis(0)).enumerate() {
        Zip::from(&mut labels)
            .and(&mut best)
            .and(&plane)
            .for_each(|label, best, &score| {
                if score > *best {
                    *best = score;
                    *label = class as u8;
                }
            });
    }
    labels
}

/// Index of the largest logit of a `[1, N]` (or `[N]`) classifier output.
pub fn top1(logits: &ArrayViewD<f32>) -> Result<usize, PipelineError> {
    let scores = class_scores(logits)?;
    let mut best = (0usize, f32::NEG_INFINITY);
    for (i, &v) in scores.iter().enumerate() {
        if v > best.1 {
            best = (i, v);
        }
    }
    Ok(best.0)
}

/// The `k` most probable classes after softmax, best first.
pub fn softmax_top_k(
    logits: &ArrayViewD<f32>,
    k: usize,
) -> Result<Vec<(usize, f32)>, PipelineError> {
    let scores = class_scores(logits)?;
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp: Vec<f32> = scores.iter().map(|v| (v - max).exp()).collect();
    let total: f32 = exp.iter().sum();

    let mut ranked: Vec<(usize, f32)> = exp.into_iter().map(|e| e / total).enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(k);
    Ok(ranked)
}

fn class_scores(logits: &ArrayViewD<f32>) -> Result<Vec<f32>, PipelineError> {
    let batch_one = match logits.ndim() {
        1 => true,
        2 => logits.shape()[0] == 1,
        _ => false,
    };
    if !batch_one || logits.is_empty() {
        return Err(PipelineError::shape("[1, N]", logits.shape()));
    }
    Ok(logits.iter().copied().collect())
}
