// Subsample3d — 3D subsampling (pooling) layer
//
// Downsamples the three spatial axes of a rank-5 input [N, C, D, H, W] by
// sliding a [kD, kH, kW] window with a given stride and padding mode,
// producing [N, C, outD, outH, outW]. Max pooling takes the window maximum;
// average pooling takes the mean over the window's in-bounds elements (the
// divisor excludes padding, and the backward pass uses the same divisor).
//
// The layer is graph-free: forward and backward are direct numeric passes
// that consume the conv3d shape/padding resolver. It holds no learnable
// parameters — num_params() is 0 and params() is None by contract.
//
// BACKWARD RULES (per window, e = upstream gradient element):
//
//   Max: route e to the argmax position of the window. Forward scans with
//        strict >, so ties resolve to the first maximal element; backward
//        repeats the identical scan and lands on the same element.
//   Avg: spread e / in_bounds_count over every in-bounds window element.
//
// Overlapping windows accumulate their contributions by summation.

use marten_core::conv3d::{output_size, same_mode_top_left_padding, PaddingMode};
use marten_core::error::{Error, Result};
use marten_core::shape::Shape;
use marten_core::tensor::Tensor;

use crate::module::{Gradients, Layer};

/// How each window is reduced to one output element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolingType {
    Max,
    Avg,
}

/// 3D subsampling layer configuration. Dilation is fixed at 1 on every axis.
#[derive(Debug, Clone)]
pub struct Subsample3d {
    pooling: PoolingType,
    kernel: [usize; 3],
    stride: [usize; 3],
    padding: PaddingMode,
}

/// Resolved per-call geometry: output spatial size and top-left padding.
struct WindowGeometry {
    out: [usize; 3],
    pad: [usize; 3],
}

const DILATION: [usize; 3] = [1, 1, 1];

impl Subsample3d {
    /// Create a 3D subsampling layer.
    pub fn new(
        pooling: PoolingType,
        kernel: [usize; 3],
        stride: [usize; 3],
        padding: PaddingMode,
    ) -> Self {
        Subsample3d {
            pooling,
            kernel,
            stride,
            padding,
        }
    }

    /// The pooling type of this layer.
    pub fn pooling(&self) -> PoolingType {
        self.pooling
    }

    /// Validate the input rank and resolve output size and padding for its
    /// spatial dims. Raised errors name the offending shape.
    fn resolve(&self, input: &Tensor) -> Result<WindowGeometry> {
        if input.rank() != 5 {
            return Err(Error::RankMismatch {
                expected: 5,
                got: input.rank(),
                shape: input.shape().clone(),
            });
        }
        let dims = input.dims();
        let spatial = [dims[2], dims[3], dims[4]];
        let out = output_size(spatial, self.kernel, self.stride, DILATION, &self.padding)?;
        let pad = match self.padding {
            PaddingMode::Same => {
                same_mode_top_left_padding(out, spatial, self.kernel, self.stride, DILATION)?
            }
            PaddingMode::Explicit(pad) => pad,
        };
        Ok(WindowGeometry { out, pad })
    }

    /// Scan one window, returning (max value, argmax flat index, sum,
    /// in-bounds count). Indices are into the input's flat storage.
    #[allow(clippy::too_many_arguments)]
    fn scan_window(
        &self,
        data: &[f64],
        dims: &[usize],
        n: usize,
        c: usize,
        zo: usize,
        yo: usize,
        xo: usize,
        pad: [usize; 3],
    ) -> (f64, usize, f64, usize) {
        let (ch, d, h, w) = (dims[1], dims[2], dims[3], dims[4]);
        let [kd, kh, kw] = self.kernel;
        let [sd, sh, sw] = self.stride;
        let [pd, ph, pw] = pad;

        let mut max_val = f64::NEG_INFINITY;
        let mut max_idx = 0usize;
        let mut sum = 0.0f64;
        let mut count = 0usize;
        for kz in 0..kd {
            for ky in 0..kh {
                for kx in 0..kw {
                    let iz = (zo * sd + kz) as isize - pd as isize;
                    let iy = (yo * sh + ky) as isize - ph as isize;
                    let ix = (xo * sw + kx) as isize - pw as isize;
                    if iz >= 0
                        && iz < d as isize
                        && iy >= 0
                        && iy < h as isize
                        && ix >= 0
                        && ix < w as isize
                    {
                        let idx = (((n * ch + c) * d + iz as usize) * h + iy as usize) * w
                            + ix as usize;
                        if data[idx] > max_val {
                            max_val = data[idx];
                            max_idx = idx;
                        }
                        sum += data[idx];
                        count += 1;
                    }
                }
            }
        }
        (max_val, max_idx, sum, count)
    }
}

impl Layer for Subsample3d {
    /// Forward pass: pool each window of the rank-5 input down to one output
    /// element per (batch, channel, output position).
    fn activate(&self, input: &Tensor, _training: bool) -> Result<Tensor> {
        let geo = self.resolve(input)?;
        let dims = input.dims();
        let (batch, channels) = (dims[0], dims[1]);
        let [od, oh, ow] = geo.out;

        let data = input.data();
        let mut output = vec![0.0f64; batch * channels * od * oh * ow];

        for n in 0..batch {
            for c in 0..channels {
                for zo in 0..od {
                    for yo in 0..oh {
                        for xo in 0..ow {
                            let (max_val, _, sum, count) =
                                self.scan_window(data, dims, n, c, zo, yo, xo, geo.pad);
                            let out_idx =
                                (((n * channels + c) * od + zo) * oh + yo) * ow + xo;
                            output[out_idx] = if count == 0 {
                                0.0
                            } else {
                                match self.pooling {
                                    PoolingType::Max => max_val,
                                    PoolingType::Avg => sum / count as f64,
                                }
                            };
                        }
                    }
                }
            }
        }

        Tensor::from_vec(output, Shape::new(vec![batch, channels, od, oh, ow]))
    }

    /// Backward pass: redistribute the upstream gradient `epsilon` (shaped
    /// like this layer's output for `input`) back to an input-shaped
    /// gradient. The parameter-gradient record is empty — this layer has no
    /// learnable parameters.
    fn backprop(&self, input: &Tensor, epsilon: &Tensor) -> Result<(Gradients, Tensor)> {
        let geo = self.resolve(input)?;
        let dims = input.dims();
        let (batch, channels) = (dims[0], dims[1]);
        let [od, oh, ow] = geo.out;

        let expected = Shape::new(vec![batch, channels, od, oh, ow]);
        if epsilon.shape() != &expected {
            return Err(Error::ShapeMismatch {
                expected,
                got: epsilon.shape().clone(),
            });
        }

        let data = input.data();
        let eps = epsilon.data();
        let mut grad = vec![0.0f64; input.elem_count()];
        let (d, h, w) = (dims[2], dims[3], dims[4]);
        let [kd, kh, kw] = self.kernel;
        let [sd, sh, sw] = self.stride;
        let [pd, ph, pw] = geo.pad;

        for n in 0..batch {
            for c in 0..channels {
                for zo in 0..od {
                    for yo in 0..oh {
                        for xo in 0..ow {
                            let out_idx =
                                (((n * channels + c) * od + zo) * oh + yo) * ow + xo;
                            let e = eps[out_idx];
                            let (_, max_idx, _, count) =
                                self.scan_window(data, dims, n, c, zo, yo, xo, geo.pad);
                            if count == 0 {
                                continue;
                            }
                            match self.pooling {
                                PoolingType::Max => grad[max_idx] += e,
                                PoolingType::Avg => {
                                    let share = e / count as f64;
                                    for kz in 0..kd {
                                        for ky in 0..kh {
                                            for kx in 0..kw {
                                                let iz =
                                                    (zo * sd + kz) as isize - pd as isize;
                                                let iy =
                                                    (yo * sh + ky) as isize - ph as isize;
                                                let ix =
                                                    (xo * sw + kx) as isize - pw as isize;
                                                if iz >= 0
                                                    && iz < d as isize
                                                    && iy >= 0
                                                    && iy < h as isize
                                                    && ix >= 0
                                                    && ix < w as isize
                                                {
                                                    let idx = (((n * channels + c) * d
                                                        + iz as usize)
                                                        * h
                                                        + iy as usize)
                                                        * w
                                                        + ix as usize;
                                                    grad[idx] += share;
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }

        let grad = Tensor::from_vec(grad, input.shape().clone())?;
        Ok((Gradients::new(), grad))
    }

    // No learnable parameters: the defaults of num_params()/params()/
    // set_params()/update()/gradient() are the contract for this layer.
}
