// conv3d — 3D sliding-window shape and padding resolution
//
// Pure geometry for any operation that slides a [kD, kH, kW] kernel over the
// spatial axes of a [N, C, D, H, W] tensor: pooling, convolution, etc.
// Each spatial axis (depth, height, width) is resolved independently — there
// is no cross-axis coupling.
//
// OUTPUT SIZE FORMULAS (per axis, effective kernel ek = (k-1)*dilation + 1):
//
//   Same:     out = ceil(in / stride)
//             total pad = (out-1)*stride + ek - in (clamped at 0),
//             split floor(total/2) top/left, remainder bottom/right
//   Explicit: out = floor((in + 2*pad - ek) / stride) + 1
//
// Geometry that cannot produce at least one window position is rejected
// before any tensor work happens.

use crate::error::{Error, Result};

/// How a sliding-window operation pads its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingMode {
    /// Output spatial size is ceil(input / stride); padding is derived so the
    /// kernel is centered, biased toward the top/left when the total is odd.
    Same,
    /// Caller-supplied symmetric padding per spatial axis [depth, height, width].
    Explicit([usize; 3]),
}

fn effective_kernel(kernel: usize, dilation: usize) -> usize {
    (kernel - 1) * dilation + 1
}

/// Resolve the output spatial size [outD, outH, outW] for a sliding-window
/// operation over input spatial dims [D, H, W].
pub fn output_size(
    input: [usize; 3],
    kernel: [usize; 3],
    stride: [usize; 3],
    dilation: [usize; 3],
    mode: &PaddingMode,
) -> Result<[usize; 3]> {
    let mut out = [0usize; 3];
    for axis in 0..3 {
        let (i, k, s, d) = (input[axis], kernel[axis], stride[axis], dilation[axis]);
        if k == 0 || s == 0 || d == 0 {
            return Err(Error::NonPositiveWindow {
                axis,
                kernel: k,
                stride: s,
            });
        }
        let ek = effective_kernel(k, d);
        out[axis] = match mode {
            PaddingMode::Same => (i + s - 1) / s,
            PaddingMode::Explicit(pad) => {
                let padded = i + 2 * pad[axis];
                if ek > padded {
                    return Err(Error::KernelTooLarge {
                        axis,
                        kernel: ek,
                        padded,
                    });
                }
                (padded - ek) / s + 1
            }
        };
        if out[axis] == 0 {
            return Err(Error::EmptyOutput {
                axis,
                input: i,
                kernel: k,
                stride: s,
            });
        }
    }
    Ok(out)
}

/// Top-left padding per spatial axis for Same mode.
///
/// The total padding needed on an axis is (out-1)*stride + ek - in; the
/// top/left side receives floor(total / 2), so an odd total biases toward the
/// bottom/right receiving the extra element.
///
/// A zero kernel, stride, or dilation on any axis is rejected, same as in
/// [`output_size`].
pub fn same_mode_top_left_padding(
    out: [usize; 3],
    input: [usize; 3],
    kernel: [usize; 3],
    stride: [usize; 3],
    dilation: [usize; 3],
) -> Result<[usize; 3]> {
    let mut pad = [0usize; 3];
    for axis in 0..3 {
        let (k, s, d) = (kernel[axis], stride[axis], dilation[axis]);
        if k == 0 || s == 0 || d == 0 {
            return Err(Error::NonPositiveWindow {
                axis,
                kernel: k,
                stride: s,
            });
        }
        let ek = effective_kernel(k, d);
        let span = (out[axis] - 1) * s + ek;
        let total = span.saturating_sub(input[axis]);
        pad[axis] = total / 2;
    }
    Ok(pad)
}
