//! Low-level image processing used by depth trackers to build pyramids

use image::Luma;

use crate::frame::{valid_depth, DepthImage};

/// Image operations a backend provides to the trackers built on it
pub trait LowLevelEngine: Send + Sync {
    /// Halve a depth image, averaging each 2x2 block over its valid pixels.
    /// A block without any valid pixel stays a hole.
    fn filter_subsample_with_holes(&self, depth: &DepthImage) -> DepthImage;

    /// Depth pyramid with `levels` entries, finest (the input) first
    fn depth_pyramid(&self, depth: &DepthImage, levels: usize) -> Vec<DepthImage> {
        let mut pyramid = Vec::with_capacity(levels);
        pyramid.push(depth.clone());
        for level in 1..levels {
            let next = self.filter_subsample_with_holes(&pyramid[level - 1]);
            pyramid.push(next);
        }
        pyramid
    }
}

/// Single-threaded reference implementation
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuLowLevelEngine;

impl LowLevelEngine for CpuLowLevelEngine {
    fn filter_subsample_with_holes(&self, depth: &DepthImage) -> DepthImage {
        let width = (depth.width() / 2).max(1);
        let height = (depth.height() / 2).max(1);

        DepthImage::from_fn(width, height, |x, y| {
            let (sum, count) = [(0, 0), (1, 0), (0, 1), (1, 1)]
                .iter()
                .filter_map(|&(dx, dy)| valid_depth(depth, 2 * x + dx, 2 * y + dy))
                .fold((0.0f32, 0u32), |(sum, count), d| (sum + d, count + 1));

            if count == 0 {
                Luma([-1.0])
            } else {
                Luma([sum / count as f32])
            }
        })
    }
}
