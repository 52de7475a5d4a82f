//! Screen-space projection of exclusion volumes
//!
//! Normalized screen coordinates have their origin at the bottom-left and
//! span `[0,1]` across the viewport. Mask images are stored top row first,
//! the same layout as the GPU mask texture.

use super::{ExclusionVolume, ExclusionVolumeSet};
use crate::camera::FogCamera;
use glam::Vec2;

/// Mask value where fog is fully visible
pub const MASK_VISIBLE: u8 = u8::MAX;
/// Mask value inside an exclusion zone
pub const MASK_EXCLUDED: u8 = 0;

/// Axis-aligned rectangle in normalized screen coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl ScreenRect {
    pub fn area(&self) -> f32 {
        let size = (self.max - self.min).max(Vec2::ZERO);
        size.x * size.y
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x < self.max.x
            && point.y >= self.min.y
            && point.y < self.max.y
    }

    /// `[min.x, min.y, max.x, max.y]`, the per-instance layout of the mask pass
    pub fn to_array(&self) -> [f32; 4] {
        [self.min.x, self.min.y, self.max.x, self.max.y]
    }
}

/// Screen rectangle covered by `volume`, or `None` if it excludes nothing
///
/// Corners behind the camera are ignored; the rectangle spans the projected
/// corners in front of it, clamped to the screen. A volume with no corner in
/// front, or whose clamped rectangle has no area, yields `None`.
pub fn project_volume(volume: &ExclusionVolume, camera: &FogCamera) -> Option<ScreenRect> {
    let mut min = Vec2::splat(f32::INFINITY);
    let mut max = Vec2::splat(f32::NEG_INFINITY);
    let mut any_visible = false;

    for corner in volume.bounds.corners() {
        if camera.view_depth(corner) <= 0.0 {
            continue;
        }
        let screen = camera.world_to_screen(corner);
        min = min.min(screen);
        max = max.max(screen);
        any_visible = true;
    }

    if !any_visible {
        return None;
    }

    let min = min.max(Vec2::ZERO);
    let max = max.min(Vec2::ONE);
    if min.x < max.x && min.y < max.y {
        Some(ScreenRect { min, max })
    } else {
        None
    }
}

/// Projected rectangles of every volume that excludes something, in set order
pub fn screen_rects(volumes: &ExclusionVolumeSet, camera: &FogCamera) -> Vec<ScreenRect> {
    volumes.iter().filter_map(|v| project_volume(v, camera)).collect()
}

/// Single-channel fog visibility image
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ExclusionMask {
    /// A mask cleared to fully visible
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![MASK_VISIBLE; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Texel at column `x`, row `y` (row 0 is the top of the screen), `None`
    /// outside the mask
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y as usize * self.width as usize + x as usize).copied()
    }

    pub fn excluded_pixel_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != MASK_VISIBLE).count()
    }

    /// Mark every pixel whose center falls inside `rect` as excluded
    pub fn stamp(&mut self, rect: &ScreenRect) {
        let (w, h) = (self.width as f32, self.height as f32);
        // Pixel-center coverage, rows flipped from screen space
        let x0 = ((rect.min.x * w - 0.5).ceil().max(0.0)) as u32;
        let x1 = ((rect.max.x * w - 0.5).ceil().min(w)) as u32;
        let y0 = (((1.0 - rect.max.y) * h - 0.5).ceil().max(0.0)) as u32;
        let y1 = (((1.0 - rect.min.y) * h - 0.5).ceil().min(h)) as u32;

        for y in y0..y1 {
            let row = y as usize * self.width as usize;
            for x in x0..x1 {
                self.data[row + x as usize] = MASK_EXCLUDED;
            }
        }
    }

    /// Mask value in `[0,1]` at texture coordinate `uv` (origin top-left), clamped to edge
    pub fn sample(&self, uv: Vec2) -> f32 {
        if self.width == 0 || self.height == 0 {
            return 1.0;
        }
        let x = ((uv.x * self.width as f32).floor() as i64).clamp(0, self.width as i64 - 1);
        let y = ((uv.y * self.height as f32).floor() as i64).clamp(0, self.height as i64 - 1);
        let texel = self.get(x as u32, y as u32).unwrap_or(MASK_VISIBLE);
        texel as f32 / MASK_VISIBLE as f32
    }

    /// Smoothed fog visibility at `uv`
    ///
    /// Averages a 3x3 tap kernel spread `smoothing` UV units around `uv` and
    /// eases the result; zero smoothing reads a single tap for a hard edge.
    /// The composite shader evaluates the same kernel.
    pub fn visibility(&self, uv: Vec2, smoothing: f32) -> f32 {
        if smoothing <= 0.0 {
            return self.sample(uv);
        }
        let mut sum = 0.0;
        for j in -1..=1 {
            for i in -1..=1 {
                let offset = Vec2::new(i as f32, j as f32) * smoothing;
                sum += self.sample(uv + offset);
            }
        }
        smoothstep(0.0, 1.0, sum / 9.0)
    }
}

pub(crate) fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Rasterize the exclusion mask for `camera` at `width` x `height`
///
/// The mask starts fully visible; each projected volume punches out its
/// rectangle. Overlaps simply stay excluded.
pub fn rasterize(
    volumes: &ExclusionVolumeSet,
    camera: &FogCamera,
    width: u32,
    height: u32,
) -> ExclusionMask {
    let mut mask = ExclusionMask::new(width, height);
    for rect in screen_rects(volumes, camera) {
        mask.stamp(&rect);
    }
    mask
}
