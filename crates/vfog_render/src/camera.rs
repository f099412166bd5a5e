//! Camera Inputs and Reconstruction
//!
//! Per-frame camera data handed to the fog pipeline, and the math that turns
//! it into [`FogCameraUniforms`].
//!
//! # Near-Plane Reconstruction
//!
//! The fog raymarch rebuilds a world-space view ray per pixel from three
//! near-plane corners. The corners are unprojected with the inverse of a
//! view-projection whose view matrix has its translation removed, so they
//! are camera-relative directions rather than world positions:
//!
//! ```text
//!   top_left ──── x_extent ───►
//!      │
//!   y_extent
//!      │
//!      ▼
//! ```
//!
//! The near-plane NDC depth is obtained by projecting the view-space point
//! `(0, 0, -near)`, which keeps the corners correct for both standard and
//! reverse-Z projections.

use glam::{Mat4, Vec3, Vec4};
use smallvec::SmallVec;
use vfog_core::{FogError, Result};
use vfog_resources::{FogCameraUniforms, MAX_EYES};

/// Role of the camera rendering the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CameraKind {
    #[default]
    Game,
    /// Editor scene view.
    SceneView,
    /// Thumbnail / asset preview camera.
    Preview,
    /// Planar reflection or reflection-capture camera.
    Reflection,
}

impl CameraKind {
    /// Whether fog is rendered for this camera kind at all.
    #[inline]
    #[must_use]
    pub fn renders_fog(self) -> bool {
        matches!(self, Self::Game | Self::SceneView)
    }
}

/// Size and format of the camera's color target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraTargetDesc {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    /// 1 for mono, 2 for stereo.
    pub eye_count: u32,
}

impl CameraTargetDesc {
    #[must_use]
    pub fn new(width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            eye_count: 1,
        }
    }

    #[must_use]
    pub fn with_eye_count(mut self, eye_count: u32) -> Self {
        self.eye_count = eye_count;
        self
    }

    /// Describes an existing color texture.
    #[must_use]
    pub fn from_texture(texture: &wgpu::Texture) -> Self {
        let size = texture.size();
        Self::new(size.width, size.height, texture.format())
    }

    #[inline]
    #[must_use]
    pub fn full_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Half-resolution extent, `floor(size / 2)` clamped to one texel.
    #[inline]
    #[must_use]
    pub fn half_size(&self) -> (u32, u32) {
        ((self.width / 2).max(1), (self.height / 2).max(1))
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FogError::InvalidTarget {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// View and projection of one eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeView {
    /// World-to-view matrix.
    pub view: Mat4,
    pub projection: Mat4,
}

impl EyeView {
    #[must_use]
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self { view, projection }
    }
}

/// Everything the pipeline needs from the host for one frame.
pub struct FogFrame<'a> {
    pub kind: CameraKind,
    /// Camera color target. Needs `COPY_SRC | RENDER_ATTACHMENT` usage.
    pub color_target: &'a wgpu::Texture,
    /// Full-resolution scene depth, bound as unfilterable float. Views of
    /// combined depth-stencil formats must select the depth aspect.
    pub depth_view: &'a wgpu::TextureView,
    pub eyes: SmallVec<[EyeView; MAX_EYES]>,
    pub near: f32,
    /// Seconds since start, used for noise scrolling.
    pub time: f32,
}

impl<'a> FogFrame<'a> {
    /// Mono frame for a single view.
    #[must_use]
    pub fn new(
        kind: CameraKind,
        color_target: &'a wgpu::Texture,
        depth_view: &'a wgpu::TextureView,
        eye: EyeView,
        near: f32,
    ) -> Self {
        Self {
            kind,
            color_target,
            depth_view,
            eyes: smallvec::smallvec![eye],
            near,
            time: 0.0,
        }
    }

    #[must_use]
    pub fn with_time(mut self, time: f32) -> Self {
        self.time = time;
        self
    }

    /// Adds a second eye.
    #[must_use]
    pub fn with_eye(mut self, eye: EyeView) -> Self {
        self.eyes.push(eye);
        self
    }

    #[inline]
    #[must_use]
    pub fn target_size(&self) -> (u32, u32) {
        let size = self.color_target.size();
        (size.width, size.height)
    }
}

/// Camera-relative near-plane corners of one eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearPlaneCorners {
    pub top_left: Vec3,
    /// Top-right minus top-left.
    pub x_extent: Vec3,
    /// Bottom-left minus top-left.
    pub y_extent: Vec3,
}

/// Unprojects the near-plane corners of `eye` with its translation removed.
#[must_use]
pub fn near_plane_corners(eye: &EyeView, near: f32) -> NearPlaneCorners {
    let mut rotation_only = eye.view;
    rotation_only.w_axis = Vec4::W;

    let inverse = (eye.projection * rotation_only).inverse();

    let clip = eye.projection * Vec4::new(0.0, 0.0, -near, 1.0);
    let ndc_z = clip.z / clip.w;

    let top_left = inverse.project_point3(Vec3::new(-1.0, 1.0, ndc_z));
    let top_right = inverse.project_point3(Vec3::new(1.0, 1.0, ndc_z));
    let bottom_left = inverse.project_point3(Vec3::new(-1.0, -1.0, ndc_z));

    NearPlaneCorners {
        top_left,
        x_extent: top_right - top_left,
        y_extent: bottom_left - top_left,
    }
}

/// Builds the camera uniform block for up to [`MAX_EYES`] eyes.
pub fn build_camera_uniforms(eyes: &[EyeView], near: f32, time: f32) -> Result<FogCameraUniforms> {
    if eyes.is_empty() {
        return Err(FogError::InvalidCamera("camera has no eyes".into()));
    }
    if near.is_nan() || near <= 0.0 {
        return Err(FogError::InvalidCamera(format!(
            "near clip must be positive, got {near}"
        )));
    }
    if eyes.len() > MAX_EYES {
        log::warn!(
            "Camera reports {} eyes; only the first {MAX_EYES} receive fog",
            eyes.len()
        );
    }

    let mut uniforms = FogCameraUniforms::default();
    uniforms.projection_params = Vec4::new(1.0 / near, 0.0, 0.0, 0.0);
    uniforms.time = time;

    let eye_count = eyes.len().min(MAX_EYES);
    for (index, eye) in eyes.iter().take(eye_count).enumerate() {
        let corners = near_plane_corners(eye, near);
        uniforms.view_projections[index] = eye.projection * eye.view;
        uniforms.top_left[index] = corners.top_left.extend(0.0);
        uniforms.x_extent[index] = corners.x_extent.extend(0.0);
        uniforms.y_extent[index] = corners.y_extent.extend(0.0);
        uniforms.positions[index] = eye.view.inverse().w_axis.truncate().extend(0.0);
    }
    uniforms.eye_count = eye_count as u32;

    Ok(uniforms)
}
