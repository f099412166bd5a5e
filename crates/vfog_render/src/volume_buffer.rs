//! Volume Storage Buffer
//!
//! Packs the frame's [`FogVolume`] snapshot into [`GpuFogVolume`] records and
//! keeps them in one read-only storage buffer.
//!
//! # Allocation Policy
//!
//! | Snapshot                 | Action                                   |
//! |--------------------------|------------------------------------------|
//! | empty                    | release any buffer, allocate nothing     |
//! | same length as before    | rewrite in place (`queue.write_buffer`)  |
//! | different length         | allocate exactly `len * 36` bytes        |
//!
//! A zero-length buffer is never created. The packed bytes are retained on
//! the CPU side and exposed through [`VolumeBuffer::contents`]; the GPU
//! buffer is also `COPY_SRC` so it can be read back.

use glam::Vec3;
use vfog_core::Tracked;
use vfog_resources::{FOG_VOLUME_STRIDE, FogVolume, GpuFogVolume};
use wgpu::util::DeviceExt;

/// What [`VolumeBuffer::stage`] decided for the GPU buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeUpload {
    /// No volumes; no buffer is bound.
    Empty,
    /// Existing buffer has the right size and is rewritten.
    Rewrite,
    /// A new buffer of `size` bytes is needed.
    Allocate { size: u64 },
}

#[derive(Debug, Default)]
pub struct VolumeBuffer {
    records: Vec<GpuFogVolume>,
    buffer: Option<Tracked<wgpu::Buffer>>,
}

impl VolumeBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Packs `volumes` in order. Volumes without a color override carry
    /// `fog_color`.
    #[must_use]
    pub fn pack(volumes: &[FogVolume], fog_color: Vec3) -> Vec<GpuFogVolume> {
        volumes
            .iter()
            .map(|volume| GpuFogVolume::from_volume(volume, fog_color))
            .collect()
    }

    /// Replaces the CPU-side records and decides the buffer action.
    pub fn stage(&mut self, volumes: &[FogVolume], fog_color: Vec3) -> VolumeUpload {
        self.records = Self::pack(volumes, fog_color);

        if self.records.is_empty() {
            return VolumeUpload::Empty;
        }

        let size = self.byte_len();
        match &self.buffer {
            Some(buffer) if buffer.size() == size => VolumeUpload::Rewrite,
            _ => VolumeUpload::Allocate { size },
        }
    }

    /// Stages `volumes` and brings the GPU buffer in line with them.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        volumes: &[FogVolume],
        fog_color: Vec3,
    ) -> VolumeUpload {
        let action = self.stage(volumes, fog_color);

        match action {
            VolumeUpload::Empty => {
                self.release_buffer();
            }
            VolumeUpload::Rewrite => {
                if let Some(buffer) = &self.buffer {
                    queue.write_buffer(buffer, 0, self.contents());
                }
            }
            VolumeUpload::Allocate { size } => {
                log::debug!("Allocating fog volume buffer: {} volumes, {size} bytes", self.records.len());
                let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("VFog Volume Buffer"),
                    contents: self.contents(),
                    usage: wgpu::BufferUsages::STORAGE
                        | wgpu::BufferUsages::COPY_DST
                        | wgpu::BufferUsages::COPY_SRC,
                });
                self.buffer = Some(Tracked::new(buffer));
            }
        }

        action
    }

    /// Bytes of the last staged snapshot, `len * 36` long.
    #[inline]
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        bytemuck::cast_slice(&self.records)
    }

    #[inline]
    #[must_use]
    pub fn records(&self) -> &[GpuFogVolume] {
        &self.records
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn buffer(&self) -> Option<&Tracked<wgpu::Buffer>> {
        self.buffer.as_ref()
    }

    /// Drops the GPU buffer and the staged records.
    pub fn release(&mut self) -> bool {
        self.records.clear();
        self.release_buffer()
    }

    fn release_buffer(&mut self) -> bool {
        match self.buffer.take() {
            Some(buffer) => {
                buffer.destroy();
                true
            }
            None => false,
        }
    }

    fn byte_len(&self) -> u64 {
        (self.records.len() * FOG_VOLUME_STRIDE) as u64
    }
}
