use std::ops::Range;

use bytemuck::{Pod, Zeroable};

/// Buffer binding points shared by every shader program in the crate.
///
/// Both shading pipelines are linked against bind-group layouts built from
/// these constants, so they always observe the same buffers.
pub mod binding {
    pub const DIR_LIGHTS: u32 = 0;
    pub const PNT_LIGHTS: u32 = 1;
    pub const CAM_DATA: u32 = 2;
}

/// Camera block: view matrix, active projection matrix, world position.
pub const CAM_VIEW_OFFSET: usize = 0;
pub const CAM_PROJ_OFFSET: usize = 64;
pub const CAM_POS_OFFSET: usize = 128;
pub const CAM_BLOCK_SIZE: usize = 144;

/// Light blocks: 8 records of 80 bytes, live count at byte 640, padded to
/// 656 so the uniform struct and the buffer agree on total size.
pub const LIGHT_RECORD_STRIDE: usize = 80;
pub const MAX_LIGHTS: usize = 8;
pub const LIGHT_COUNT_OFFSET: usize = MAX_LIGHTS * LIGHT_RECORD_STRIDE;
pub const LIGHT_BLOCK_SIZE: usize = LIGHT_COUNT_OFFSET + 16;

/// One directional light as the shaders read it. Color vectors are padded
/// to 16 bytes; the trailing pad keeps the array stride at 80.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DirLightRecord {
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub intensity: f32,
    pub _pad: [f32; 3],
}

/// One point light as the shaders read it. Attenuation factors and
/// intensity exactly fill bytes 64..80.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PntLightRecord {
    pub position: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    pub intensity: f32,
}

/// CPU shadow of one fixed-size device buffer.
///
/// The buffer is zero-initialized at its final size and never resized.
/// `write_range` overwrites a sub-range and grows a single coalesced dirty
/// span; the renderer drains the span once per frame and issues one
/// device upload covering exactly those bytes. A freshly allocated block is
/// fully dirty so the first flush performs the initial full upload.
#[derive(Debug, Clone)]
pub struct BlockBuffer {
    bytes: Vec<u8>,
    dirty: Option<Range<usize>>,
}

impl BlockBuffer {
    /// Reserves a zero-filled block of exactly `size` bytes.
    pub fn allocate(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
            dirty: Some(0..size),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Full block contents, dirty or not.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Overwrites `data.len()` bytes starting at `offset` without touching
    /// the rest of the block. Writing past the end is a programming error;
    /// the block size is fixed at allocation and never renegotiated.
    pub fn write_range(&mut self, offset: usize, data: &[u8]) {
        let end = offset + data.len();
        debug_assert!(end <= self.bytes.len(), "write past end of block");
        self.bytes[offset..end].copy_from_slice(data);
        self.dirty = Some(match self.dirty.take() {
            Some(span) => span.start.min(offset)..span.end.max(end),
            None => offset..end,
        });
    }

    /// Currently dirty span, if any.
    pub fn dirty_span(&self) -> Option<Range<usize>> {
        self.dirty.clone()
    }

    /// Returns the dirty offset and bytes and marks the block clean.
    pub fn take_dirty(&mut self) -> Option<(usize, &[u8])> {
        let span = self.dirty.take()?;
        Some((span.start, &self.bytes[span]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_sizes_match_declared_stride() {
        assert_eq!(std::mem::size_of::<DirLightRecord>(), LIGHT_RECORD_STRIDE);
        assert_eq!(std::mem::size_of::<PntLightRecord>(), LIGHT_RECORD_STRIDE);
    }

    #[test]
    fn fresh_block_is_zeroed_and_fully_dirty() {
        let block = BlockBuffer::allocate(CAM_BLOCK_SIZE);
        assert_eq!(block.len(), CAM_BLOCK_SIZE);
        assert!(block.bytes().iter().all(|b| *b == 0));
        assert_eq!(block.dirty_span(), Some(0..CAM_BLOCK_SIZE));
    }

    #[test]
    fn write_range_touches_only_the_sub_range() {
        let mut block = BlockBuffer::allocate(32);
        block.take_dirty();
        block.write_range(8, &[0xAB; 4]);
        assert!(block.bytes()[..8].iter().all(|b| *b == 0));
        assert_eq!(&block.bytes()[8..12], &[0xAB; 4]);
        assert!(block.bytes()[12..].iter().all(|b| *b == 0));
    }

    #[test]
    fn dirty_spans_coalesce() {
        let mut block = BlockBuffer::allocate(144);
        block.take_dirty();
        block.write_range(128, &[1; 16]);
        block.write_range(0, &[2; 64]);
        assert_eq!(block.dirty_span(), Some(0..144));
        let (offset, bytes) = block.take_dirty().unwrap();
        assert_eq!(offset, 0);
        assert_eq!(bytes.len(), 144);
        assert!(block.dirty_span().is_none());
    }

    #[test]
    fn take_dirty_after_single_write_is_partial() {
        let mut block = BlockBuffer::allocate(CAM_BLOCK_SIZE);
        block.take_dirty();
        block.write_range(CAM_POS_OFFSET, &[7; 16]);
        let (offset, bytes) = block.take_dirty().unwrap();
        assert_eq!(offset, CAM_POS_OFFSET);
        assert_eq!(bytes, &[7; 16]);
    }

    #[test]
    fn matrix_round_trips_through_block_bytes() {
        let view = glam::Mat4::look_at_rh(
            glam::Vec3::new(0.0, 0.5, -3.0),
            glam::Vec3::new(0.0, 0.0, -2.0),
            glam::Vec3::Y,
        );
        let mut block = BlockBuffer::allocate(CAM_BLOCK_SIZE);
        block.write_range(CAM_VIEW_OFFSET, bytemuck::bytes_of(&view.to_cols_array()));
        let bytes = &block.bytes()[CAM_VIEW_OFFSET..CAM_VIEW_OFFSET + 64];
        let floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_ne_bytes(chunk.try_into().unwrap()))
            .collect();
        assert_eq!(floats, view.to_cols_array().to_vec());
    }
}
