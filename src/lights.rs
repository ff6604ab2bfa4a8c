use bytemuck::Zeroable;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::blocks::{
    BlockBuffer, DirLightRecord, PntLightRecord, LIGHT_BLOCK_SIZE, LIGHT_COUNT_OFFSET,
    LIGHT_RECORD_STRIDE, MAX_LIGHTS,
};

/// Light shining in one direction from infinitely far away.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub intensity: f32,
}

/// Distance falloff factors for a point light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

/// Light radiating from a position in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub attenuation: Attenuation,
    pub intensity: f32,
}

/// Bounded light collections and the two device blocks they publish into.
///
/// Collections beyond [`MAX_LIGHTS`] are truncated at publish time; that is
/// a declared capacity boundary, not an error. The scene has no dynamic
/// lights, so `publish` runs once after setup.
#[derive(Debug, Clone)]
pub struct LightRegistry {
    directional: Vec<DirectionalLight>,
    point: Vec<PointLight>,
    dir_block: BlockBuffer,
    pnt_block: BlockBuffer,
}

impl LightRegistry {
    pub fn new(directional: Vec<DirectionalLight>, point: Vec<PointLight>) -> Self {
        Self {
            directional,
            point,
            dir_block: BlockBuffer::allocate(LIGHT_BLOCK_SIZE),
            pnt_block: BlockBuffer::allocate(LIGHT_BLOCK_SIZE),
        }
    }

    /// The lighting rig of the built-in studio scene: one cool key light
    /// and one magenta accent point light above the desk.
    pub fn studio() -> Self {
        Self::new(
            vec![DirectionalLight {
                direction: Vec3::new(0.0, -0.8321, -0.5547),
                ambient: Vec3::new(1.0, 1.0, 1.0),
                diffuse: Vec3::new(0.0, 1.0, 1.0),
                specular: Vec3::new(1.0, 1.0, 1.0),
                intensity: 0.3,
            }],
            vec![PointLight {
                position: Vec3::new(5.0, 15.0, -5.0),
                ambient: Vec3::new(1.0, 0.2, 0.8),
                diffuse: Vec3::new(0.8, 0.2, 0.8),
                specular: Vec3::new(0.6, 0.2, 1.0),
                attenuation: Attenuation {
                    constant: 1.0,
                    linear: 0.045,
                    quadratic: 0.0075,
                },
                intensity: 1.0,
            }],
        )
    }

    pub fn directional(&self) -> &[DirectionalLight] {
        &self.directional
    }

    pub fn point(&self) -> &[PointLight] {
        &self.point
    }

    pub fn dir_block(&self) -> &BlockBuffer {
        &self.dir_block
    }

    pub fn pnt_block(&self) -> &BlockBuffer {
        &self.pnt_block
    }

    pub fn dir_block_mut(&mut self) -> &mut BlockBuffer {
        &mut self.dir_block
    }

    pub fn pnt_block_mut(&mut self) -> &mut BlockBuffer {
        &mut self.pnt_block
    }

    /// Packs both collections into their blocks: one 80-byte record per
    /// slot, zero-filled past the live count, count written at byte 640.
    pub fn publish(&mut self) {
        for slot in 0..MAX_LIGHTS {
            let record = match self.directional.get(slot) {
                Some(light) => encode_directional(light),
                None => DirLightRecord::zeroed(),
            };
            self.dir_block
                .write_range(slot * LIGHT_RECORD_STRIDE, bytemuck::bytes_of(&record));
        }
        let dir_count = self.directional.len().min(MAX_LIGHTS) as u32;
        self.dir_block
            .write_range(LIGHT_COUNT_OFFSET, &dir_count.to_ne_bytes());

        for slot in 0..MAX_LIGHTS {
            let record = match self.point.get(slot) {
                Some(light) => encode_point(light),
                None => PntLightRecord::zeroed(),
            };
            self.pnt_block
                .write_range(slot * LIGHT_RECORD_STRIDE, bytemuck::bytes_of(&record));
        }
        let pnt_count = self.point.len().min(MAX_LIGHTS) as u32;
        self.pnt_block
            .write_range(LIGHT_COUNT_OFFSET, &pnt_count.to_ne_bytes());
    }
}

fn encode_directional(light: &DirectionalLight) -> DirLightRecord {
    DirLightRecord {
        direction: pad(light.direction),
        ambient: pad(light.ambient),
        diffuse: pad(light.diffuse),
        specular: pad(light.specular),
        intensity: light.intensity,
        _pad: [0.0; 3],
    }
}

fn encode_point(light: &PointLight) -> PntLightRecord {
    PntLightRecord {
        position: pad(light.position),
        ambient: pad(light.ambient),
        diffuse: pad(light.diffuse),
        specular: pad(light.specular),
        constant: light.attenuation.constant,
        linear: light.attenuation.linear,
        quadratic: light.attenuation.quadratic,
        intensity: light.intensity,
    }
}

fn pad(v: Vec3) -> [f32; 4] {
    [v.x, v.y, v.z, 0.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_directional(intensity: f32) -> DirectionalLight {
        DirectionalLight {
            direction: Vec3::new(0.0, -1.0, 0.0),
            ambient: Vec3::ONE,
            diffuse: Vec3::ONE,
            specular: Vec3::ONE,
            intensity,
        }
    }

    fn count_in(block: &BlockBuffer) -> u32 {
        let bytes: [u8; 4] = block.bytes()[LIGHT_COUNT_OFFSET..LIGHT_COUNT_OFFSET + 4]
            .try_into()
            .unwrap();
        u32::from_ne_bytes(bytes)
    }

    #[test]
    fn publish_writes_count_and_zero_fills_unused_slots() {
        let mut rig = LightRegistry::new(
            vec![white_directional(0.5), white_directional(1.0)],
            Vec::new(),
        );
        rig.publish();

        assert_eq!(count_in(rig.dir_block()), 2);
        assert_eq!(count_in(rig.pnt_block()), 0);
        let tail = &rig.dir_block().bytes()[2 * LIGHT_RECORD_STRIDE..LIGHT_COUNT_OFFSET];
        assert!(tail.iter().all(|b| *b == 0));
    }

    #[test]
    fn publish_truncates_past_capacity() {
        let lights = (0..11).map(|i| white_directional(i as f32)).collect();
        let mut rig = LightRegistry::new(lights, Vec::new());
        rig.publish();
        assert_eq!(count_in(rig.dir_block()), 8);
    }

    #[test]
    fn records_land_at_their_stride() {
        let mut rig = LightRegistry::studio();
        rig.publish();

        let bytes = rig.pnt_block().bytes();
        let record: PntLightRecord =
            bytemuck::pod_read_unaligned(&bytes[..std::mem::size_of::<PntLightRecord>()]);
        assert_eq!(record.position, [5.0, 15.0, -5.0, 0.0]);
        assert_eq!(record.constant, 1.0);
        assert_eq!(record.quadratic, 0.0075);
    }

    #[test]
    fn publish_zero_fills_over_stale_bytes() {
        let mut rig = LightRegistry::new(vec![white_directional(1.0)], Vec::new());
        rig.dir_block_mut()
            .write_range(3 * LIGHT_RECORD_STRIDE, &[0xFF; LIGHT_RECORD_STRIDE]);
        rig.publish();

        assert_eq!(count_in(rig.dir_block()), 1);
        let slots = &rig.dir_block().bytes()[LIGHT_RECORD_STRIDE..LIGHT_COUNT_OFFSET];
        assert!(slots.iter().all(|b| *b == 0));
    }
}
