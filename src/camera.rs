use std::time::{Duration, Instant};

use glam::{Mat4, Vec3};

use crate::blocks::{
    BlockBuffer, CAM_BLOCK_SIZE, CAM_POS_OFFSET, CAM_PROJ_OFFSET, CAM_VIEW_OFFSET,
};
use crate::input::MoveMask;

pub const MIN_SPEED: f32 = 2.5;
pub const MAX_SPEED: f32 = 5.0;
const DEFAULT_SPEED: f32 = 3.0;
const SPEED_STEP: f32 = 0.1;
const LOOK_SENSITIVITY: f32 = 0.1;
const PITCH_MIN_DEG: f32 = -90.0;
const PITCH_MAX_DEG: f32 = 89.0;
const PROJECTION_DEBOUNCE: Duration = Duration::from_millis(50);
const WORLD_UP: Vec3 = Vec3::Y;

/// Which of the two precomputed projection matrices is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Perspective,
    Orthographic,
}

/// First-person fly camera.
///
/// Owns the camera block and republishes exactly the ranges that changed:
/// the view matrix on look/move, the position on move, the projection on a
/// switch. Time never comes from a global clock; the frame driver passes a
/// monotonic `Instant` into every time-dependent operation, which keeps the
/// debounce and movement integration testable.
#[derive(Debug, Clone)]
pub struct Camera {
    block: BlockBuffer,
    position: Vec3,
    front: Vec3,
    right: Vec3,
    up: Vec3,
    yaw: f32,
    pitch: f32,
    last_cursor: Option<(f32, f32)>,
    projection: Projection,
    persp: Mat4,
    ortho: Mat4,
    view: Mat4,
    speed: f32,
    delta: f32,
    last_tick: Option<Instant>,
    last_switch: Option<Instant>,
}

impl Camera {
    /// Creates a camera at `position` facing down the negative Z axis.
    pub fn new(position: Vec3, aspect: f32) -> Self {
        let front = Vec3::new(0.0, 0.0, -1.0);
        let right = WORLD_UP.cross(front).normalize();
        let up = front.cross(right).normalize();
        let mut camera = Self {
            block: BlockBuffer::allocate(CAM_BLOCK_SIZE),
            position,
            front,
            right,
            up,
            yaw: -90.0,
            pitch: 0.0,
            last_cursor: None,
            projection: Projection::Perspective,
            persp: Mat4::perspective_rh(45.0_f32.to_radians(), aspect.max(0.01), 0.1, 150.0),
            ortho: Mat4::orthographic_rh(-30.0, 30.0, -20.0, 20.0, 0.1, 100.0),
            view: Mat4::IDENTITY,
            speed: DEFAULT_SPEED,
            delta: 0.0,
            last_tick: None,
            last_switch: None,
        };
        camera.publish_view();
        camera.publish_projection();
        camera.publish_position();
        camera
    }

    /// Advances frame time. Call exactly once per frame before any
    /// time-dependent operation; the first call yields a zero delta.
    pub fn advance(&mut self, now: Instant) {
        self.delta = match self.last_tick {
            Some(prev) => now.saturating_duration_since(prev).as_secs_f32(),
            None => 0.0,
        };
        self.last_tick = Some(now);
    }

    /// Integrates a cursor sample into yaw/pitch and republishes the view.
    ///
    /// The very first sample only records the cursor baseline; acting on it
    /// would produce a large spurious jump from wherever the platform
    /// happened to place the pointer.
    pub fn update_look(&mut self, x: f32, y: f32) {
        let Some((last_x, last_y)) = self.last_cursor.replace((x, y)) else {
            return;
        };

        self.yaw += LOOK_SENSITIVITY * (x - last_x);
        self.pitch =
            (self.pitch + LOOK_SENSITIVITY * (last_y - y)).clamp(PITCH_MIN_DEG, PITCH_MAX_DEG);

        let yaw = self.yaw.to_radians();
        let pitch = self.pitch.to_radians();
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        self.right = WORLD_UP.cross(self.front).normalize();
        self.up = self.front.cross(self.right).normalize();

        self.publish_view();
    }

    /// Displaces the camera along every direction set in `mask` and
    /// republishes position and view. Opposing bits cancel; vertical
    /// movement follows the world Y axis, not the camera's local up.
    pub fn update_position(&mut self, mask: MoveMask) {
        let step = self.speed * self.delta;
        let mut offset = Vec3::ZERO;
        if mask.contains(MoveMask::FORWARD) {
            offset += step * self.front;
        }
        if mask.contains(MoveMask::BACKWARD) {
            offset -= step * self.front;
        }
        if mask.contains(MoveMask::LEFT) {
            offset += step * self.right;
        }
        if mask.contains(MoveMask::RIGHT) {
            offset -= step * self.right;
        }
        if mask.contains(MoveMask::UP) {
            offset += step * WORLD_UP;
        }
        if mask.contains(MoveMask::DOWN) {
            offset -= step * WORLD_UP;
        }
        self.position += offset;

        self.publish_position();
        self.publish_view();
    }

    /// Adjusts cruising speed by 0.1 per scroll tick, clamped to
    /// [`MIN_SPEED`, `MAX_SPEED`].
    pub fn adjust_speed(&mut self, ticks: f32) {
        self.speed = (self.speed + SPEED_STEP * ticks).clamp(MIN_SPEED, MAX_SPEED);
    }

    /// Toggles between the perspective and orthographic projections and
    /// republishes the projection range of the block.
    ///
    /// Key repeat delivers several triggers per press, so toggles within
    /// 50 ms of the previous trigger are absorbed as no-ops.
    pub fn switch_projection(&mut self, now: Instant) {
        if let Some(prev) = self.last_switch {
            if now.saturating_duration_since(prev) < PROJECTION_DEBOUNCE {
                self.last_switch = Some(now);
                return;
            }
        }
        self.projection = match self.projection {
            Projection::Perspective => Projection::Orthographic,
            Projection::Orthographic => Projection::Perspective,
        };
        self.publish_projection();
        self.last_switch = Some(now);
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn block(&self) -> &BlockBuffer {
        &self.block
    }

    pub fn block_mut(&mut self) -> &mut BlockBuffer {
        &mut self.block
    }

    fn publish_view(&mut self) {
        self.view = Mat4::look_at_rh(self.position, self.position + self.front, self.up);
        self.block
            .write_range(CAM_VIEW_OFFSET, bytemuck::bytes_of(&self.view.to_cols_array()));
    }

    fn publish_projection(&mut self) {
        let proj = match self.projection {
            Projection::Perspective => self.persp,
            Projection::Orthographic => self.ortho,
        };
        self.block
            .write_range(CAM_PROJ_OFFSET, bytemuck::bytes_of(&proj.to_cols_array()));
    }

    fn publish_position(&mut self) {
        self.block.write_range(
            CAM_POS_OFFSET,
            bytemuck::bytes_of(&self.position.extend(0.0).to_array()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(Vec3::new(0.0, 0.5, -3.0), 800.0 / 600.0)
    }

    fn seconds(camera: &mut Camera, base: Instant, dt: f32) {
        camera.advance(base);
        camera.advance(base + Duration::from_secs_f32(dt));
    }

    #[test]
    fn first_look_sample_only_records_baseline() {
        let mut cam = camera();
        cam.update_look(512.0, 97.0);
        assert_eq!(cam.yaw(), -90.0);
        assert_eq!(cam.pitch(), 0.0);
    }

    #[test]
    fn pitch_stays_clamped_for_any_input() {
        let mut cam = camera();
        cam.update_look(0.0, 0.0);
        cam.update_look(0.0, -100_000.0);
        assert_eq!(cam.pitch(), 89.0);
        cam.update_look(0.0, 200_000.0);
        assert_eq!(cam.pitch(), -90.0);
        for y in [-5.0, 17.0, -123.4, 9999.0] {
            cam.update_look(3.0, y);
            assert!(cam.pitch() >= -90.0 && cam.pitch() <= 89.0);
        }
    }

    #[test]
    fn basis_stays_orthonormal_after_look_updates() {
        let mut cam = camera();
        cam.update_look(400.0, 300.0);
        for (x, y) in [(410.0, 290.0), (300.0, 500.0), (1024.0, 0.0), (0.0, 768.0)] {
            cam.update_look(x, y);
            assert!(cam.front().is_normalized());
            assert!(cam.right().is_normalized());
            assert!(cam.up().is_normalized());
            assert!(cam.front().dot(cam.right()).abs() < 1e-5);
            assert!(cam.front().dot(cam.up()).abs() < 1e-5);
            assert!(cam.right().dot(cam.up()).abs() < 1e-5);
        }
    }

    #[test]
    fn empty_mask_leaves_position_unchanged() {
        let mut cam = camera();
        let start = cam.position();
        seconds(&mut cam, Instant::now(), 1.0);
        cam.update_position(MoveMask::empty());
        assert_eq!(cam.position(), start);
    }

    #[test]
    fn opposing_bits_cancel() {
        let mut cam = camera();
        let start = cam.position();
        seconds(&mut cam, Instant::now(), 1.0);
        cam.update_position(MoveMask::FORWARD | MoveMask::BACKWARD);
        assert_eq!(cam.position(), start);
    }

    #[test]
    fn forward_moves_along_front_by_speed_times_delta() {
        let mut cam = camera();
        let start = cam.position();
        seconds(&mut cam, Instant::now(), 2.0);
        cam.update_position(MoveMask::FORWARD);
        let expected = start + cam.speed() * 2.0 * cam.front();
        assert!((cam.position() - expected).length() < 1e-4);
    }

    #[test]
    fn vertical_movement_follows_world_up() {
        let mut cam = camera();
        cam.update_look(0.0, 0.0);
        cam.update_look(50.0, -400.0); // pitch the camera well away from level
        let start = cam.position();
        seconds(&mut cam, Instant::now(), 1.0);
        cam.update_position(MoveMask::UP);
        let moved = cam.position() - start;
        assert!(moved.x.abs() < 1e-6 && moved.z.abs() < 1e-6);
        assert!((moved.y - cam.speed()).abs() < 1e-4);
    }

    #[test]
    fn speed_clamps_at_both_ends() {
        let mut cam = camera();
        for _ in 0..100 {
            cam.adjust_speed(1.0);
        }
        assert_eq!(cam.speed(), MAX_SPEED);
        for _ in 0..100 {
            cam.adjust_speed(-1.0);
        }
        assert_eq!(cam.speed(), MIN_SPEED);
    }

    #[test]
    fn projection_switch_debounces_within_50ms() {
        let mut cam = camera();
        let base = Instant::now();
        cam.switch_projection(base);
        assert_eq!(cam.projection(), Projection::Orthographic);
        cam.switch_projection(base + Duration::from_millis(30));
        assert_eq!(cam.projection(), Projection::Orthographic);
        cam.switch_projection(base + Duration::from_millis(130));
        assert_eq!(cam.projection(), Projection::Perspective);
    }

    #[test]
    fn projection_switch_100ms_apart_toggles_twice() {
        let mut cam = camera();
        let base = Instant::now();
        cam.switch_projection(base);
        cam.switch_projection(base + Duration::from_millis(100));
        assert_eq!(cam.projection(), Projection::Perspective);
    }

    #[test]
    fn view_matrix_round_trips_through_the_block() {
        let mut cam = camera();
        cam.update_look(0.0, 0.0);
        cam.update_look(250.0, 125.0);
        let bytes = &cam.block().bytes()[CAM_VIEW_OFFSET..CAM_VIEW_OFFSET + 64];
        let floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_ne_bytes(chunk.try_into().unwrap()))
            .collect();
        assert_eq!(floats, cam.view().to_cols_array().to_vec());
    }

    #[test]
    fn moving_republishes_only_changed_ranges() {
        let mut cam = camera();
        cam.block_mut().take_dirty();
        let base = Instant::now();
        seconds(&mut cam, base, 0.5);
        cam.update_position(MoveMask::UP);
        // position (128..144) and view (0..64) are dirty, projection is not
        let span = cam.block().dirty_span().unwrap();
        assert_eq!(span, 0..CAM_BLOCK_SIZE);

        cam.block_mut().take_dirty();
        cam.switch_projection(base);
        let span = cam.block().dirty_span().unwrap();
        assert_eq!(span, CAM_PROJ_OFFSET..CAM_PROJ_OFFSET + 64);
    }
}
