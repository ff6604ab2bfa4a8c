//! Core modules for the studio scene viewer.
//!
//! The crate separates the CPU-side scene state from the GPU renderer: the
//! camera, light registry and asset registry publish fixed-layout binary
//! blocks and route draws through a small shading boundary, while the
//! `render` module owns the device resources that consume them. Everything
//! up to that boundary runs headless, which keeps the synchronization layer
//! testable without a GPU.

pub mod assets;
pub mod blocks;
pub mod camera;
pub mod input;
pub mod lights;
pub mod obj;
pub mod render;
pub mod scene;

pub use assets::{
    AssetRegistry, AssetSource, DiskSource, ImageData, Material, ModelInstance, RegistryError,
    ShadeBackend, ShadingRef, Texture,
};
pub use blocks::BlockBuffer;
pub use camera::{Camera, Projection};
pub use input::{InputState, MoveMask};
pub use lights::{DirectionalLight, LightRegistry, PointLight};
pub use obj::{load_obj_from_str, MeshData};
pub use render::Renderer;
pub use scene::SceneDefinition;
