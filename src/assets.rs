use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glam::{Mat3, Mat4, Vec3};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::obj::{load_obj_from_str, MeshData};

/// Property-shaded surface: colors and glossiness fed straight to the shader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub gloss: f32,
}

/// Decoded RGBA8 pixels. A zero-sized image stands in for one that failed
/// to decode; the renderer substitutes a fallback texel for it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageData {
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Image-shaded surface: diffuse and specular maps plus glossiness.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub diffuse: ImageData,
    pub specular: ImageData,
    pub gloss: f32,
}

/// Which shading path a model resolved to, by store membership.
///
/// Resolution happens once, when the model is created; a surface name found
/// in neither store is rejected there, so draw time never sees an
/// unresolvable reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadingRef {
    Property(String),
    Image(String),
}

/// A drawable unit: mesh reference, resolved shading path, transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInstance {
    pub mesh: String,
    pub shading: ShadingRef,
    pub transform: Mat4,
    pub normal: Mat3,
}

/// Mesh definition: name plus the importer-facing file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshDef {
    pub name: String,
    pub file: String,
}

/// Material definition as authored in scene data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDef {
    pub name: String,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub gloss: f32,
}

/// Texture definition: the two image files and glossiness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureDef {
    pub name: String,
    pub diffuse_file: String,
    pub specular_file: String,
    pub gloss: f32,
}

/// Model definition: references by name plus the full model transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDef {
    pub name: String,
    pub mesh: String,
    pub surface: String,
    pub transform: Mat4,
}

/// Configuration errors detected while populating the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("model {model}: surface {surface:?} is neither a texture nor a material")]
    UnknownSurface { model: String, surface: String },
}

/// Import boundary: supplies vertex/index arrays and decoded images.
pub trait AssetSource {
    fn load_mesh(&self, file: &str) -> Result<MeshData>;
    fn load_image(&self, file: &str) -> Result<ImageData>;
}

/// Reads OBJ meshes and images from `mesh/` and `tex/` under a root
/// directory.
#[derive(Debug, Clone)]
pub struct DiskSource {
    mesh_dir: PathBuf,
    tex_dir: PathBuf,
}

impl DiskSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            mesh_dir: root.join("mesh"),
            tex_dir: root.join("tex"),
        }
    }
}

impl AssetSource for DiskSource {
    fn load_mesh(&self, file: &str) -> Result<MeshData> {
        let path = self.mesh_dir.join(file);
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("unable to read {}", path.display()))?;
        load_obj_from_str(&text)
            .with_context(|| format!("failed to parse OBJ mesh {}", path.display()))
    }

    fn load_image(&self, file: &str) -> Result<ImageData> {
        let path = self.tex_dir.join(file);
        let image = image::open(&path)
            .with_context(|| format!("unable to decode {}", path.display()))?;
        // OBJ texture coordinates assume a bottom-left origin
        let image = image.flipv().to_rgba8();
        let (width, height) = image.dimensions();
        Ok(ImageData {
            width,
            height,
            pixels: image.into_raw(),
        })
    }
}

/// One draw routed to the property-shaded path.
#[derive(Debug, Clone, Copy)]
pub struct PropertyDraw<'a> {
    pub mesh: &'a str,
    pub surface: &'a str,
    pub model_mat: Mat4,
    pub norm_mat: Mat3,
    pub material: &'a Material,
}

/// One draw routed to the image-shaded path.
#[derive(Debug, Clone, Copy)]
pub struct ImageDraw<'a> {
    pub mesh: &'a str,
    pub surface: &'a str,
    pub model_mat: Mat4,
    pub norm_mat: Mat3,
    pub texture: &'a Texture,
}

/// The shading boundary. The renderer implements it with real pipeline and
/// texture bindings; tests implement it with a recorder.
pub trait ShadeBackend {
    fn draw_property_shaded(&mut self, draw: PropertyDraw<'_>);
    fn draw_image_shaded(&mut self, draw: ImageDraw<'_>);
}

/// Named stores for every scene entity, populated in bulk during setup.
///
/// Creation is idempotent by key (re-creating a name overwrites) and must
/// run in dependency order: materials, textures and meshes before models.
#[derive(Debug, Default)]
pub struct AssetRegistry {
    meshes: BTreeMap<String, MeshData>,
    materials: BTreeMap<String, Material>,
    textures: BTreeMap<String, Texture>,
    models: BTreeMap<String, ModelInstance>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_materials(&mut self, defs: &[MaterialDef]) {
        for def in defs {
            self.materials.insert(
                def.name.clone(),
                Material {
                    ambient: def.ambient,
                    diffuse: def.diffuse,
                    specular: def.specular,
                    gloss: def.gloss,
                },
            );
        }
    }

    /// Creates textures, decoding both images through `source`. An image
    /// that fails to decode is logged and degrades to a zero-sized image;
    /// the texture name stays valid so dependent models still resolve.
    pub fn create_textures(&mut self, defs: &[TextureDef], source: &dyn AssetSource) {
        for def in defs {
            let diffuse = load_image_or_empty(source, &def.diffuse_file);
            let specular = load_image_or_empty(source, &def.specular_file);
            self.textures.insert(
                def.name.clone(),
                Texture {
                    diffuse,
                    specular,
                    gloss: def.gloss,
                },
            );
        }
    }

    /// Imports meshes through `source`. A mesh that fails to import is
    /// logged and skipped; models referencing it are skipped at draw time.
    pub fn create_meshes(&mut self, defs: &[MeshDef], source: &dyn AssetSource) {
        for def in defs {
            match source.load_mesh(&def.file) {
                Ok(mesh) => {
                    self.meshes.insert(def.name.clone(), mesh);
                }
                Err(err) => {
                    error!("failed to import mesh {} ({}): {err:?}", def.name, def.file);
                }
            }
        }
    }

    /// Creates model instances, resolving each surface name to its shading
    /// path: the texture store is consulted first, then the material store.
    /// A name found in neither is a configuration error.
    ///
    /// The normal matrix is derived here as the inverse-transpose of the
    /// transform's upper-left 3x3 and is never patched incrementally.
    pub fn create_models(&mut self, defs: &[ModelDef]) -> Result<(), RegistryError> {
        for def in defs {
            let shading = if self.textures.contains_key(&def.surface) {
                ShadingRef::Image(def.surface.clone())
            } else if self.materials.contains_key(&def.surface) {
                ShadingRef::Property(def.surface.clone())
            } else {
                return Err(RegistryError::UnknownSurface {
                    model: def.name.clone(),
                    surface: def.surface.clone(),
                });
            };
            let normal = Mat3::from_mat4(def.transform).inverse().transpose();
            self.models.insert(
                def.name.clone(),
                ModelInstance {
                    mesh: def.mesh.clone(),
                    shading,
                    transform: def.transform,
                    normal,
                },
            );
        }
        Ok(())
    }

    pub fn mesh(&self, name: &str) -> Option<&MeshData> {
        self.meshes.get(name)
    }

    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    pub fn texture(&self, name: &str) -> Option<&Texture> {
        self.textures.get(name)
    }

    pub fn model(&self, name: &str) -> Option<&ModelInstance> {
        self.models.get(name)
    }

    pub fn meshes(&self) -> impl Iterator<Item = (&str, &MeshData)> {
        self.meshes.iter().map(|(name, mesh)| (name.as_str(), mesh))
    }

    pub fn textures(&self) -> impl Iterator<Item = (&str, &Texture)> {
        self.textures.iter().map(|(name, tex)| (name.as_str(), tex))
    }

    pub fn models(&self) -> impl Iterator<Item = (&str, &ModelInstance)> {
        self.models.iter().map(|(name, model)| (name.as_str(), model))
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Draws every model in name order, routing each to its shading path.
    pub fn draw_all(&self, backend: &mut dyn ShadeBackend) {
        for (name, model) in &self.models {
            if !self.meshes.contains_key(&model.mesh) {
                warn!("model {name}: mesh {:?} is not loaded, skipping", model.mesh);
                continue;
            }
            match &model.shading {
                ShadingRef::Image(key) => {
                    let Some(texture) = self.textures.get(key) else {
                        warn!("model {name}: texture {key:?} was removed, skipping");
                        continue;
                    };
                    backend.draw_image_shaded(ImageDraw {
                        mesh: &model.mesh,
                        surface: key,
                        model_mat: model.transform,
                        norm_mat: model.normal,
                        texture,
                    });
                }
                ShadingRef::Property(key) => {
                    let Some(material) = self.materials.get(key) else {
                        warn!("model {name}: material {key:?} was removed, skipping");
                        continue;
                    };
                    backend.draw_property_shaded(PropertyDraw {
                        mesh: &model.mesh,
                        surface: key,
                        model_mat: model.transform,
                        norm_mat: model.normal,
                        material,
                    });
                }
            }
        }
    }
}

fn load_image_or_empty(source: &dyn AssetSource, file: &str) -> ImageData {
    match source.load_image(file) {
        Ok(image) => image,
        Err(err) => {
            error!("failed to load image {file}: {err:?}");
            ImageData::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeSource {
        meshes: HashMap<String, MeshData>,
        images: HashMap<String, ImageData>,
    }

    impl FakeSource {
        fn with_mesh(mut self, file: &str) -> Self {
            self.meshes.insert(
                file.to_string(),
                MeshData {
                    vertices: vec![0.0; 24],
                    indices: vec![0, 1, 2],
                },
            );
            self
        }

        fn with_image(mut self, file: &str) -> Self {
            self.images.insert(
                file.to_string(),
                ImageData {
                    width: 1,
                    height: 1,
                    pixels: vec![255, 255, 255, 255],
                },
            );
            self
        }
    }

    impl AssetSource for FakeSource {
        fn load_mesh(&self, file: &str) -> Result<MeshData> {
            self.meshes
                .get(file)
                .cloned()
                .ok_or_else(|| anyhow!("no such mesh: {file}"))
        }

        fn load_image(&self, file: &str) -> Result<ImageData> {
            self.images
                .get(file)
                .cloned()
                .ok_or_else(|| anyhow!("no such image: {file}"))
        }
    }

    #[derive(Debug, PartialEq)]
    enum Call {
        Property { mesh: String, gloss: f32 },
        Image { mesh: String, gloss: f32 },
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl ShadeBackend for Recorder {
        fn draw_property_shaded(&mut self, draw: PropertyDraw<'_>) {
            self.calls.push(Call::Property {
                mesh: draw.mesh.to_string(),
                gloss: draw.material.gloss,
            });
        }

        fn draw_image_shaded(&mut self, draw: ImageDraw<'_>) {
            self.calls.push(Call::Image {
                mesh: draw.mesh.to_string(),
                gloss: draw.texture.gloss,
            });
        }
    }

    fn material_def(name: &str) -> MaterialDef {
        MaterialDef {
            name: name.to_string(),
            ambient: Vec3::splat(0.1),
            diffuse: Vec3::splat(0.5),
            specular: Vec3::splat(0.9),
            gloss: 0.25,
        }
    }

    fn texture_def(name: &str) -> TextureDef {
        TextureDef {
            name: name.to_string(),
            diffuse_file: "diff.png".to_string(),
            specular_file: "spec.png".to_string(),
            gloss: 0.86,
        }
    }

    fn model_def(name: &str, mesh: &str, surface: &str) -> ModelDef {
        ModelDef {
            name: name.to_string(),
            mesh: mesh.to_string(),
            surface: surface.to_string(),
            transform: Mat4::IDENTITY,
        }
    }

    fn registry_with_cube() -> AssetRegistry {
        let source = FakeSource::default()
            .with_mesh("cube.obj")
            .with_image("diff.png")
            .with_image("spec.png");
        let mut registry = AssetRegistry::new();
        registry.create_materials(&[material_def("chrome")]);
        registry.create_textures(&[texture_def("d6_tex")], &source);
        registry.create_meshes(
            &[MeshDef {
                name: "cube".to_string(),
                file: "cube.obj".to_string(),
            }],
            &source,
        );
        registry
    }

    #[test]
    fn texture_store_wins_and_routes_to_image_path() {
        let mut registry = registry_with_cube();
        registry
            .create_models(&[model_def("die", "cube", "d6_tex")])
            .unwrap();

        let mut recorder = Recorder::default();
        registry.draw_all(&mut recorder);
        assert_eq!(
            recorder.calls,
            vec![Call::Image {
                mesh: "cube".to_string(),
                gloss: 0.86
            }]
        );
    }

    #[test]
    fn material_only_name_routes_to_property_path() {
        let mut registry = registry_with_cube();
        registry
            .create_models(&[model_def("stand", "cube", "chrome")])
            .unwrap();

        let mut recorder = Recorder::default();
        registry.draw_all(&mut recorder);
        assert_eq!(
            recorder.calls,
            vec![Call::Property {
                mesh: "cube".to_string(),
                gloss: 0.25
            }]
        );
    }

    #[test]
    fn surface_in_neither_store_is_rejected_at_creation() {
        let mut registry = registry_with_cube();
        let err = registry
            .create_models(&[model_def("ghost", "cube", "nope")])
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownSurface { .. }));
        assert_eq!(registry.model_count(), 0);
    }

    #[test]
    fn missing_mesh_is_skipped_at_draw_time() {
        let mut registry = registry_with_cube();
        registry
            .create_models(&[
                model_def("die", "cube", "d6_tex"),
                model_def("lost", "never_imported", "chrome"),
            ])
            .unwrap();

        let mut recorder = Recorder::default();
        registry.draw_all(&mut recorder);
        assert_eq!(recorder.calls.len(), 1);
    }

    #[test]
    fn draw_order_is_stable_by_model_name() {
        let mut registry = registry_with_cube();
        registry
            .create_models(&[
                model_def("zed", "cube", "chrome"),
                model_def("alpha", "cube", "chrome"),
            ])
            .unwrap();

        let mut first = Recorder::default();
        registry.draw_all(&mut first);
        let mut second = Recorder::default();
        registry.draw_all(&mut second);
        assert_eq!(first.calls, second.calls);
        assert_eq!(
            first.calls[0],
            Call::Property {
                mesh: "cube".to_string(),
                gloss: 0.25
            }
        );
    }

    #[test]
    fn failed_image_degrades_to_empty_but_keeps_the_name() {
        let source = FakeSource::default().with_image("diff.png");
        let mut registry = AssetRegistry::new();
        registry.create_textures(&[texture_def("half")], &source);

        let texture = registry.texture("half").unwrap();
        assert!(!texture.diffuse.is_empty());
        assert!(texture.specular.is_empty());
    }

    #[test]
    fn failed_mesh_import_is_skipped() {
        let source = FakeSource::default();
        let mut registry = AssetRegistry::new();
        registry.create_meshes(
            &[MeshDef {
                name: "cube".to_string(),
                file: "cube.obj".to_string(),
            }],
            &source,
        );
        assert_eq!(registry.mesh_count(), 0);
    }

    #[test]
    fn recreating_a_name_overwrites_the_entry() {
        let mut registry = registry_with_cube();
        let mut brighter = material_def("chrome");
        brighter.gloss = 0.99;
        registry.create_materials(&[brighter]);
        assert_eq!(registry.material("chrome").unwrap().gloss, 0.99);
        assert_eq!(registry.material_count(), 1);
    }

    #[test]
    fn normal_matrix_is_inverse_transpose_of_upper_left() {
        let transform = Mat4::from_scale(Vec3::new(2.0, 1.0, 4.0));
        let mut registry = registry_with_cube();
        registry
            .create_models(&[ModelDef {
                name: "scaled".to_string(),
                mesh: "cube".to_string(),
                surface: "chrome".to_string(),
                transform,
            }])
            .unwrap();

        let model = registry.model("scaled").unwrap();
        let expected = Mat3::from_mat4(transform).inverse().transpose();
        assert!(model.normal.abs_diff_eq(expected, 1e-6));
    }
}
