use anyhow::{anyhow, Context, Result};
use glam::{Mat4, Vec3};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::assets::{MaterialDef, MeshDef, ModelDef, TextureDef};

/// Immutable definition lists describing one scene.
///
/// Produced once (from XML or the built-in scene) and handed to the asset
/// registry's bulk creation calls; nothing mutates a definition afterwards.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneDefinition {
    pub meshes: Vec<MeshDef>,
    pub materials: Vec<MaterialDef>,
    pub textures: Vec<TextureDef>,
    pub models: Vec<ModelDef>,
}

impl SceneDefinition {
    /// Parses a scene description from XML.
    ///
    /// Model transforms are given as position/rotation/scale triples and
    /// composed as `T * Rz * Ry * Rx * S` with rotations in degrees.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        // Only direct children of <scene> are definitions; <mesh> also
        // appears inside <model> as a reference.
        let root = document.root_element();
        let mut scene = Self::default();

        for node in root.children().filter(|n| n.has_tag_name("material")) {
            scene.materials.push(MaterialDef {
                name: required_text(&node, "name")?,
                ambient: parse_vec3(optional_text(&node, "ambient"), Vec3::splat(0.1))?,
                diffuse: parse_vec3(optional_text(&node, "diffuse"), Vec3::splat(0.8))?,
                specular: parse_vec3(optional_text(&node, "specular"), Vec3::splat(0.5))?,
                gloss: parse_f32(optional_text(&node, "gloss"), 0.25)?,
            });
        }

        for node in root.children().filter(|n| n.has_tag_name("texture")) {
            scene.textures.push(TextureDef {
                name: required_text(&node, "name")?,
                diffuse_file: required_text(&node, "diffuse")?,
                specular_file: required_text(&node, "specular")?,
                gloss: parse_f32(optional_text(&node, "gloss"), 0.25)?,
            });
        }

        for node in root.children().filter(|n| n.has_tag_name("mesh")) {
            let file = required_text(&node, "file")?;
            let name = optional_text(&node, "name").unwrap_or_else(|| stem(&file));
            scene.meshes.push(MeshDef { name, file });
        }

        for node in root.children().filter(|n| n.has_tag_name("model")) {
            let position = parse_vec3(optional_text(&node, "position"), Vec3::ZERO)?;
            let rotation = parse_vec3(optional_text(&node, "rotation"), Vec3::ZERO)?;
            let scale = parse_vec3(optional_text(&node, "scale"), Vec3::ONE)?;
            scene.models.push(ModelDef {
                name: required_text(&node, "name")?,
                mesh: required_text(&node, "mesh")?,
                surface: required_text(&node, "surface")?,
                transform: compose_trs(position, rotation, scale),
            });
        }

        Ok(scene)
    }

    /// The built-in studio scene: a desk against a wall carrying a
    /// three-legged microphone assembly and a few dice.
    pub fn studio() -> Self {
        let mic_pos = Vec3::new(24.4843, 0.0, -19.2146);
        let mic_base_rot = 58.0_f32.to_radians();
        let mic_top_rot = 22.5_f32.to_radians();
        let base = Mat4::from_translation(mic_pos) * Mat4::from_rotation_y(mic_base_rot);
        let top = Mat4::from_translation(mic_pos) * Mat4::from_rotation_y(mic_top_rot);
        let leg_tilt = Mat4::from_rotation_z(50.0_f32.to_radians());

        let mesh_files = [
            "d6.obj",
            "d8.obj",
            "d20.obj",
            "desk.obj",
            "mic_base.obj",
            "mic_body.obj",
            "mic_feet.obj",
            "mic_filt_cmp.obj",
            "mic_gain_knob.obj",
            "mic_hold.obj",
            "mic_leg.obj",
            "mic_swivel.obj",
            "wall.obj",
        ];

        let materials = vec![
            MaterialDef {
                name: "blk_rubber".to_string(),
                ambient: Vec3::new(0.02, 0.02, 0.02),
                diffuse: Vec3::new(0.01, 0.01, 0.01),
                specular: Vec3::new(0.4, 0.4, 0.4),
                gloss: 0.25,
            },
            MaterialDef {
                name: "blk_plastic".to_string(),
                ambient: Vec3::new(0.0, 0.0, 0.0),
                diffuse: Vec3::new(0.01, 0.01, 0.01),
                specular: Vec3::new(0.5, 0.5, 0.5),
                gloss: 0.78,
            },
            MaterialDef {
                name: "slv_chrome".to_string(),
                ambient: Vec3::new(0.33, 0.33, 0.33),
                diffuse: Vec3::new(0.4, 0.4, 0.4),
                specular: Vec3::new(0.85, 0.85, 0.85),
                gloss: 0.16,
            },
        ];

        let textures = vec![
            texture("d6_tex", "d6_diff.png", "d6_spec.png", 0.86),
            texture("d8_tophalf_tex", "d8_tophalf_diff.png", "d8_tophalf_spec.png", 0.86),
            texture("d8_bothalf_tex", "d8_bothalf_diff.png", "d8_bothalf_spec.png", 0.86),
            texture("d20_tex", "d20_diff.png", "d20_spec.png", 0.86),
            texture("mic_filt_tex", "mic_filt_diff.png", "mic_filt_spec.png", 0.64),
            texture("mic_gain_tex", "mic_gain_diff.png", "metal_spec.png", 0.16),
            texture("mic_body_tex", "mic_body_diff.png", "metal_spec.png", 0.16),
            texture("wall_tex", "drywall_diff.png", "drywall_spec.png", 0.64),
            texture("desk_tex", "desk_diff.png", "desk_spec.png", 0.64),
        ];

        let models = vec![
            model("desk", "desk", "desk_tex", Mat4::IDENTITY),
            model("wall", "wall", "wall_tex", Mat4::IDENTITY),
            model(
                "mic_foot1",
                "mic_feet",
                "blk_rubber",
                base * Mat4::from_translation(Vec3::new(7.5326, 0.1429, 0.0)) * leg_tilt,
            ),
            model(
                "mic_foot2",
                "mic_feet",
                "blk_rubber",
                base * Mat4::from_translation(Vec3::new(-3.7663, 0.1429, -6.5234))
                    * Mat4::from_rotation_y(120.0_f32.to_radians())
                    * leg_tilt,
            ),
            model(
                "mic_foot3",
                "mic_feet",
                "blk_rubber",
                base * Mat4::from_translation(Vec3::new(-3.7663, 0.1429, 6.5234))
                    * Mat4::from_rotation_y(240.0_f32.to_radians())
                    * leg_tilt,
            ),
            model(
                "mic_leg1",
                "mic_leg",
                "slv_chrome",
                base * Mat4::from_translation(Vec3::new(6.5480, 0.9690, -0.0043)) * leg_tilt,
            ),
            model(
                "mic_leg2",
                "mic_leg",
                "slv_chrome",
                base * Mat4::from_translation(Vec3::new(-3.2924, 0.9690, -5.6941))
                    * Mat4::from_rotation_y(120.0_f32.to_radians())
                    * leg_tilt,
            ),
            model(
                "mic_leg3",
                "mic_leg",
                "slv_chrome",
                base * Mat4::from_translation(Vec3::new(-3.2905, 0.9690, 5.6964))
                    * Mat4::from_rotation_y(240.0_f32.to_radians())
                    * leg_tilt,
            ),
            model(
                "mic_base",
                "mic_base",
                "blk_plastic",
                Mat4::from_translation(mic_pos + Vec3::new(0.0, 4.95, 0.0)),
            ),
            model(
                "mic_swivel",
                "mic_swivel",
                "blk_plastic",
                top * Mat4::from_translation(Vec3::new(0.0, 6.15, 0.0)),
            ),
            model(
                "mic_hold",
                "mic_hold",
                "blk_plastic",
                top * Mat4::from_translation(Vec3::new(0.0, 9.1533, 0.0))
                    * Mat4::from_rotation_z(56.0_f32.to_radians()),
            ),
            model(
                "mic_body",
                "mic_body",
                "mic_body_tex",
                top * Mat4::from_translation(Vec3::new(2.7499, 12.9520, 0.0104))
                    * Mat4::from_rotation_z(56.0_f32.to_radians())
                    * Mat4::from_rotation_y(90.0_f32.to_radians()),
            ),
            model(
                "mic_filt_cmp",
                "mic_filt_cmp",
                "mic_filt_tex",
                top * Mat4::from_translation(Vec3::new(-1.394, 15.752, 0.0106))
                    * Mat4::from_rotation_z(56.0_f32.to_radians())
                    * Mat4::from_scale(Vec3::new(1.33, 1.0, 1.125)),
            ),
            model(
                "mic_gain_knob",
                "mic_gain_knob",
                "mic_gain_tex",
                top * Mat4::from_translation(Vec3::new(2.1357, 15.6, 0.0106))
                    * Mat4::from_rotation_z(-34.0_f32.to_radians()),
            ),
            model(
                "d6",
                "d6",
                "d6_tex",
                Mat4::from_translation(Vec3::new(16.936, 0.58, -11.706))
                    * Mat4::from_rotation_z(180.0_f32.to_radians())
                    * Mat4::from_rotation_y(205.0_f32.to_radians()),
            ),
            model(
                "d8_tophalf",
                "d8",
                "d8_tophalf_tex",
                Mat4::from_translation(Vec3::new(22.8730, 0.5834, -10.4779))
                    * Mat4::from_rotation_z(-125.0_f32.to_radians())
                    * Mat4::from_rotation_y(-45.0_f32.to_radians()),
            ),
            model(
                "d8_bothalf",
                "d8",
                "d8_bothalf_tex",
                Mat4::from_translation(Vec3::new(22.8730, 0.5834, -10.4779))
                    * Mat4::from_rotation_z(55.0_f32.to_radians())
                    * Mat4::from_rotation_y(135.0_f32.to_radians()),
            ),
            model(
                "d20",
                "d20",
                "d20_tex",
                Mat4::from_translation(Vec3::new(21.5720, 0.0, -14.792))
                    * Mat4::from_rotation_y(-95.0_f32.to_radians())
                    * Mat4::from_translation(Vec3::new(0.0, 0.8, 0.0))
                    * Mat4::from_rotation_z(-30.5_f32.to_radians())
                    * Mat4::from_rotation_x(66.0_f32.to_radians()),
            ),
        ];

        Self {
            meshes: mesh_files
                .iter()
                .map(|file| MeshDef {
                    name: stem(file),
                    file: file.to_string(),
                })
                .collect(),
            materials,
            textures,
            models,
        }
    }
}

fn texture(name: &str, diffuse: &str, specular: &str, gloss: f32) -> TextureDef {
    TextureDef {
        name: name.to_string(),
        diffuse_file: diffuse.to_string(),
        specular_file: specular.to_string(),
        gloss,
    }
}

fn model(name: &str, mesh: &str, surface: &str, transform: Mat4) -> ModelDef {
    ModelDef {
        name: name.to_string(),
        mesh: mesh.to_string(),
        surface: surface.to_string(),
        transform,
    }
}

fn stem(file: &str) -> String {
    file.split('.').next().unwrap_or(file).to_string()
}

fn compose_trs(position: Vec3, rotation_deg: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_translation(position)
        * Mat4::from_rotation_z(rotation_deg.z.to_radians())
        * Mat4::from_rotation_y(rotation_deg.y.to_radians())
        * Mat4::from_rotation_x(rotation_deg.x.to_radians())
        * Mat4::from_scale(scale)
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let mut numbers = value
        .split_whitespace()
        .filter_map(|component| component.parse::<f32>().ok());
    let x = numbers
        .next()
        .ok_or_else(|| anyhow!("vector is missing components"))?;
    let y = numbers
        .next()
        .ok_or_else(|| anyhow!("vector is missing components"))?;
    let z = numbers
        .next()
        .ok_or_else(|| anyhow!("vector is missing components"))?;
    Ok(Vec3::new(x, y, z))
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float: {err}")),
        None => Ok(default),
    }
}
