//! WGSL sources for the two shading programs.
//!
//! Both declare the same `globals` group at the binding points from
//! [`crate::blocks::binding`] and the same model/normal matrix layout in
//! their per-object block, so either program observes the same camera and
//! light buffers and accepts the same per-draw matrix writes.

const GLOBALS: &str = r#"
struct CamData {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    position: vec3<f32>,
}

struct DirLight {
    direction: vec4<f32>,
    ambient: vec4<f32>,
    diffuse: vec4<f32>,
    specular: vec4<f32>,
    intensity: f32,
}

struct DirLights {
    lights: array<DirLight, 8>,
    count: u32,
}

struct PntLight {
    position: vec4<f32>,
    ambient: vec4<f32>,
    diffuse: vec4<f32>,
    specular: vec4<f32>,
    k_constant: f32,
    k_linear: f32,
    k_quadratic: f32,
    intensity: f32,
}

struct PntLights {
    lights: array<PntLight, 8>,
    count: u32,
}

@group(0) @binding(0)
var<uniform> dir_lights: DirLights;

@group(0) @binding(1)
var<uniform> pnt_lights: PntLights;

@group(0) @binding(2)
var<uniform> cam: CamData;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

fn world_normal(normal: mat3x4<f32>, input: vec3<f32>) -> vec3<f32> {
    return normalize(mat3x3<f32>(normal[0].xyz, normal[1].xyz, normal[2].xyz) * input);
}
"#;

const PROPERTY_BODY: &str = r#"
struct ObjectConstants {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    ambient: vec4<f32>,
    diffuse: vec4<f32>,
    specular: vec4<f32>,
    gloss: vec4<f32>,
}

@group(1) @binding(0)
var<uniform> object: ObjectConstants;

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_pos = object.model * vec4<f32>(input.position, 1.0);
    out.position = cam.proj * cam.view * world_pos;
    out.world_pos = world_pos.xyz;
    out.normal = world_normal(object.normal, input.normal);
    out.uv = input.uv;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(input.normal);
    let view_dir = normalize(cam.position - input.world_pos);
    let shine = max(object.gloss.x * 128.0, 1.0);
    var color = vec3<f32>(0.0);

    for (var i = 0u; i < dir_lights.count; i = i + 1u) {
        let light = dir_lights.lights[i];
        let light_dir = normalize(-light.direction.xyz);
        let diff = max(dot(normal, light_dir), 0.0);
        let spec = pow(max(dot(view_dir, reflect(-light_dir, normal)), 0.0), shine);
        color = color + light.intensity * (light.ambient.xyz * object.ambient.xyz
            + diff * light.diffuse.xyz * object.diffuse.xyz
            + spec * light.specular.xyz * object.specular.xyz);
    }

    for (var i = 0u; i < pnt_lights.count; i = i + 1u) {
        let light = pnt_lights.lights[i];
        let to_light = light.position.xyz - input.world_pos;
        let dist = length(to_light);
        let light_dir = normalize(to_light);
        let atten = 1.0 / (light.k_constant + light.k_linear * dist + light.k_quadratic * dist * dist);
        let diff = max(dot(normal, light_dir), 0.0);
        let spec = pow(max(dot(view_dir, reflect(-light_dir, normal)), 0.0), shine);
        color = color + atten * light.intensity * (light.ambient.xyz * object.ambient.xyz
            + diff * light.diffuse.xyz * object.diffuse.xyz
            + spec * light.specular.xyz * object.specular.xyz);
    }

    return vec4<f32>(color, 1.0);
}
"#;

const IMAGE_BODY: &str = r#"
struct ObjectConstants {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    gloss: vec4<f32>,
}

@group(1) @binding(0)
var<uniform> object: ObjectConstants;

@group(2) @binding(0)
var diff_map: texture_2d<f32>;

@group(2) @binding(1)
var spec_map: texture_2d<f32>;

@group(2) @binding(2)
var map_sampler: sampler;

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_pos = object.model * vec4<f32>(input.position, 1.0);
    out.position = cam.proj * cam.view * world_pos;
    out.world_pos = world_pos.xyz;
    out.normal = world_normal(object.normal, input.normal);
    out.uv = input.uv;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(input.normal);
    let view_dir = normalize(cam.position - input.world_pos);
    let shine = max(object.gloss.x * 128.0, 1.0);
    let albedo = textureSample(diff_map, map_sampler, input.uv).rgb;
    let gleam = textureSample(spec_map, map_sampler, input.uv).rgb;
    var color = vec3<f32>(0.0);

    for (var i = 0u; i < dir_lights.count; i = i + 1u) {
        let light = dir_lights.lights[i];
        let light_dir = normalize(-light.direction.xyz);
        let diff = max(dot(normal, light_dir), 0.0);
        let spec = pow(max(dot(view_dir, reflect(-light_dir, normal)), 0.0), shine);
        color = color + light.intensity * (light.ambient.xyz * albedo
            + diff * light.diffuse.xyz * albedo
            + spec * light.specular.xyz * gleam);
    }

    for (var i = 0u; i < pnt_lights.count; i = i + 1u) {
        let light = pnt_lights.lights[i];
        let to_light = light.position.xyz - input.world_pos;
        let dist = length(to_light);
        let light_dir = normalize(to_light);
        let atten = 1.0 / (light.k_constant + light.k_linear * dist + light.k_quadratic * dist * dist);
        let diff = max(dot(normal, light_dir), 0.0);
        let spec = pow(max(dot(view_dir, reflect(-light_dir, normal)), 0.0), shine);
        color = color + atten * light.intensity * (light.ambient.xyz * albedo
            + diff * light.diffuse.xyz * albedo
            + spec * light.specular.xyz * gleam);
    }

    return vec4<f32>(color, 1.0);
}
"#;

pub(crate) fn property_shader() -> String {
    format!("{GLOBALS}{PROPERTY_BODY}")
}

pub(crate) fn image_shader() -> String {
    format!("{GLOBALS}{IMAGE_BODY}")
}
