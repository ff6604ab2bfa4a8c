use assert_cmd::prelude::*;
use once_cell::sync::Lazy;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

static MINIMAL_SCENE: Lazy<String> = Lazy::new(|| {
    r#"<scene>
  <material>
    <name>chrome</name>
    <gloss>0.16</gloss>
  </material>
  <mesh>
    <file>stand.obj</file>
  </mesh>
  <model>
    <name>stand</name>
    <mesh>stand</mesh>
    <surface>chrome</surface>
  </model>
</scene>
"#
    .to_string()
});

fn write_scene(xml: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("temp scene");
    tmp.write_all(xml.as_bytes()).expect("write scene");
    tmp
}

#[test]
fn summary_mode_prints_builtin_scene() {
    let mut cmd = Command::cargo_bin("studio-scene").expect("binary exists");
    cmd.arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains(
            "Loaded scene with 18 models (13 meshes, 3 materials, 9 textures)",
        ))
        .stdout(contains(" - d6 [d6_tex]"))
        .stdout(contains(" - mic_leg1 [slv_chrome]"))
        .stdout(contains("Ready to draw 18 models"));
}

#[test]
fn summary_mode_loads_a_scene_file() {
    let scene = write_scene(&MINIMAL_SCENE);

    let mut cmd = Command::cargo_bin("studio-scene").expect("binary exists");
    cmd.arg(scene.path()).arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains(
            "Loaded scene with 1 models (1 meshes, 1 materials, 0 textures)",
        ))
        .stdout(contains(" - stand [chrome]"))
        .stdout(contains("Ready to draw 1 models"));
}

#[test]
fn unknown_surface_is_a_configuration_error() {
    let scene = write_scene(
        r#"<scene>
  <mesh>
    <file>stand.obj</file>
  </mesh>
  <model>
    <name>stand</name>
    <mesh>stand</mesh>
    <surface>no_such_surface</surface>
  </model>
</scene>
"#,
    );

    let mut cmd = Command::cargo_bin("studio-scene").expect("binary exists");
    cmd.arg(scene.path()).arg("--summary-only");
    cmd.assert()
        .failure()
        .stderr(contains("neither a texture nor a material"));
}
