use std::any::Any;
use std::env;
use std::fmt;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use log::info;
use pollster::block_on;
use winit::dpi::LogicalSize;
use winit::event::{
    ElementState, Event, KeyboardInput, MouseScrollDelta, VirtualKeyCode, WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::platform::run_return::EventLoopExtRunReturn;
use winit::window::{CursorGrabMode, WindowBuilder};

use studio_scene::{
    AssetRegistry, Camera, DiskSource, InputState, LightRegistry, MoveMask, Renderer,
    SceneDefinition,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;

    let scene = match &options.scene_path {
        Some(path) => {
            let xml = fs::read_to_string(path)
                .with_context(|| format!("failed to read scene file {path}"))?;
            SceneDefinition::from_xml(&xml).context("failed to parse scene XML")?
        }
        None => SceneDefinition::studio(),
    };

    println!(
        "Loaded scene with {} models ({} meshes, {} materials, {} textures)",
        scene.models.len(),
        scene.meshes.len(),
        scene.materials.len(),
        scene.textures.len()
    );
    for model in &scene.models {
        println!(" - {} [{}]", model.name, model.surface);
    }

    let source = DiskSource::new(&options.assets_root);
    let mut registry = AssetRegistry::new();
    registry.create_materials(&scene.materials);
    registry.create_textures(&scene.textures, &source);
    registry.create_meshes(&scene.meshes, &source);
    registry
        .create_models(&scene.models)
        .context("invalid model definitions")?;

    if options.summary_only {
        return run_headless(&registry);
    }

    match run_interactive(&registry) {
        Ok(()) => Ok(()),
        Err(err) => {
            if err.downcast_ref::<WindowInitError>().is_some() {
                eprintln!(
                    "{err}. Falling back to --summary-only mode (set DISPLAY or install X11 libs to enable rendering)."
                );
                run_headless(&registry)
            } else {
                Err(err)
            }
        }
    }
}

fn run_headless(registry: &AssetRegistry) -> Result<()> {
    let decoded = registry
        .textures()
        .filter(|(_, texture)| !texture.diffuse.is_empty())
        .count();
    println!(
        "Ready to draw {} models ({} meshes imported, {} textures decoded)",
        registry.model_count(),
        registry.mesh_count(),
        decoded
    );
    Ok(())
}

fn run_interactive(registry: &AssetRegistry) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop =
        event_loop.map_err(|panic| WindowInitError::from_panic("event loop", panic))?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Studio Scene")
            .with_inner_size(LogicalSize::new(800.0, 600.0))
            .build(&event_loop)
            .map_err(|err| WindowInitError::from_error("window", err))?,
    );

    let mut renderer = block_on(Renderer::new(Arc::clone(&window)))?;
    renderer.upload_assets(registry);

    let size = window.inner_size();
    let aspect = size.width as f32 / size.height.max(1) as f32;
    let camera = Camera::new(Vec3::new(0.0, 0.5, -3.0), aspect);

    let mut lights = LightRegistry::studio();
    lights.publish();

    // Capture the cursor so mouse-look tracks continuous motion.
    if window.set_cursor_grab(CursorGrabMode::Confined).is_err() {
        let _ = window.set_cursor_grab(CursorGrabMode::Locked);
    }
    window.set_cursor_visible(false);

    let mut app = AppState {
        renderer,
        registry,
        camera,
        lights,
        input: InputState::new(),
        last_error: None,
    };

    let mut event_loop = event_loop;
    event_loop.run_return(|event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        if let Err(err) = app.process_event(&event, control_flow) {
            app.last_error = Some(err);
            control_flow.set_exit();
        }
    });

    if let Some(err) = app.last_error {
        return Err(err);
    }

    Ok(())
}

struct AppState<'a> {
    renderer: Renderer,
    registry: &'a AssetRegistry,
    camera: Camera,
    lights: LightRegistry,
    input: InputState,
    last_error: Option<anyhow::Error>,
}

impl AppState<'_> {
    fn process_event(&mut self, event: &Event<()>, control_flow: &mut ControlFlow) -> Result<()> {
        match event {
            Event::WindowEvent { event, window_id } if *window_id == self.renderer.window_id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        control_flow.set_exit();
                    }
                    WindowEvent::Resized(size) => {
                        self.renderer.resize(*size);
                    }
                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        self.renderer.resize(**new_inner_size);
                    }
                    WindowEvent::KeyboardInput { input, .. } => {
                        self.handle_keyboard(input, control_flow);
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        self.camera
                            .update_look(position.x as f32, position.y as f32);
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        let ticks = match delta {
                            MouseScrollDelta::LineDelta(_, y) => *y,
                            MouseScrollDelta::PixelDelta(position) => (position.y as f32).signum(),
                        };
                        self.camera.adjust_speed(ticks);
                    }
                    _ => {}
                }
            }
            Event::RedrawRequested(window_id) if *window_id == self.renderer.window_id() => {
                self.frame()?;
            }
            Event::MainEventsCleared => {
                self.renderer.window().request_redraw();
            }
            _ => {}
        }
        Ok(())
    }

    /// One frame: advance time, integrate movement, flush the dirty block
    /// ranges, draw every model, present.
    fn frame(&mut self) -> Result<()> {
        self.camera.advance(Instant::now());
        let mask = self.input.mask();
        if !mask.is_empty() {
            self.camera.update_position(mask);
        }
        self.renderer
            .sync_blocks(&mut self.camera, &mut self.lights);

        if let Err(err) = self.renderer.render(self.registry) {
            match err {
                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                    let size = self.renderer.window().inner_size();
                    self.renderer.resize(size);
                }
                wgpu::SurfaceError::OutOfMemory => {
                    return Err(anyhow!("GPU is out of memory"));
                }
                wgpu::SurfaceError::Timeout => {
                    info!("Surface timeout; retrying next frame");
                }
            }
        }
        Ok(())
    }

    fn handle_keyboard(&mut self, input: &KeyboardInput, control_flow: &mut ControlFlow) {
        let Some(keycode) = input.virtual_keycode else {
            return;
        };
        let pressed = input.state == ElementState::Pressed;

        if let Some(direction) = map_movement_key(keycode) {
            self.input.set_direction(direction, pressed);
            return;
        }
        match keycode {
            VirtualKeyCode::P if pressed => {
                self.camera.switch_projection(Instant::now());
            }
            VirtualKeyCode::Escape => {
                control_flow.set_exit();
            }
            _ => {}
        }
    }
}

fn map_movement_key(code: VirtualKeyCode) -> Option<MoveMask> {
    Some(match code {
        VirtualKeyCode::W => MoveMask::FORWARD,
        VirtualKeyCode::S => MoveMask::BACKWARD,
        VirtualKeyCode::A => MoveMask::LEFT,
        VirtualKeyCode::D => MoveMask::RIGHT,
        VirtualKeyCode::Q => MoveMask::UP,
        VirtualKeyCode::E => MoveMask::DOWN,
        _ => return None,
    })
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

struct CliOptions {
    scene_path: Option<String>,
    assets_root: String,
    summary_only: bool,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut scene_path = None;
        let mut assets_root = "assets".to_string();
        let mut summary_only = false;

        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--summary-only" => summary_only = true,
                "--assets" => {
                    assets_root = args
                        .next()
                        .ok_or_else(|| anyhow!("--assets requires a directory argument"))?;
                }
                other if other.starts_with("--") => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Usage: studio-scene [scene.xml] [--assets DIR] [--summary-only]"
                    ));
                }
                other => {
                    if scene_path.replace(other.to_string()).is_some() {
                        return Err(anyhow!("only one scene file may be given"));
                    }
                }
            }
        }

        Ok(Self {
            scene_path,
            assets_root,
            summary_only,
        })
    }
}
