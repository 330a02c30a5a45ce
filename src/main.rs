mod camera;
mod components;
mod config;
mod engine;
mod error;
mod lighting;
mod renderer;
mod scene;
mod shadow;
mod systems;

use std::error::Error;

use camera::Camera;
use clap::Parser;
use config::ShadowConfig;
use engine::input::InputState;
use engine::time::FrameTimer;
use engine::window::GameWindow;
use glam::Vec3;
use hecs::World;
use log::{debug, info, warn};
use renderer::shadow_targets::{GlShadowBackend, ShadowTargets};
use renderer::Renderer;
use scene::test_scene::load_test_scene;
use shadow::{attach_requested_casters, despawn_light, DepthRange};
use systems::{
    light_transform_system, lighting_aggregation_system, shadow_caster_system,
    transform_propagation_system,
};

#[derive(Parser)]
#[command(name = "lumen", about = "Forward-lit scene with shadow-mapped lights")]
struct Args {
    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Exit after this many frames (0 runs until the window is closed)
    #[arg(long, default_value_t = 0)]
    frames: u64,

    #[command(flatten)]
    shadows: ShadowConfig,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.shadows;

    let sdl = sdl2::init()?;
    let window = GameWindow::new(&sdl, "Lumen", args.width, args.height)?;

    let depth_range = DepthRange::resolve(renderer::query_depth_range());
    info!("clip depth range: {depth_range:?}");

    let mut renderer = Renderer::init(config.far_plane)?;
    let mut targets = ShadowTargets::new()?;

    let mut world = World::new();
    let (meshes, lights) = load_test_scene(&mut world);

    let attached = attach_requested_casters(
        &mut world,
        &config,
        &mut GlShadowBackend {
            targets: &mut targets,
            meshes: &meshes,
        },
    );
    info!("{} lights, {attached} shadow casters", lights.len());

    let camera = Camera::new(Vec3::new(0.0, 12.0, 22.0), Vec3::new(0.0, 1.0, 0.0));
    let mut event_pump = sdl.event_pump()?;
    let mut input = InputState::new();
    let mut timer = FrameTimer::new();

    loop {
        timer.tick();
        input.update(&mut event_pump);
        if input.quit {
            break;
        }

        transform_propagation_system(&mut world);
        light_transform_system(&mut world);

        let rendered = shadow_caster_system(
            &mut world,
            &mut GlShadowBackend {
                targets: &mut targets,
                meshes: &meshes,
            },
            depth_range,
        );
        let frame = lighting_aggregation_system(&world, config.shadow_bias);

        let viewport = window.size();
        let view = camera.view_matrix();
        let proj = camera.projection_matrix(window.aspect_ratio(), depth_range);
        renderer.draw_scene(
            &world,
            &meshes,
            &view,
            &proj,
            camera.position,
            &frame,
            viewport,
        );

        window.swap();

        if let Some(fps) = timer.take_fps_report() {
            debug!(
                "{fps:.1} fps, {} active lights, {rendered} shadow maps",
                frame.active_lights()
            );
        }
        if args.frames != 0 && timer.frame >= args.frames {
            info!("rendered {} frames", timer.frame);
            break;
        }
    }

    // Release shadow targets while the GL context is still current.
    let mut backend = GlShadowBackend {
        targets: &mut targets,
        meshes: &meshes,
    };
    for entity in lights {
        if let Err(err) = despawn_light(&mut world, entity, &mut backend) {
            warn!("despawn {entity:?}: {err}");
        }
    }

    Ok(())
}
