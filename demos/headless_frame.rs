//! Runs a few frames of the ray marching effect on the headless host and
//! prints what each frame did.
//!
//! ```sh
//! RUST_LOG=debug cargo run --example headless_frame -- '{"maximumIterationCount": 48}'
//! ```

use glam::{Affine3A, Vec3, Vec4};

use myth_raymarch::headless::{CpuImage, HostEvent};
use myth_raymarch::host::CameraBackend;
use myth_raymarch::material::{Material, names};
use myth_raymarch::raymarch::{RAY_MARCHING_SHADER, RayMarchUniforms};
use myth_raymarch::{
    CameraEffectStack, CameraState, HeadlessHost, RayMarchSettings, ScreenSpaceRayMarching,
    ShaderLibrary,
};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match std::env::args().nth(1) {
        Some(json) => RayMarchSettings::from_json(&json)?,
        None => RayMarchSettings::default(),
    };
    log::info!("Settings: {}", settings.to_json()?);

    let mut host = HeadlessHost::with_standard_shaders();
    if let Some(shader) = host.find_shader(RAY_MARCHING_SHADER) {
        // Tint by iteration budget so the composite is visible in the output.
        host.set_program(
            shader,
            Box::new(|material: &Material, src: &CpuImage, dst: &mut CpuImage| {
                let steps = material.float(names::MAXIMUM_ITERATION_COUNT).unwrap_or(0.0);
                for y in 0..dst.height() {
                    for x in 0..dst.width() {
                        let c = src.read(x, y);
                        dst.write(x, y, c.lerp(Vec4::new(steps / 1024.0, 0.0, 0.0, 1.0), 0.5));
                    }
                }
            }),
        );
    }

    let camera = host.add_camera(CameraState::new_perspective(90.0, 512, 512, 0.1, 100.0));
    let source = host.create_image(512, 512)?;
    let destination = host.create_image(512, 512)?;

    let effect = ScreenSpaceRayMarching::attach(&host, camera, settings)?;
    let mut stack = CameraEffectStack::new(camera);
    stack.push(&mut host, Box::new(effect));

    for frame in 0..3 {
        if let Some(primary) = host.camera_mut(camera) {
            let eye = Vec3::new(frame as f32, 1.5, 6.0);
            primary.set_world_transform(Affine3A::from_translation(eye));
        }

        stack.render_frame(&mut host, source, destination, |_| Ok(()))?;

        for event in host.take_events() {
            match event {
                HostEvent::Blit(record) => {
                    let uniforms = record
                        .material
                        .as_ref()
                        .and_then(|(m, _)| RayMarchUniforms::from_material(m));
                    log::info!(
                        "frame {frame}: blit {:?} -> {:?}, {} uniform bytes",
                        record.source,
                        record.destination,
                        uniforms.map_or(0, |u| u.as_bytes().len())
                    );
                }
                other => log::debug!("frame {frame}: {other:?}"),
            }
        }
    }

    log::info!(
        "Pool: {} allocation(s), {} free target(s)",
        host.pool().allocation_count(),
        host.pool().free_count()
    );

    stack.shutdown(&mut host);
    Ok(())
}
