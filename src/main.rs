//! Headless demo of the transform passes

use scene_transform::prelude::*;

/// Number of simulated ticks
const TICKS: u32 = 5;

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => TransformConfig::load_ron(path)?,
        None => TransformConfig::default(),
    };

    let mut world = World::new();
    let ship = world.spawn_named("ship", Transform::from_position(Vec3::new(0.0, 0.0, -10.0)));
    let turret = world.spawn_child(
        ship,
        (Name::new("turret"), Transform::from_position(Vec3::Y)),
    )?;
    let barrel = world.spawn_child(
        turret,
        (Name::new("barrel"), Transform::from_position(Vec3::new(0.0, 0.0, -1.5))),
    )?;
    let crate_entity = world.spawn_named("crate", Transform::from_position(Vec3::new(4.0, 0.0, 0.0)));

    let mut system = TransformSystem::new(config);
    system.update(&mut world);

    for tick in 0..TICKS {
        // Gameplay edits local values
        if let Ok(mut transform) = world.get_mut::<Transform>(ship) {
            transform.translate(Vec3::new(0.0, 0.0, 1.0));
        }
        if let Ok(mut transform) = world.get_mut::<Transform>(turret) {
            transform.set_local_rotation(Quat::from_rotation_y(0.25 * tick as f32));
        }
        // Physics writes world values directly
        if let Ok(mut transform) = world.get_mut::<Transform>(crate_entity) {
            transform.set_world_position(Vec3::new(4.0, -0.5 * tick as f32, 0.0));
        }

        let report = system.update(&mut world);
        let barrel_world = world.transform(barrel).map(|t| t.world_position());
        log::info!(
            "tick {tick}: {} recomputed, {} reconciled, barrel at {barrel_world:?}",
            report.stats.recomputed,
            report.stats.reconciled
        );
    }

    // Pick the crate up without moving it
    system.propagator(&mut world).reparent(crate_entity, Some(barrel))?;
    if let Some(transform) = world.transform(crate_entity) {
        log::info!(
            "crate local {:?} world {:?}",
            transform.local_position(),
            transform.world_position()
        );
    }

    log::info!("{}", system.history().format_stats());

    let scene = Scene::capture("demo", &world);
    log::info!("Captured {} entities", scene.entity_count());
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Demo error: {}", e);
    }
}
