use glam::Mat4;
use hecs::{Entity, World};
use log::{debug, warn};

use crate::components::{GlobalTransform, LightSource, PublishedShadow};
use crate::shadow::{
    DepthRange, ShadowBackend, ShadowCaster, ShadowMapHandle, ShadowViewpoint, TargetKind,
};

struct ShadowJob {
    entity: Entity,
    map: ShadowMapHandle,
    viewpoint: ShadowViewpoint,
    published: Mat4,
}

/// Renders every enabled caster's depth target and publishes the map and
/// world-to-texture matrix into its light. Casters that cannot render this
/// frame are skipped and keep whatever they published last.
///
/// Returns the number of casters rendered.
pub fn shadow_caster_system(
    world: &mut World,
    backend: &mut dyn ShadowBackend,
    depth_range: DepthRange,
) -> usize {
    let mut jobs = Vec::new();

    for (entity, (caster, light, transform)) in world.query_mut::<(
        &mut ShadowCaster,
        Option<&mut LightSource>,
        Option<&GlobalTransform>,
    )>() {
        let Some(light) = light else {
            debug!("shadow caster {entity:?} has no LightSource, skipping");
            continue;
        };
        if transform.is_none() {
            debug!("shadow caster {entity:?} has no viewpoint transform, skipping");
            continue;
        }
        if !light.enabled || !light.casts_shadow {
            continue;
        }

        let wanted = TargetKind::for_light(light.kind);
        let map = match caster.target() {
            Some(map) if map.kind == wanted => map,
            stale => {
                // Light kind changed since attach: swap target shape.
                if let Some(old) = stale {
                    backend.release(old);
                }
                caster.set_target(None);
                match backend.allocate(wanted, caster.resolution) {
                    Ok(map) => {
                        caster.set_target(Some(map));
                        map
                    }
                    Err(err) => {
                        warn!("{entity:?} continues unshadowed: {err}");
                        light.casts_shadow = false;
                        light.clear_shadow();
                        continue;
                    }
                }
            }
        };

        let (viewpoint, published) = caster.compute_viewpoint(light, depth_range);
        jobs.push(ShadowJob {
            entity,
            map,
            viewpoint,
            published,
        });
    }

    for job in &jobs {
        for pass in job.viewpoint.passes() {
            backend.render_depth(world, job.map, pass);
        }
    }

    for job in &jobs {
        if let Ok(mut light) = world.get::<&mut LightSource>(job.entity) {
            light.publish_shadow(PublishedShadow {
                map: job.map,
                view_projection: job.published,
            });
        }
    }

    jobs.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::LocalTransform;
    use crate::shadow::testing::RecordingBackend;
    use crate::shadow::{attach_shadow_caster, CubeFace};
    use crate::systems::light_transform_system;
    use glam::Vec3;

    fn spawn_light(world: &mut World, light: LightSource, local: LocalTransform) -> Entity {
        world.spawn((GlobalTransform(local.matrix()), local, light))
    }

    fn in_unit_cube(p: Vec3) -> bool {
        p.cmpge(Vec3::ZERO).all() && p.cmple(Vec3::ONE).all()
    }

    #[test]
    fn spot_matrix_maps_visible_points_into_texture_space() {
        for range in [DepthRange::ZeroToOne, DepthRange::NegOneToOne] {
            let mut world = World::new();
            let mut backend = RecordingBackend::default();
            let pos = Vec3::new(5.0, 6.0, 5.0);
            let light = spawn_light(
                &mut world,
                LightSource::spot(Vec3::ONE, 3.0, 15.0, 30.0),
                LocalTransform::looking_along(pos, Vec3::NEG_Y),
            );
            attach_shadow_caster(&mut world, light, ShadowCaster::default(), &mut backend)
                .unwrap();
            light_transform_system(&mut world);

            assert_eq!(shadow_caster_system(&mut world, &mut backend, range), 1);

            let m = world
                .get::<&LightSource>(light)
                .unwrap()
                .shadow().map(|s| s.view_projection)
                .unwrap();
            // Directly below on the ground, and a bit off-axis inside the cone.
            for p in [Vec3::new(5.0, 0.0, 5.0), Vec3::new(7.0, 0.0, 4.0)] {
                let tex = m.project_point3(p);
                assert!(in_unit_cube(tex), "{range:?} {p} -> {tex}");
            }
            // Behind the light and far outside the cone.
            for p in [Vec3::new(5.0, 20.0, 5.0), Vec3::new(40.0, 0.0, 5.0)] {
                let tex = m.project_point3(p);
                assert!(!in_unit_cube(tex), "{range:?} {p} -> {tex}");
            }
        }
    }

    #[test]
    fn directional_matrix_covers_ortho_box() {
        let mut world = World::new();
        let mut backend = RecordingBackend::default();
        let light = spawn_light(
            &mut world,
            LightSource::directional(Vec3::ONE, 1.0),
            LocalTransform::looking_along(Vec3::new(0.0, 10.0, 0.0), Vec3::new(-0.5, -1.0, -0.3)),
        );
        attach_shadow_caster(&mut world, light, ShadowCaster::default(), &mut backend).unwrap();
        light_transform_system(&mut world);
        shadow_caster_system(&mut world, &mut backend, DepthRange::NegOneToOne);

        let m = world
            .get::<&LightSource>(light)
            .unwrap()
            .shadow().map(|s| s.view_projection)
            .unwrap();
        for p in [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(3.0, 1.0, -4.0),
            // Behind the nominal light origin.
            Vec3::new(2.0, 25.0, 1.0),
        ] {
            let tex = m.project_point3(p);
            assert!(in_unit_cube(tex), "{p} -> {tex}");
        }
        assert!(!in_unit_cube(m.project_point3(Vec3::new(60.0, 0.0, 0.0))));
    }

    #[test]
    fn point_light_renders_six_faces_and_publishes_identity() {
        let mut world = World::new();
        let mut backend = RecordingBackend::default();
        let light = spawn_light(
            &mut world,
            LightSource::point(Vec3::ONE, 2.0),
            LocalTransform::new(Vec3::new(3.0, 3.0, 0.0)),
        );
        attach_shadow_caster(&mut world, light, ShadowCaster::default(), &mut backend).unwrap();
        light_transform_system(&mut world);
        shadow_caster_system(&mut world, &mut backend, DepthRange::NegOneToOne);

        let faces: Vec<_> = backend.rendered.iter().map(|(_, pass)| pass.face).collect();
        assert_eq!(faces, CubeFace::ALL.map(Some).to_vec());
        assert!(backend.rendered.iter().all(|(map, _)| map.kind == TargetKind::Cube));

        let light = world.get::<&LightSource>(light).unwrap();
        let shadow = light.shadow().unwrap();
        assert_eq!(shadow.view_projection, Mat4::IDENTITY);
        assert_eq!(shadow.map.kind, TargetKind::Cube);
    }

    #[test]
    fn disabled_light_keeps_last_published_shadow() {
        let mut world = World::new();
        let mut backend = RecordingBackend::default();
        let light = spawn_light(
            &mut world,
            LightSource::spot(Vec3::ONE, 1.0, 20.0, 30.0),
            LocalTransform::looking_along(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y),
        );
        attach_shadow_caster(&mut world, light, ShadowCaster::default(), &mut backend).unwrap();
        light_transform_system(&mut world);
        shadow_caster_system(&mut world, &mut backend, DepthRange::ZeroToOne);
        let before = *world.get::<&LightSource>(light).unwrap().shadow().unwrap();

        world.get::<&mut LightSource>(light).unwrap().enabled = false;
        backend.rendered.clear();
        assert_eq!(
            shadow_caster_system(&mut world, &mut backend, DepthRange::ZeroToOne),
            0
        );

        assert!(backend.rendered.is_empty());
        assert_eq!(world.get::<&LightSource>(light).unwrap().shadow(), Some(&before));
    }

    #[test]
    fn caster_without_transform_is_skipped() {
        let mut world = World::new();
        let mut backend = RecordingBackend::default();
        let light = world.spawn((LightSource::directional(Vec3::ONE, 1.0),));
        attach_shadow_caster(&mut world, light, ShadowCaster::default(), &mut backend).unwrap();

        assert_eq!(
            shadow_caster_system(&mut world, &mut backend, DepthRange::NegOneToOne),
            0
        );
        assert!(world.get::<&LightSource>(light).unwrap().shadow().is_none());
    }

    #[test]
    fn orphan_caster_is_skipped() {
        let mut world = World::new();
        let mut backend = RecordingBackend::default();
        world.spawn((
            ShadowCaster::default(),
            GlobalTransform(Mat4::IDENTITY),
        ));
        assert_eq!(
            shadow_caster_system(&mut world, &mut backend, DepthRange::NegOneToOne),
            0
        );
        assert!(backend.rendered.is_empty());
    }

    #[test]
    fn kind_change_reallocates_target_shape() {
        let mut world = World::new();
        let mut backend = RecordingBackend::default();
        let light = spawn_light(
            &mut world,
            LightSource::spot(Vec3::ONE, 1.0, 20.0, 30.0),
            LocalTransform::new(Vec3::new(0.0, 4.0, 0.0)),
        );
        attach_shadow_caster(&mut world, light, ShadowCaster::default(), &mut backend).unwrap();
        world.get::<&mut LightSource>(light).unwrap().kind = crate::components::LightKind::Point;

        light_transform_system(&mut world);
        shadow_caster_system(&mut world, &mut backend, DepthRange::NegOneToOne);

        assert_eq!(backend.released.len(), 1);
        assert_eq!(backend.live.len(), 1);
        assert_eq!(backend.live[0].kind, TargetKind::Cube);
        assert_eq!(
            world.get::<&ShadowCaster>(light).unwrap().target(),
            Some(backend.live[0])
        );
    }
}
