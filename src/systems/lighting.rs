use glam::{Mat4, Vec4};
use hecs::World;
use log::trace;

use crate::components::{LightKind, LightSource};
use crate::lighting::{LightingFrame, TextureBinding, MAX_LIGHTS};
use crate::shadow::ShadowCaster;

/// Scans every enabled light and packs up to `MAX_LIGHTS` of them, in entity
/// id order, into a fresh `LightingFrame`. Extra lights are dropped for the
/// frame. `default_bias` is published when no slot carries a shadow caster.
pub fn lighting_aggregation_system(world: &World, default_bias: f32) -> LightingFrame {
    let mut frame = LightingFrame::empty(default_bias);

    let mut query = world.query::<(&LightSource, Option<&ShadowCaster>)>();
    let mut lights: Vec<_> = query
        .iter()
        .filter(|(_, (light, _))| light.enabled)
        .collect();
    // Archetype iteration order shifts when components are added or removed;
    // entity ids don't.
    lights.sort_by_key(|(entity, _)| entity.id());

    if lights.len() > MAX_LIGHTS {
        trace!(
            "{} enabled lights, dropping {} beyond slot {}",
            lights.len(),
            lights.len() - MAX_LIGHTS,
            MAX_LIGHTS - 1
        );
    }

    let mut bias = None;
    for (slot, (_, (light, caster))) in lights.iter().take(MAX_LIGHTS).enumerate() {
        frame.light_pos[slot] = light.position().extend(1.0);
        frame.light_dir[slot] = light.direction().extend(0.0);
        frame.light_col[slot] = (light.color * light.intensity()).extend(light.kind.tag());
        frame.light_atten[slot] = light.attenuation.extend(0.0);
        frame.spot_params[slot] = Vec4::new(
            light.outer_cone_deg().to_radians().cos(),
            light.inner_cone_deg().to_radians().cos(),
            0.0,
            0.0,
        );

        match light.shadow().filter(|_| light.casts_shadow) {
            Some(shadow) => {
                frame.shadow_matrices[slot] = shadow.view_projection;
                frame.shadow_enabled[slot] = 1.0;
                if light.kind == LightKind::Point {
                    frame.shadow_cube_maps[slot] = TextureBinding::Map(shadow.map);
                } else {
                    frame.shadow_maps[slot] = TextureBinding::Map(shadow.map);
                }
                if bias.is_none() {
                    bias = caster.map(|c| c.bias);
                }
            }
            None => frame.shadow_matrices[slot] = Mat4::IDENTITY,
        }

        frame.active_light_count += 1;
    }

    if let Some(bias) = bias {
        frame.shadow_bias = bias;
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{GlobalTransform, LocalTransform, PublishedShadow};
    use crate::shadow::testing::RecordingBackend;
    use crate::shadow::{attach_shadow_caster, DepthRange, TargetKind};
    use crate::systems::{light_transform_system, shadow_caster_system};
    use approx::assert_relative_eq;
    use glam::Vec3;
    use hecs::Entity;

    const BIAS: f32 = 0.005;

    fn spawn_light(world: &mut World, light: LightSource, local: LocalTransform) -> Entity {
        world.spawn((GlobalTransform(local.matrix()), local, light))
    }

    fn frame_for(world: &mut World) -> LightingFrame {
        light_transform_system(world);
        lighting_aggregation_system(world, BIAS)
    }

    fn assert_tail_neutral(frame: &LightingFrame) {
        for i in frame.active_lights()..MAX_LIGHTS {
            assert!(frame.slot_is_neutral(i), "slot {i} not neutral: {frame:?}");
        }
    }

    #[test]
    fn empty_scene_publishes_nothing() {
        let mut world = World::new();
        let frame = frame_for(&mut world);
        assert_eq!(frame.active_light_count, 0);
        assert_eq!(frame, LightingFrame::empty(BIAS));
        assert_tail_neutral(&frame);
    }

    #[test]
    fn unshadowed_directional_fills_slot_zero() {
        let mut world = World::new();
        let dir = Vec3::new(-0.5, -1.0, -0.3).normalize();
        spawn_light(
            &mut world,
            LightSource::directional(Vec3::new(1.0, 0.5, 0.25), 2.0),
            LocalTransform::looking_along(Vec3::new(0.0, 10.0, 0.0), dir),
        );

        let frame = frame_for(&mut world);
        assert_eq!(frame.active_light_count, 1);
        assert_eq!(frame.light_col[0], Vec4::new(2.0, 1.0, 0.5, 0.0));
        assert!(frame.light_dir[0].abs_diff_eq(dir.extend(0.0), 1e-5));
        assert_eq!(frame.light_pos[0], Vec4::new(0.0, 10.0, 0.0, 1.0));
        assert_eq!(frame.light_atten[0], Vec4::new(1.0, 0.09, 0.032, 0.0));
        assert_eq!(frame.shadow_enabled[0], 0.0);
        assert_eq!(frame.shadow_matrices[0], Mat4::IDENTITY);
        assert!(frame.shadow_maps[0].is_neutral());
        assert!(frame.shadow_cube_maps[0].is_neutral());
        assert_tail_neutral(&frame);
    }

    #[test]
    fn shadowed_point_light_binds_cube_slot() {
        let mut world = World::new();
        let mut backend = RecordingBackend::default();
        let light = spawn_light(
            &mut world,
            LightSource::point(Vec3::ONE, 1.0),
            LocalTransform::new(Vec3::new(3.0, 3.0, 0.0)),
        );
        attach_shadow_caster(&mut world, light, Default::default(), &mut backend).unwrap();
        light_transform_system(&mut world);
        shadow_caster_system(&mut world, &mut backend, DepthRange::NegOneToOne);

        let frame = lighting_aggregation_system(&world, BIAS);
        let map = world.get::<&LightSource>(light).unwrap().shadow().map(|s| s.map).unwrap();
        assert_eq!(map.kind, TargetKind::Cube);
        assert_eq!(frame.shadow_cube_maps[0], TextureBinding::Map(map));
        assert!(frame.shadow_maps[0].is_neutral());
        assert_eq!(frame.shadow_matrices[0], Mat4::IDENTITY);
        assert_eq!(frame.shadow_enabled[0], 1.0);
        assert_eq!(frame.light_col[0].w, 1.0);
    }

    #[test]
    fn shadowed_spot_light_binds_flat_slot_and_caster_bias() {
        let mut world = World::new();
        let mut backend = RecordingBackend::default();
        let light = spawn_light(
            &mut world,
            LightSource::spot(Vec3::ONE, 1.0, 20.0, 30.0),
            LocalTransform::looking_along(Vec3::new(0.0, 6.0, 0.0), Vec3::NEG_Y),
        );
        let mut caster = ShadowCaster::default();
        caster.bias = 0.02;
        attach_shadow_caster(&mut world, light, caster, &mut backend).unwrap();
        light_transform_system(&mut world);
        shadow_caster_system(&mut world, &mut backend, DepthRange::ZeroToOne);

        let frame = lighting_aggregation_system(&world, BIAS);
        let published = world.get::<&LightSource>(light).unwrap().shadow().copied().unwrap();
        assert_eq!(frame.shadow_maps[0], TextureBinding::Map(published.map));
        assert!(frame.shadow_cube_maps[0].is_neutral());
        assert_eq!(frame.shadow_matrices[0], published.view_projection);
        assert_eq!(frame.shadow_bias, 0.02);
    }

    #[test]
    fn shadow_is_ignored_when_casting_is_off() {
        let mut world = World::new();
        let mut light = LightSource::spot(Vec3::ONE, 1.0, 20.0, 30.0);
        light.publish_shadow(PublishedShadow {
            map: crate::shadow::ShadowMapHandle::flat(9),
            view_projection: Mat4::from_scale(Vec3::splat(0.5)),
        });
        spawn_light(&mut world, light, LocalTransform::new(Vec3::ZERO));

        let frame = frame_for(&mut world);
        assert_eq!(frame.shadow_enabled[0], 0.0);
        assert!(frame.shadow_maps[0].is_neutral());
        assert_eq!(frame.shadow_matrices[0], Mat4::IDENTITY);
        assert_eq!(frame.shadow_bias, BIAS);
    }

    #[test]
    fn fifth_light_is_dropped_in_stable_order() {
        let mut world = World::new();
        let mut spawned = Vec::new();
        for i in 0..5 {
            let pos = Vec3::new(i as f32, 1.0, 0.0);
            spawned.push(spawn_light(
                &mut world,
                LightSource::point(Vec3::ONE, 1.0),
                LocalTransform::new(pos),
            ));
        }
        // Move the first light to a different archetype; slot order must not change.
        world.insert_one(spawned[0], crate::components::NoShadow).unwrap();

        let frame = frame_for(&mut world);
        assert_eq!(frame.active_light_count, 4);
        for slot in 0..4 {
            assert_eq!(frame.light_pos[slot].x, slot as f32);
        }
        assert_eq!(frame, lighting_aggregation_system(&world, BIAS));
    }

    #[test]
    fn disabled_lights_are_not_counted() {
        let mut world = World::new();
        for i in 0..6 {
            let mut light = LightSource::point(Vec3::ONE, 1.0);
            light.enabled = i % 2 == 0;
            spawn_light(&mut world, light, LocalTransform::new(Vec3::splat(i as f32)));
        }
        let frame = frame_for(&mut world);
        assert_eq!(frame.active_light_count, 3);
        assert_eq!(frame.light_pos[1].x, 2.0);
        assert_tail_neutral(&frame);
    }

    #[test]
    fn active_count_is_min_of_capacity_and_enabled() {
        for n in 0..7 {
            let mut world = World::new();
            for _ in 0..n {
                spawn_light(
                    &mut world,
                    LightSource::directional(Vec3::ONE, 1.0),
                    LocalTransform::new(Vec3::ZERO),
                );
            }
            let frame = frame_for(&mut world);
            assert_eq!(frame.active_lights(), n.min(MAX_LIGHTS));
            assert_tail_neutral(&frame);
        }
    }

    #[test]
    fn spot_cosines_match_cone_angles() {
        let mut world = World::new();
        spawn_light(
            &mut world,
            LightSource::spot(Vec3::ONE, 1.0, 25.0, 30.0),
            LocalTransform::looking_along(Vec3::Y, Vec3::NEG_Y),
        );
        let frame = frame_for(&mut world);
        assert_relative_eq!(frame.spot_params[0].x, 0.866_025_4, epsilon = 1e-5);
        assert_relative_eq!(frame.spot_params[0].y, 0.906_307_8, epsilon = 1e-5);
        assert_eq!(frame.light_col[0].w, 2.0);
    }

    #[test]
    fn outer_cosine_never_exceeds_inner() {
        let mut world = World::new();
        for (inner, outer) in [(0.0, 0.0), (10.0, 45.0), (89.0, 90.0), (120.0, 180.0)] {
            spawn_light(
                &mut world,
                LightSource::spot(Vec3::ONE, 1.0, inner, outer),
                LocalTransform::new(Vec3::ZERO),
            );
        }
        let frame = frame_for(&mut world);
        for slot in 0..frame.active_lights() {
            let params = frame.spot_params[slot];
            assert!(params.x <= params.y, "slot {slot}: {params}");
        }
    }

    #[test]
    fn aggregation_is_idempotent() {
        let mut world = World::new();
        let mut backend = RecordingBackend::default();
        let sun = spawn_light(
            &mut world,
            LightSource::directional(Vec3::ONE, 1.0),
            LocalTransform::looking_along(Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y),
        );
        spawn_light(
            &mut world,
            LightSource::spot(Vec3::ONE, 1.0, 15.0, 30.0),
            LocalTransform::looking_along(Vec3::new(5.0, 6.0, 5.0), Vec3::NEG_Y),
        );
        attach_shadow_caster(&mut world, sun, Default::default(), &mut backend).unwrap();
        light_transform_system(&mut world);
        shadow_caster_system(&mut world, &mut backend, DepthRange::NegOneToOne);

        let first = lighting_aggregation_system(&world, BIAS);
        let second = lighting_aggregation_system(&world, BIAS);
        assert_eq!(first, second);
        assert_eq!(first.active_light_count, 2);
    }
}
