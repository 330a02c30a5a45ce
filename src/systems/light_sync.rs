use hecs::World;
use log::debug;

use crate::components::{GlobalTransform, LightSource};

/// Refreshes every light's position and forward direction from its
/// `GlobalTransform`. Lights without one keep last frame's values.
pub fn light_transform_system(world: &mut World) {
    for (entity, (light, transform)) in
        world.query_mut::<(&mut LightSource, Option<&GlobalTransform>)>()
    {
        match transform {
            Some(transform) => {
                light.position = transform.translation();
                light.direction = transform.forward();
            }
            None => debug!("light {entity:?} has no GlobalTransform, keeping last pose"),
        }
    }
}
