mod light_sync;
mod lighting;
mod shadow;
mod transform;

pub use light_sync::light_transform_system;
pub use lighting::lighting_aggregation_system;
pub use shadow::shadow_caster_system;
pub use transform::transform_propagation_system;
