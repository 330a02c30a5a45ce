use hecs::Entity;

/// Errors raised by the lighting and shadow pipeline.
#[derive(thiserror::Error, Debug)]
pub enum LightingError {
    /// An entity is missing a component the pass needs this frame.
    #[error("entity {entity:?} has no {what}")]
    MissingDependency { entity: Entity, what: &'static str },

    /// A shadow render target could not be created.
    #[error("shadow target allocation failed at {resolution}x{resolution}: {reason}")]
    ResourceAllocation { resolution: u32, reason: String },

    #[error("{stage} shader compile error: {log}")]
    ShaderCompile { stage: &'static str, log: String },

    #[error("shader link error: {0}")]
    ShaderLink(String),
}

impl LightingError {
    pub fn allocation<T: ToString>(resolution: u32, reason: T) -> Self {
        LightingError::ResourceAllocation {
            resolution,
            reason: reason.to_string(),
        }
    }

    pub fn missing(entity: Entity, what: &'static str) -> Self {
        LightingError::MissingDependency { entity, what }
    }
}
