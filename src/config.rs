use clap::Args;

/// Shadow caster defaults, overridable from the command line.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct ShadowConfig {
    /// Edge length of each shadow map in texels.
    #[arg(long, default_value_t = 2048)]
    pub shadow_resolution: u32,

    /// Half-width of the directional light's orthographic frustum.
    #[arg(long, default_value_t = 20.0)]
    pub ortho_half_extent: f32,

    /// Near clip distance for spot and point shadow views.
    #[arg(long, default_value_t = 0.1)]
    pub near_plane: f32,

    /// Far clip distance for every shadow view.
    #[arg(long, default_value_t = 100.0)]
    pub far_plane: f32,

    /// How far behind its origin a directional shadow view starts capturing.
    #[arg(long, default_value_t = 50.0)]
    pub directional_near_offset: f32,

    /// Depth bias applied when comparing against shadow maps.
    #[arg(long, default_value_t = 0.005)]
    pub shadow_bias: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            shadow_resolution: 2048,
            ortho_half_extent: 20.0,
            near_plane: 0.1,
            far_plane: 100.0,
            directional_near_offset: 50.0,
            shadow_bias: 0.005,
        }
    }
}
