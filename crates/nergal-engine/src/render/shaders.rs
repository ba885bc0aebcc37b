//! Built-in WGSL sources.
//!
//! Effect programs are looked up through [`ShaderCache`], so the built-ins are
//! registered there by name and may be included from user shaders
//! (`#include "fx_effect.wgsl"` gives an effect its bindings).

use crate::assets::ShaderCache;

/// Fullscreen vertex stage shared by effects and the composite pass.
pub const FX_VERTEX: &str = "fx_default.wgsl";
pub const FX_COMPOSITE: &str = "fx_composite.wgsl";
/// `params[0].x`: blend amount.
pub const FX_GRAYSCALE: &str = "fx_grayscale.wgsl";
/// `params[0].xy`: direction in texels.
pub const FX_BLUR: &str = "fx_blur.wgsl";
/// `params[0].x`: line count, `params[0].y`: darkness.
pub const FX_SCANLINES: &str = "fx_scanlines.wgsl";

const BUILTINS: [(&str, &str); 8] = [
    ("globals.wgsl", include_str!("shaders/globals.wgsl")),
    ("fx_common.wgsl", include_str!("shaders/fx_common.wgsl")),
    ("fx_effect.wgsl", include_str!("shaders/fx_effect.wgsl")),
    (FX_VERTEX, include_str!("shaders/fx_default.wgsl")),
    (FX_COMPOSITE, include_str!("shaders/fx_composite.wgsl")),
    (FX_GRAYSCALE, include_str!("shaders/fx_grayscale.wgsl")),
    (FX_BLUR, include_str!("shaders/fx_blur.wgsl")),
    (FX_SCANLINES, include_str!("shaders/fx_scanlines.wgsl")),
];

pub(crate) const PARTICLE_SHADER: &str = concat!(
    include_str!("shaders/globals.wgsl"),
    include_str!("shaders/particle.wgsl"),
);

pub fn register_builtin_shaders(cache: &mut ShaderCache) {
    for (name, source) in BUILTINS {
        cache.register_source(name, source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_sources_expand_with_bindings() {
        let mut cache = ShaderCache::new("unused");
        register_builtin_shaders(&mut cache);

        for name in [FX_GRAYSCALE, FX_BLUR, FX_SCANLINES] {
            let src = cache.preprocess(name).unwrap();
            assert_eq!(src.matches("struct FxVertexOut").count(), 1, "{name}");
            assert!(src.contains("var<uniform> params"), "{name}");
            assert!(src.contains("fn fs_main"), "{name}");
            assert!(!src.contains("#include"), "{name}");
        }

        let composite = cache.preprocess(FX_COMPOSITE).unwrap();
        assert!(!composite.contains("t_source"));
        assert!(cache.preprocess(FX_VERTEX).unwrap().contains("fn vs_main"));
    }
}
