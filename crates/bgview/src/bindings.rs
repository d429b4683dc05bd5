use backdrop::{
    BlendMode, ColorSpaceMode, FilterMode, FitMode, RendererConfig, Sampling, ShaderTier, WrapMode,
};
use bgconfig::{Blend, ColorSpace, Config, Filter, Fit, Tier, Wrap};

use crate::cli::RunArgs;

pub fn map_fit(fit: Fit) -> FitMode {
    match fit {
        Fit::Stretch => FitMode::Stretch,
        Fit::Center => FitMode::Center,
        Fit::Contain => FitMode::Contain,
        Fit::Cover => FitMode::Cover,
    }
}

pub fn map_wrap(wrap: Wrap) -> WrapMode {
    match wrap {
        Wrap::Repeat => WrapMode::Repeat,
        Wrap::Clamp => WrapMode::Clamp,
        Wrap::Mirror => WrapMode::Mirror,
    }
}

pub fn map_filter(filter: Filter) -> FilterMode {
    match filter {
        Filter::Nearest => FilterMode::Nearest,
        Filter::Linear => FilterMode::Linear,
    }
}

pub fn map_blend(blend: Blend) -> BlendMode {
    match blend {
        Blend::Alpha => BlendMode::Alpha,
        Blend::Replace => BlendMode::Replace,
    }
}

pub fn map_tier(tier: Tier) -> ShaderTier {
    match tier {
        Tier::Legacy => ShaderTier::Legacy,
        Tier::Modern => ShaderTier::Modern,
    }
}

pub fn map_color_space(color_space: ColorSpace) -> ColorSpaceMode {
    match color_space {
        ColorSpace::Auto => ColorSpaceMode::Auto,
        ColorSpace::Gamma => ColorSpaceMode::Gamma,
        ColorSpace::Linear => ColorSpaceMode::Linear,
    }
}

/// Builds the renderer configuration from the file, then lets CLI flags win.
pub fn renderer_config(config: &Config, args: &RunArgs) -> RendererConfig {
    let defaults = RendererConfig::default();
    let background = &config.background;

    RendererConfig {
        surface_size: args.size.unwrap_or(defaults.surface_size),
        image: args.image.clone().or_else(|| background.image.clone()),
        opacity: args.opacity.unwrap_or(config.window.opacity),
        clear_color: config.window.clear_color.0,
        fit: args.fit.unwrap_or_else(|| map_fit(background.fit)),
        sampling: Sampling {
            wrap: args.wrap.unwrap_or_else(|| map_wrap(background.wrap)),
            filter: args.filter.unwrap_or_else(|| map_filter(background.filter)),
        },
        blend: map_blend(background.blend),
        tier: args.tier.unwrap_or_else(|| map_tier(background.tier)),
        color_space: args
            .color_space
            .unwrap_or_else(|| map_color_space(background.color_space)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    #[test]
    fn config_file_values_reach_renderer() {
        let config = Config::from_toml_str(
            r##"
[window]
opacity = 0.6
clear_color = "#ff0000"

[background]
image = "/srv/bg.png"
fit = "contain"
wrap = "mirror"
blend = "replace"
"##,
        )
        .unwrap();

        let resolved = renderer_config(&config, &RunArgs::default());
        assert_eq!(resolved.opacity, 0.6);
        assert_eq!(resolved.clear_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(resolved.image.as_deref(), Some(Path::new("/srv/bg.png")));
        assert_eq!(resolved.fit, FitMode::Contain);
        assert_eq!(resolved.sampling.wrap, WrapMode::Mirror);
        assert_eq!(resolved.sampling.filter, FilterMode::Nearest);
        assert_eq!(resolved.blend, BlendMode::Replace);
        assert_eq!(resolved.tier, ShaderTier::Modern);
        assert_eq!(resolved.surface_size, RendererConfig::default().surface_size);
    }

    #[test]
    fn cli_flags_override_config() {
        let config = Config::from_toml_str("[window]\nopacity = 0.6\n").unwrap();
        let args = RunArgs {
            image: Some(PathBuf::from("/tmp/cli.png")),
            opacity: Some(0.25),
            fit: Some(FitMode::Stretch),
            tier: Some(ShaderTier::Legacy),
            size: Some((320, 200)),
            ..RunArgs::default()
        };

        let resolved = renderer_config(&config, &args);
        assert_eq!(resolved.opacity, 0.25);
        assert_eq!(resolved.image.as_deref(), Some(Path::new("/tmp/cli.png")));
        assert_eq!(resolved.fit, FitMode::Stretch);
        assert_eq!(resolved.tier, ShaderTier::Legacy);
        assert_eq!(resolved.surface_size, (320, 200));
    }
}
