use std::path::PathBuf;

use backdrop::{ColorSpaceMode, FilterMode, FitMode, ShaderTier, Stage, WrapMode};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "bgview",
    author,
    version,
    about = "Preview and inspect the terminal background-image layer"
)]
pub struct Cli {
    /// Config file; defaults to `<config dir>/bgview/config.toml`.
    #[arg(long, value_name = "PATH", global = true, env = "BGVIEW_CONFIG")]
    pub config: Option<PathBuf>,
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Overrides applied on top of the config file for the preview window.
#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Background image to display.
    #[arg(long, value_name = "PATH")]
    pub image: Option<PathBuf>,

    /// Background opacity in [0, 1].
    #[arg(long, value_name = "ALPHA", value_parser = parse_opacity)]
    pub opacity: Option<f32>,

    /// Fit mode: `stretch`, `center`, `contain`, or `cover`.
    #[arg(long, value_name = "MODE", value_parser = parse_fit)]
    pub fit: Option<FitMode>,

    /// Shader binding tier: `modern` or `legacy`.
    #[arg(long, value_name = "TIER", value_parser = parse_tier)]
    pub tier: Option<ShaderTier>,

    /// Wrap mode for coordinates outside the image: `repeat`, `clamp`, or `mirror`.
    #[arg(long, value_name = "MODE", value_parser = parse_wrap)]
    pub wrap: Option<WrapMode>,

    /// Texture filter: `nearest` or `linear`.
    #[arg(long, value_name = "MODE", value_parser = parse_filter)]
    pub filter: Option<FilterMode>,

    /// Output color space handling: `auto`, `gamma`, or `linear`.
    #[arg(long, value_name = "MODE", value_parser = parse_color_space)]
    pub color_space: Option<ColorSpaceMode>,

    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size)]
    pub size: Option<(u32, u32)>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the GLSL sources of the background pass.
    Shaders(ShadersArgs),
    /// Validate the config file and print the resolved settings.
    Check,
}

#[derive(Parser, Debug)]
pub struct ShadersArgs {
    /// Binding tier to print.
    #[arg(long, value_name = "TIER", value_parser = parse_tier, default_value = "modern")]
    pub tier: ShaderTier,

    /// Print only one stage: `vertex` or `fragment`.
    #[arg(long, value_name = "STAGE", value_parser = parse_stage)]
    pub stage: Option<Stage>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

fn normalise(value: &str, what: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{what} must not be empty"));
    }
    Ok(trimmed.to_ascii_lowercase())
}

pub fn parse_tier(value: &str) -> Result<ShaderTier, String> {
    match normalise(value, "shader tier")?.as_str() {
        "modern" | "core" | "450" => Ok(ShaderTier::Modern),
        "legacy" | "gles2" | "100" => Ok(ShaderTier::Legacy),
        other => Err(format!(
            "unknown shader tier '{other}'; expected modern or legacy"
        )),
    }
}

pub fn parse_stage(value: &str) -> Result<Stage, String> {
    match normalise(value, "shader stage")?.as_str() {
        "vertex" | "vert" => Ok(Stage::Vertex),
        "fragment" | "frag" => Ok(Stage::Fragment),
        other => Err(format!(
            "unknown shader stage '{other}'; expected vertex or fragment"
        )),
    }
}

pub fn parse_fit(value: &str) -> Result<FitMode, String> {
    match normalise(value, "fit mode")?.as_str() {
        "stretch" | "fill" => Ok(FitMode::Stretch),
        "center" | "centre" | "none" => Ok(FitMode::Center),
        "contain" | "fit" => Ok(FitMode::Contain),
        "cover" => Ok(FitMode::Cover),
        other => Err(format!(
            "unknown fit mode '{other}'; expected stretch, center, contain, or cover"
        )),
    }
}

pub fn parse_wrap(value: &str) -> Result<WrapMode, String> {
    match normalise(value, "wrap mode")?.as_str() {
        "repeat" | "tile" => Ok(WrapMode::Repeat),
        "clamp" => Ok(WrapMode::Clamp),
        "mirror" => Ok(WrapMode::Mirror),
        other => Err(format!(
            "unknown wrap mode '{other}'; expected repeat, clamp, or mirror"
        )),
    }
}

pub fn parse_filter(value: &str) -> Result<FilterMode, String> {
    match normalise(value, "filter")?.as_str() {
        "nearest" => Ok(FilterMode::Nearest),
        "linear" | "bilinear" => Ok(FilterMode::Linear),
        other => Err(format!(
            "unknown filter '{other}'; expected nearest or linear"
        )),
    }
}

pub fn parse_color_space(value: &str) -> Result<ColorSpaceMode, String> {
    match normalise(value, "color space")?.as_str() {
        "auto" => Ok(ColorSpaceMode::Auto),
        "gamma" | "srgb-off" => Ok(ColorSpaceMode::Gamma),
        "linear" | "srgb" => Ok(ColorSpaceMode::Linear),
        other => Err(format!(
            "unknown color space '{other}'; expected auto, gamma, or linear"
        )),
    }
}

pub fn parse_opacity(value: &str) -> Result<f32, String> {
    let opacity: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid opacity '{value}'"))?;
    if !(0.0..=1.0).contains(&opacity) {
        return Err(format!("opacity must be within [0, 1], got {opacity}"));
    }
    Ok(opacity)
}

pub fn parse_surface_size(spec: &str) -> Result<(u32, u32), String> {
    let (width, height) = spec
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WxH format, e.g. 1280x800".to_string())?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| "invalid width in size specification".to_string())?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| "invalid height in size specification".to_string())?;

    if width == 0 || height == 0 {
        return Err("surface dimensions must be greater than zero".to_string());
    }

    Ok((width, height))
}
