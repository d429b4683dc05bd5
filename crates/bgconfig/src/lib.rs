use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("failed to read configuration at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fit {
    Stretch,
    #[default]
    Center,
    Contain,
    Cover,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Wrap {
    #[default]
    Repeat,
    Clamp,
    Mirror,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Blend {
    #[default]
    Alpha,
    Replace,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Legacy,
    #[default]
    Modern,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    #[default]
    Auto,
    Gamma,
    Linear,
}

/// Straight RGBA colour with channels in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba(pub [f64; 4]);

impl Rgba {
    pub const BLACK: Rgba = Rgba([0.0, 0.0, 0.0, 1.0]);

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa`; the leading `#` is optional.
    pub fn from_hex(raw: &str) -> Result<Self, String> {
        let hex = raw.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(format!("invalid colour '{raw}': expected hex digits"));
        }

        let channel = |s: &str| u8::from_str_radix(s, 16).map(|v| f64::from(v) / 255.0);
        let parsed = match hex.len() {
            3 => {
                let expand = |i: usize| channel(&hex[i..i + 1].repeat(2));
                [expand(0), expand(1), expand(2), Ok(1.0)]
            }
            6 | 8 => [
                channel(&hex[0..2]),
                channel(&hex[2..4]),
                channel(&hex[4..6]),
                if hex.len() == 8 {
                    channel(&hex[6..8])
                } else {
                    Ok(1.0)
                },
            ],
            _ => {
                return Err(format!(
                    "invalid colour '{raw}': expected #rgb, #rrggbb or #rrggbbaa"
                ))
            }
        };

        let mut rgba = [0.0; 4];
        for (slot, value) in rgba.iter_mut().zip(parsed) {
            *slot = value.map_err(|err| format!("invalid colour '{raw}': {err}"))?;
        }
        Ok(Rgba(rgba))
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::BLACK
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Hex(String),
            Channels(Vec<f64>),
        }

        match Helper::deserialize(deserializer)? {
            Helper::Hex(raw) => Rgba::from_hex(&raw).map_err(de::Error::custom),
            Helper::Channels(channels) => match channels.as_slice() {
                [r, g, b] => Ok(Rgba([*r, *g, *b, 1.0])),
                [r, g, b, a] => Ok(Rgba([*r, *g, *b, *a])),
                other => Err(de::Error::custom(format!(
                    "colour arrays need 3 or 4 channels, got {}",
                    other.len()
                ))),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WindowSection {
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub clear_color: Rgba,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            opacity: default_opacity(),
            clear_color: Rgba::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackgroundSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<PathBuf>,
    #[serde(default)]
    pub fit: Fit,
    #[serde(default)]
    pub wrap: Wrap,
    #[serde(default)]
    pub filter: Filter,
    #[serde(default)]
    pub blend: Blend,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default)]
    pub color_space: ColorSpace,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub window: WindowSection,
    #[serde(default)]
    pub background: BackgroundSection,
}

fn default_opacity() -> f32 {
    1.0
}

impl Config {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: Config = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let opacity = self.window.opacity;
        if !(0.0..=1.0).contains(&opacity) {
            return Err(ConfigError::Invalid(format!(
                "window.opacity must be within [0, 1], got {opacity}"
            )));
        }

        if self
            .window
            .clear_color
            .0
            .iter()
            .any(|channel| !(0.0..=1.0).contains(channel))
        {
            return Err(ConfigError::Invalid(
                "window.clear_color channels must be within [0, 1]".into(),
            ));
        }

        if let Some(image) = &self.background.image {
            if image.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "background.image may not be empty".into(),
                ));
            }
        }

        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|err| ConfigError::Invalid(format!("failed to serialise configuration: {err}")))
    }
}
