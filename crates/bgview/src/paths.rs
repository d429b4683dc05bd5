use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

const QUALIFIER: &str = "";
const ORGANISATION: &str = "";
const APPLICATION: &str = "bgview";

const CONFIG_FILE: &str = "config.toml";

/// Where a config file came from; an implicit default may be absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLocation {
    Explicit(PathBuf),
    Default(PathBuf),
}

impl ConfigLocation {
    /// An explicit path (flag or `BGVIEW_CONFIG`) wins over the user config
    /// directory.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        match explicit {
            Some(path) if !path.as_os_str().is_empty() => Ok(Self::Explicit(path)),
            _ => default_config_path().map(Self::Default),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Explicit(path) | Self::Default(path) => path,
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, Self::Explicit(_))
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
        .ok_or_else(|| anyhow!("failed to determine user directories"))?;
    Ok(project_dirs.config_dir().join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let location = ConfigLocation::resolve(Some(PathBuf::from("/etc/bgview.toml"))).unwrap();
        assert!(location.is_explicit());
        assert_eq!(location.path(), std::path::Path::new("/etc/bgview.toml"));
    }

    #[test]
    fn empty_path_falls_back_to_default() {
        if let Ok(location) = ConfigLocation::resolve(Some(PathBuf::new())) {
            assert!(!location.is_explicit());
            assert!(location.path().ends_with("config.toml"));
        }
    }
}
