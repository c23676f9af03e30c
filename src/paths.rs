use anyhow::{Context, Result};
use directories::BaseDirs;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the config directory
pub const CONFIG_DIR_ENV: &str = "PROFS_CONFIG_DIR";

/// Suffix appended to a managed path to form its companion directory
pub const COMPANION_SUFFIX: &str = ".profs";

/// Name of the config file inside the config dir
pub const CONFIG_FILE_NAME: &str = "global.json";

/// Config dirs used by older releases, relative to home, most recent first
const LEGACY_CONFIG_DIRS: &[&str] = &[".config/gigurra/profs", ".profs"];

/// All computed paths used by profs
#[derive(Debug, Clone)]
pub struct Paths {
    /// The user's home directory, used for `~` expansion
    pub home_dir: PathBuf,
    /// Preferred config directory (e.g. ~/.config/profs)
    pub config_dir: PathBuf,
    /// Config dir of an older release (~/.config/gigurra/profs or ~/.profs)
    pub legacy_config_dir: PathBuf,
    /// <active config dir>/global.json
    pub config_file: PathBuf,
}

impl Paths {
    pub fn new() -> Result<Self> {
        let base_dirs = BaseDirs::new().context("Failed to determine home directory")?;
        let home = base_dirs.home_dir().to_path_buf();

        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => base_dirs.config_dir().join("profs"),
        };
        let legacy_config_dir = find_legacy_config_dir(&home);

        Ok(Self::from_parts(home, config_dir, legacy_config_dir))
    }

    /// Build from explicit locations, choosing the legacy config dir when
    /// only that one exists on disk.
    pub fn from_parts(home_dir: PathBuf, config_dir: PathBuf, legacy_config_dir: PathBuf) -> Self {
        let active_dir = if !config_dir.exists() && legacy_config_dir.is_dir() {
            &legacy_config_dir
        } else {
            &config_dir
        };
        let config_file = active_dir.join(CONFIG_FILE_NAME);

        Self {
            home_dir,
            config_dir,
            legacy_config_dir,
            config_file,
        }
    }

    /// Directory the config file currently lives in
    pub fn active_config_dir(&self) -> &Path {
        self.config_file.parent().unwrap_or(&self.config_dir)
    }

    /// Whether the config currently lives in the legacy location
    pub fn uses_legacy_dir(&self) -> bool {
        self.active_config_dir() == self.legacy_config_dir
    }

    /// Expand a leading `~` into the home directory
    pub fn expand_home(&self, raw: &str) -> PathBuf {
        match raw.strip_prefix('~') {
            Some(rest) => self.home_dir.join(rest.trim_start_matches('/')),
            None => PathBuf::from(raw),
        }
    }

    /// Abbreviate a path under the home directory to `~/...`
    pub fn abbreviate_home(&self, path: &Path) -> String {
        match path.strip_prefix(&self.home_dir) {
            Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
            Ok(rest) => format!("~/{}", rest.display()),
            Err(_) => path.display().to_string(),
        }
    }
}

/// First legacy config dir that exists under `home`, or `~/.profs` if none does
pub fn find_legacy_config_dir(home: &Path) -> PathBuf {
    LEGACY_CONFIG_DIRS
        .iter()
        .map(|dir| home.join(dir))
        .find(|dir| dir.is_dir())
        .unwrap_or_else(|| home.join(".profs"))
}

/// Companion directory for a managed path: the sibling `<path>.profs`
pub fn companion_dir(src_path: &Path) -> PathBuf {
    let mut raw: OsString = src_path.as_os_str().to_owned();
    raw.push(COMPANION_SUFFIX);
    PathBuf::from(raw)
}
