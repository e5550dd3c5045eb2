//! Process configuration read from the environment.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable naming the occupancy document.
pub const ROOMS_FILE_VAR: &str = "CHECKPOINT_ROOMS_FILE";
/// Environment variable overriding the base directory.
pub const BASE_DIR_VAR: &str = "CHECKPOINT_BASE_DIR";
/// Environment variable holding the listen address.
pub const BIND_VAR: &str = "CHECKPOINT_BIND";

const DEFAULT_ROOMS_FILE: &str = "rooms.json";
const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// Checkpoint process settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Occupancy document location, possibly relative to `base_dir`.
    pub rooms_file: PathBuf,
    /// Directory relative document paths are resolved against.
    pub base_dir: PathBuf,
    /// HTTP listen address.
    pub bind: SocketAddr,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// The base directory defaults to the directory holding the running
    /// executable.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let rooms_file = lookup(ROOMS_FILE_VAR)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ROOMS_FILE.to_string());
        let base_dir = match lookup(BASE_DIR_VAR) {
            Some(dir) => PathBuf::from(dir),
            None => executable_dir()?,
        };
        let bind_raw = lookup(BIND_VAR).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .parse::<SocketAddr>()
            .map_err(|err| Error::Config(format!("{BIND_VAR}={bind_raw:?}: {err}")))?;

        Ok(Self {
            rooms_file: PathBuf::from(rooms_file),
            base_dir,
            bind,
        })
    }

    /// Returns the occupancy document location resolved against `base_dir`.
    pub fn rooms_path(&self) -> PathBuf {
        resolve(&self.base_dir, &self.rooms_file)
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn executable_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()
        .map_err(|err| Error::Config(format!("cannot locate executable: {err}")))?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::Config(format!("{} has no parent directory", exe.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[(BASE_DIR_VAR, "/srv/checkpoint")])).unwrap();

        assert_eq!(config.bind, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(
            config.rooms_path(),
            PathBuf::from("/srv/checkpoint/rooms.json")
        );
    }

    #[test]
    fn relative_rooms_file_is_resolved_against_base() {
        let config = Config::from_lookup(lookup(&[
            (BASE_DIR_VAR, "/srv/checkpoint"),
            (ROOMS_FILE_VAR, "data/rooms.json"),
        ]))
        .unwrap();

        assert_eq!(
            config.rooms_path(),
            PathBuf::from("/srv/checkpoint/data/rooms.json")
        );
    }

    #[test]
    fn absolute_rooms_file_is_kept() {
        let config = Config::from_lookup(lookup(&[
            (BASE_DIR_VAR, "/srv/checkpoint"),
            (ROOMS_FILE_VAR, "/var/lib/rooms.json"),
        ]))
        .unwrap();

        assert_eq!(config.rooms_path(), PathBuf::from("/var/lib/rooms.json"));
    }

    #[test]
    fn base_dir_defaults_to_executable_dir() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        let exe = std::env::current_exe().unwrap();

        assert_eq!(Some(config.base_dir.as_path()), exe.parent());
    }

    #[test]
    fn invalid_bind_is_a_config_error() {
        let err = Config::from_lookup(lookup(&[
            (BASE_DIR_VAR, "/srv"),
            (BIND_VAR, "not-an-address"),
        ]))
        .unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains(BIND_VAR));
    }
}
