//! Connection profile for the `omp` client.
//!
//! The profile uses the client's own INI layout:
//!
//! ```ini
//! [Connection]
//! host=127.0.0.1
//! port=9390
//! username=admin
//! password=secret
//! ```

use crate::utils::errors::{MigrateError, Result};
use ::config::{Config, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

/// Default management protocol port.
pub const DEFAULT_PORT: u16 = 9390;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionProfile {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub username: String,

    /// Also embedded into exported slaves.
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
struct ProfileFile {
    #[serde(alias = "Connection")]
    connection: ConnectionProfile,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl ConnectionProfile {
    /// Load the `[Connection]` section of an INI profile. Keys are matched
    /// case-insensitively.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(MigrateError::Config(format!(
                "connection profile {} does not exist",
                path.display()
            )));
        }
        let name = path.to_str().ok_or_else(|| {
            MigrateError::Config(format!("invalid profile path {}", path.display()))
        })?;

        let settings = Config::builder()
            .add_source(File::new(name, FileFormat::Ini).required(true))
            .build()?;
        let file: ProfileFile = settings.try_deserialize()?;
        Ok(file.connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_profile(content: &str) -> (TempDir, std::path::PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("omp.config");
        fs::write(&path, content).unwrap();
        (temp_dir, path)
    }

    #[test]
    fn test_load_profile() {
        let (_dir, path) = write_profile(
            "[Connection]\nhost=192.168.1.10\nport=9391\nusername=admin\npassword=secret\n",
        );
        let profile = ConnectionProfile::from_file(&path).unwrap();

        assert_eq!(
            profile,
            ConnectionProfile {
                host: "192.168.1.10".to_string(),
                port: 9391,
                username: "admin".to_string(),
                password: "secret".to_string(),
            }
        );
    }

    #[test]
    fn test_port_and_host_default() {
        let (_dir, path) = write_profile("[Connection]\nusername=admin\npassword=x\n");
        let profile = ConnectionProfile::from_file(&path).unwrap();

        assert_eq!(profile.port, DEFAULT_PORT);
        assert_eq!(profile.host, "localhost");
    }

    #[test]
    fn test_missing_section_is_an_error() {
        let (_dir, path) = write_profile("[Other]\nusername=admin\n");
        assert!(matches!(
            ConnectionProfile::from_file(&path),
            Err(MigrateError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = ConnectionProfile::from_file(&temp_dir.path().join("absent.config"));
        assert!(matches!(
            result,
            Err(MigrateError::Config(message)) if message.contains("does not exist")
        ));
    }
}
