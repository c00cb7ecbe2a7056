//! INI file configuration adapter.

use crate::ports::config::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_str(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_i64(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_f64(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }

    /// Pairs come back key-sorted; the INI backend does not preserve file
    /// order.
    fn section_pairs(&self, section: &str) -> Vec<(String, String)> {
        let Some(map) = self.config.get_map_ref().get(section) else {
            return Vec::new();
        };
        let mut pairs: Vec<(String, String)> = map
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|value| (k.clone(), value.clone())))
            .collect();
        pairs.sort();
        pairs
    }
}
