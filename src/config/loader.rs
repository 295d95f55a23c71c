//! Configuration file loading and saving.

use std::path::{Path, PathBuf};

use super::types::Config;

impl Config {
    /// Get the explicit ~/.config/tokn/tokn.kdl path (XDG-style, cross-platform)
    fn xdg_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".config/tokn/tokn.kdl"))
    }

    /// Get the list of config file search paths in priority order
    fn get_config_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. ./tokn.kdl (current directory - highest priority for project-local config)
        paths.push(PathBuf::from("tokn.kdl"));

        // 2. ~/.config/tokn/tokn.kdl (XDG-style, explicit cross-platform support)
        if let Some(xdg_path) = Self::xdg_config_path() {
            paths.push(xdg_path);
        }

        // 3. Platform-native config directory (~/Library/Application Support/ on macOS)
        // Skip if it's the same as the XDG path (e.g., on Linux where they're identical)
        if let Some(config_dir) = dirs::config_dir() {
            let native_path = config_dir.join("tokn/tokn.kdl");
            if Self::xdg_config_path().as_ref() != Some(&native_path) {
                paths.push(native_path);
            }
        }

        paths
    }

    /// Find existing config file by searching all standard locations
    pub fn find_existing_config() -> Option<PathBuf> {
        Self::get_config_search_paths()
            .into_iter()
            .find(|path| path.exists())
    }

    /// Get the default config path (~/.config/tokn/tokn.kdl)
    pub fn default_config_path() -> PathBuf {
        Self::xdg_config_path().unwrap_or_else(|| PathBuf::from("tokn.kdl"))
    }

    /// Load configuration from a specific path
    fn load_from_path(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config = knuffel::parse::<Config>("tokn.kdl", &content)?;
        Ok(config)
    }

    /// Load configuration from tokn.kdl, searching multiple locations
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let search_paths = Self::get_config_search_paths();

        for path in &search_paths {
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        // Default config if no file found
        Ok(Config::default())
    }

    /// Serialize config to KDL format
    pub fn to_kdl(&self) -> String {
        let mut output = String::new();

        output.push_str("// tokn configuration file\n\n");
        output.push_str(&format!("backend \"{}\"\n", self.backend()));

        if let Some(local) = &self.local
            && let Some(data_dir) = &local.data_dir
        {
            output.push_str(&format!("\nlocal data_dir=\"{}\"\n", data_dir));
        }

        if let Some(doppler) = &self.doppler {
            output.push_str("\ndoppler");
            if let Some(project) = &doppler.project {
                output.push_str(&format!(" project=\"{}\"", project));
            }
            if let Some(config) = &doppler.config {
                output.push_str(&format!(" config=\"{}\"", config));
            }
            output.push('\n');
        }

        output
    }

    /// Save config to file, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_kdl())?;
        Ok(())
    }
}
