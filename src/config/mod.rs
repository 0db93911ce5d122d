use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ConfigFile {
    #[serde(alias = "url")]
    pub source: Option<String>,
    pub types: Option<Vec<String>>,
    pub search: Option<String>,
    pub expand: Option<bool>,
    pub timeout: Option<usize>,
    pub proxy: Option<String>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub no_color: Option<bool>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".graderboard").join("config.yml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn parse_config(contents: &str, path: &PathBuf) -> Result<ConfigFile, String> {
    if contents.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str::<ConfigFile>(contents)
        .map_err(|e| format!("failed to parse config '{}': {e}", path.display()))
}

pub fn load_config(path: &PathBuf, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents, path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

fn default_config_yaml() -> String {
    r#"# Graderboard config
#
# Location (default):
#   ~/.graderboard/config.yml

# Dataset location: a local path or an http(s) URL
source: ./data/graders.json

# Assignment types to count (prefix match). Omit to select every type
# present in the dataset; an empty list selects nothing.
# types:
#   - Worksheet
#   - Quiz

# Name filter (case-insensitive substring). A non-empty search shows
# matching people in profile mode with details expanded.
# search: ""

# Expand every detail panel in the initial view
expand: false

# HTTP
timeout: 10
# proxy: http://127.0.0.1:8080

# Output (optional)
# output: ./leaderboard.html
# output_format: html

# Output styling
no_color: false
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &PathBuf) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    let contents = default_config_yaml();
    std::fs::write(path, contents)
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(true)
}
