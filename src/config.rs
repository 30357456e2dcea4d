use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
};

use crate::{
    buildings::height::HeightParams,
    preview::scatter::{PreviewMode, PreviewOptions},
};

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PreviewConfig {
    pub output_path: PathBuf,
    #[serde(default)]
    pub mode: PreviewMode,
    /// Image size in pixels, defaults to `PreviewOptions::default()`.
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl PreviewConfig {
    pub fn options(&self) -> PreviewOptions {
        let defaults = PreviewOptions::default();
        PreviewOptions {
            mode: self.mode,
            width: self.width.unwrap_or(defaults.width),
            height: self.height.unwrap_or(defaults.height),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub input_geojson_path: PathBuf,
    pub output_csv_path: PathBuf,
    /// No preview is rendered if absent.
    pub preview: Option<PreviewConfig>,
    #[serde(default)]
    pub height: HeightParams,
}

impl Config {
    pub fn from_yaml_str(contents: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn load(filepath: &Path) -> anyhow::Result<Self> {
        if !filepath.exists() {
            return Err(anyhow!("Config file {} not found", filepath.display()));
        }
        let contents = read_to_string(filepath)
            .with_context(|| format!("Reading config file {:?}", filepath))?;
        Self::from_yaml_str(&contents)
            .with_context(|| format!("Parsing config file {:?}", filepath))
    }
}
