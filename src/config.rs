use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::projection::MapLayout;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub server: ServerConfig,
    pub map: MapConfig,
    /// Year of the listings snapshot, shown in the summary
    pub snapshot_year: u16,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    pub listings: PathBuf,
    pub neighborhoods: PathBuf,
    pub clustered: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
    /// Oldest sessions are dropped beyond this many
    pub max_sessions: usize,
}

/// Fixed map frame; identical for every interaction so the view never jumps
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    pub center_lat: f64,
    pub center_lon: f64,
    pub point_zoom: f64,
    pub choropleth_zoom: f64,
    pub cluster_zoom: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            server: ServerConfig::default(),
            map: MapConfig::default(),
            snapshot_year: 2018,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            listings: PathBuf::from("data/valencia_sale.csv"),
            neighborhoods: PathBuf::from("data/valencia_polygons.csv"),
            clustered: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8082".to_string(),
            max_sessions: 10_000,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: 39.46,
            center_lon: -0.37,
            point_zoom: 11.5,
            choropleth_zoom: 11.0,
            cluster_zoom: 12.0,
        }
    }
}

impl MapConfig {
    pub fn point_layout(&self) -> MapLayout {
        MapLayout::new(self.center_lat, self.center_lon, self.point_zoom)
    }

    pub fn choropleth_layout(&self) -> MapLayout {
        MapLayout::new(self.center_lat, self.center_lon, self.choropleth_zoom)
    }

    pub fn cluster_layout(&self) -> MapLayout {
        MapLayout::new(self.center_lat, self.center_lon, self.cluster_zoom)
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
