use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::PlotError;

/// Environment variable naming a TOML config file.
pub const CONFIG_PATH_ENV: &str = "FEATUREPLOT_CONFIG";
/// Environment variable overriding the storage engine.
pub const ENGINE_ENV: &str = "FEATUREPLOT_ENGINE";

// ---------------------------------------------------------------------------
// Storage engine
// ---------------------------------------------------------------------------

/// Which reader opens feature-set and prediction-set files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Engine {
    /// Pick the reader from the file extension.
    #[default]
    Auto,
    Parquet,
    Json,
    Csv,
}

impl FromStr for Engine {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Engine::Auto),
            "parquet" | "pq" => Ok(Engine::Parquet),
            "json" => Ok(Engine::Json),
            "csv" => Ok(Engine::Csv),
            other => Err(PlotError::UnknownEngine(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Palette choice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteKind {
    /// Size-indexed purple/blue sequential palette (3 to 9 colors).
    #[default]
    PuBu,
    /// Evenly spaced hues, generated for any label count.
    Hues,
}

/// Corner of the figure the legend is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendLocation {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    pub engine: Engine,
}

/// Panel and legend styling for generated figures. Sizes are in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    pub panel_width: usize,
    pub panel_height: usize,
    pub palette: PaletteKind,
    pub marker_size: usize,
    pub legend_location: LegendLocation,
    pub legend_font_size: usize,
    pub heatmap_size: usize,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            panel_width: 300,
            panel_height: 200,
            palette: PaletteKind::PuBu,
            marker_size: 4,
            legend_location: LegendLocation::BottomRight,
            // 6pt
            legend_font_size: 8,
            heatmap_size: 500,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub storage: StorageConfig,
    pub plot: PlotConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            engine: Engine::Auto,
        }
    }
}

// -- TOML file layout: every field optional, applied over defaults --

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    storage: Option<FileStorageConfig>,
    plot: Option<FilePlotConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct FileStorageConfig {
    engine: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FilePlotConfig {
    panel_width: Option<usize>,
    panel_height: Option<usize>,
    palette: Option<PaletteKind>,
    marker_size: Option<usize>,
    legend_location: Option<LegendLocation>,
    legend_font_size: Option<usize>,
    heatmap_size: Option<usize>,
}

impl Config {
    /// Defaults, then the TOML file (explicit path or `FEATUREPLOT_CONFIG`),
    /// then `FEATUREPLOT_ENGINE`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = Config::default();

        let path: Option<PathBuf> = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));
        if let Some(path) = path {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed reading config file {}", path.display()))?;
            cfg.apply_toml(&raw)
                .with_context(|| format!("failed parsing TOML config {}", path.display()))?;
            log::debug!("Loaded config from {}", path.display());
        }

        if let Ok(engine) = std::env::var(ENGINE_ENV) {
            if let Some(engine) = non_empty(engine) {
                cfg.storage.engine = engine.parse()?;
            }
        }

        Ok(cfg)
    }

    /// Overlay the fields present in a TOML document.
    pub fn apply_toml(&mut self, raw: &str) -> Result<()> {
        let file_cfg: FileConfig = toml::from_str(raw)?;
        if let Some(storage) = file_cfg.storage {
            self.apply_file_storage(storage)?;
        }
        if let Some(plot) = file_cfg.plot {
            self.apply_file_plot(plot);
        }
        Ok(())
    }

    fn apply_file_storage(&mut self, storage: FileStorageConfig) -> Result<()> {
        if let Some(v) = storage.engine.and_then(non_empty) {
            self.storage.engine = v.parse()?;
        }
        Ok(())
    }

    fn apply_file_plot(&mut self, plot: FilePlotConfig) {
        if let Some(v) = plot.panel_width {
            self.plot.panel_width = v;
        }
        if let Some(v) = plot.panel_height {
            self.plot.panel_height = v;
        }
        if let Some(v) = plot.palette {
            self.plot.palette = v;
        }
        if let Some(v) = plot.marker_size {
            self.plot.marker_size = v;
        }
        if let Some(v) = plot.legend_location {
            self.plot.legend_location = v;
        }
        if let Some(v) = plot.legend_font_size {
            self.plot.legend_font_size = v;
        }
        if let Some(v) = plot.heatmap_size {
            self.plot.heatmap_size = v;
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
