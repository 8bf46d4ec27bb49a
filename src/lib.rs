//! Feature-set visualization: scatterplot grids over feature pairs, colored
//! by class label, and confusion-matrix heatmaps, emitted as plotly.js JSON
//! figures for embedding in a web page.

pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod plot;

pub use config::{Config, Engine, LegendLocation, PaletteKind};
pub use error::PlotError;
pub use plot::{feature_scatterplot, prediction_heatmap, PlotPayload};
