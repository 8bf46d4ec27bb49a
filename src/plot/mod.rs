//! Plot construction: feature-pair scatterplot grids and confusion heatmaps.
//!
//! Pipeline:
//! ```text
//!   load ──► FeatureTable + LabelGroups ──► PanelGrid ──► plotly::Plot ──► JSON
//! ```

pub mod grid;
pub mod heatmap;

use std::path::Path;

use anyhow::Result;
use plotly::Plot;
use serde::Serialize;

use crate::color::ColorMap;
use crate::config::Config;
use crate::data::filter::label_groups;
use crate::data::loader::{load_feature_set, load_prediction_set};
use crate::data::model::Labeling;

use self::grid::PanelGrid;
use self::heatmap::{render_heatmap, ConfusionMatrix};

/// Serialized figure plus a slot reserved for additional output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotPayload {
    /// plotly.js figure JSON (`data`, `layout`, `config`).
    pub document: String,
    /// Currently always `None`.
    pub extra: Option<serde_json::Value>,
}

impl PlotPayload {
    fn new(plot: &Plot) -> Self {
        PlotPayload {
            document: plot.to_json(),
            extra: None,
        }
    }
}

/// Build the N×N scatterplot grid for `features` of the feature set at
/// `fset_path` and return it as a serialized figure.
///
/// Loading errors propagate unmodified. An empty `features` list or an
/// unknown feature name is rejected with a [`crate::PlotError`].
pub fn feature_scatterplot<S: AsRef<str>>(
    fset_path: &Path,
    features: &[S],
    config: &Config,
) -> Result<PlotPayload> {
    let fset = load_feature_set(fset_path, config.storage.engine)?;
    let table = fset.table(features)?;

    let labeling = fset.labeling();
    if labeling == Labeling::Continuous {
        log::warn!(
            "Target of {} is continuous; plotting all samples as one group",
            fset_path.display()
        );
    }
    let groups = label_groups(&labeling, fset.len());
    let colors = ColorMap::new(&groups, config.plot.palette);
    log::debug!(
        "{} label group(s) drawn with {} distinct color(s)",
        labeling.group_count(),
        colors.distinct_colors()
    );

    let grid = PanelGrid::build(&table, &groups, &colors);

    Ok(PlotPayload::new(&grid.render(&config.plot)))
}

/// Build the annotated confusion-matrix heatmap for the prediction set at
/// `pred_path`.
pub fn prediction_heatmap(pred_path: &Path, config: &Config) -> Result<PlotPayload> {
    let pset = load_prediction_set(pred_path, config.storage.engine)?;
    let matrix = ConfusionMatrix::from_predictions(&pset);
    log::debug!("Confusion matrix over {} labels", matrix.size());

    Ok(PlotPayload::new(&render_heatmap(&matrix, &config.plot)))
}
