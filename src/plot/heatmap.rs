use plotly::color::NamedColor;
use plotly::common::{ColorScale, ColorScalePalette, Font, Title};
use plotly::layout::{Annotation, Axis, Layout};
use plotly::{HeatMap, Plot};

use crate::config::PlotConfig;
use crate::data::model::PredictionSet;

/// Row-normalized confusion matrix: `rows[t][p]` is the share of samples with
/// true label `labels[t]` predicted as `labels[p]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    pub labels: Vec<String>,
    pub counts: Vec<Vec<u64>>,
    pub rows: Vec<Vec<f64>>,
}

impl ConfusionMatrix {
    pub fn from_predictions(pset: &PredictionSet) -> Self {
        let labels = pset.all_labels();
        let index = pset.label_index();
        let k = labels.len();

        let mut counts = vec![vec![0u64; k]; k];
        for (truth, pred) in pset.truth.iter().zip(&pset.predicted) {
            // both labels are in `index` by construction of all_labels
            if let (Some(&t), Some(&p)) = (index.get(truth), index.get(pred)) {
                counts[t][p] += 1;
            }
        }

        let rows = counts
            .iter()
            .map(|row| {
                let total: u64 = row.iter().sum();
                row.iter()
                    .map(|&c| if total == 0 { 0.0 } else { c as f64 / total as f64 })
                    .collect()
            })
            .collect();

        ConfusionMatrix {
            labels,
            counts,
            rows,
        }
    }

    pub fn size(&self) -> usize {
        self.labels.len()
    }
}

/// Annotated heatmap: predicted label on x, true label on y, first class at
/// the top.
pub fn render_heatmap(matrix: &ConfusionMatrix, style: &PlotConfig) -> Plot {
    let k = matrix.size();
    // plotly draws the first category at the bottom
    let truth: Vec<String> = matrix.labels.iter().rev().cloned().collect();
    let z: Vec<Vec<f64>> = matrix.rows.iter().rev().cloned().collect();

    let trace = HeatMap::new(matrix.labels.clone(), truth, z)
        .color_scale(ColorScale::Palette(ColorScalePalette::Viridis));

    let mut annotations = Vec::with_capacity(k * k);
    for (t, row) in matrix.rows.iter().enumerate() {
        for (p, &share) in row.iter().enumerate() {
            // dark text on the bright end of the scale
            let color = if share > 0.6 {
                NamedColor::Black
            } else {
                NamedColor::White
            };
            annotations.push(
                Annotation::new()
                    .x(p as f64)
                    .y((k - 1 - t) as f64)
                    .text(&format!("{share:.2}"))
                    .show_arrow(false)
                    .font(Font::new().color(color)),
            );
        }
    }

    let layout = Layout::new()
        .title(Title::with_text("Confusion matrix"))
        .width(style.heatmap_size)
        .height(style.heatmap_size)
        .x_axis(Axis::new().title(Title::with_text("Predicted label")))
        .y_axis(Axis::new().title(Title::with_text("True label")))
        .annotations(annotations);

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(layout);
    plot
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pset(truth: &[&str], predicted: &[&str], classes: &[&str]) -> PredictionSet {
        PredictionSet {
            class_labels: classes.iter().map(|s| s.to_string()).collect(),
            truth: truth.iter().map(|s| s.to_string()).collect(),
            predicted: predicted.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn rows_are_normalized() {
        let m = ConfusionMatrix::from_predictions(&pset(
            &["a", "a", "a", "b"],
            &["a", "a", "b", "b"],
            &["a", "b"],
        ));
        assert_eq!(m.counts, vec![vec![2, 1], vec![0, 1]]);
        assert!((m.rows[0][0] - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.rows[0][1] - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(m.rows[1], vec![0.0, 1.0]);
    }

    #[test]
    fn unseen_true_class_row_is_zero() {
        let m = ConfusionMatrix::from_predictions(&pset(&["a"], &["a"], &["a", "b"]));
        assert_eq!(m.rows[1], vec![0.0, 0.0]);
        for row in &m.rows {
            let sum: f64 = row.iter().sum();
            assert!(sum == 0.0 || (sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn heatmap_has_one_cell_and_annotation_per_pair() {
        let m = ConfusionMatrix::from_predictions(&pset(&["a", "b"], &["a", "a"], &["a", "b"]));
        let fig: serde_json::Value =
            serde_json::from_str(&render_heatmap(&m, &PlotConfig::default()).to_json()).unwrap();

        let trace = &fig["data"][0];
        assert_eq!(trace["type"], "heatmap");
        assert_eq!(trace["colorscale"], "Viridis");
        assert_eq!(trace["x"], serde_json::json!(["a", "b"]));
        assert_eq!(trace["y"], serde_json::json!(["b", "a"]));
        assert_eq!(trace["z"], serde_json::json!([[1.0, 0.0], [1.0, 0.0]]));

        let annotations = fig["layout"]["annotations"].as_array().unwrap();
        let texts: Vec<&str> = annotations.iter().map(|a| a["text"].as_str().unwrap()).collect();
        assert_eq!(texts, vec!["1.00", "0.00", "1.00", "0.00"]);
        // true label "a" sits on the top row
        assert_eq!(annotations[0]["y"], 1.0);
        assert_eq!(fig["layout"]["width"], 500);
    }
}
