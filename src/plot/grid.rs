use plotly::common::{Anchor, Font, Marker, Mode, Title};
use plotly::layout::{Axis, GridPattern, Layout, LayoutGrid, Legend};
use plotly::{Plot, Scatter};

use crate::color::{to_plotly, ColorMap, Rgb8};
use crate::config::{LegendLocation, PlotConfig};
use crate::data::filter::LabelGroup;
use crate::data::model::{FeatureTable, Value};

/// Highest axis number a layout can title.
const MAX_TITLED_AXES: usize = 8;

// ---------------------------------------------------------------------------
// Panel descriptors
// ---------------------------------------------------------------------------

/// One label group drawn in one panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: Option<Value>,
    pub color: Rgb8,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Whether the panel's legend lists this series.
    pub in_legend: bool,
}

/// Scatterplot of feature `row` (x axis) against feature `col` (y axis).
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub row: usize,
    pub col: usize,
    pub x_feature: String,
    pub y_feature: String,
    pub series: Vec<Series>,
}

impl Panel {
    pub fn is_diagonal(&self) -> bool {
        self.row == self.col
    }

    /// Axis pair the panel draws on. Column `row` shares the x axis of
    /// feature `row` and row `col` shares the y axis of feature `col`.
    pub fn axes(&self) -> (String, String) {
        (axis_id("x", self.row), axis_id("y", self.col))
    }

    pub fn legend_labels(&self) -> Vec<String> {
        self.series
            .iter()
            .filter(|s| s.in_legend)
            .filter_map(|s| s.label.as_ref().map(|l| l.to_string()))
            .collect()
    }
}

/// N×N panels stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelGrid {
    pub size: usize,
    pub features: Vec<String>,
    pub panels: Vec<Panel>,
}

impl PanelGrid {
    /// One panel per ordered feature pair, each split into the label groups.
    pub fn build(table: &FeatureTable, groups: &[LabelGroup], colors: &ColorMap) -> Self {
        let n = table.n_features();
        let mut panels = Vec::with_capacity(n * n);

        for i in 0..n {
            for j in 0..n {
                let series = groups
                    .iter()
                    .filter_map(|group| {
                        let color = colors.color_for(group.label.as_ref())?;
                        Some(Series {
                            label: group.label.clone(),
                            color,
                            x: table.take(i, &group.indices),
                            y: table.take(j, &group.indices),
                            in_legend: i == j && group.label.is_some(),
                        })
                    })
                    .collect();

                panels.push(Panel {
                    row: i,
                    col: j,
                    x_feature: table.feature_names[i].clone(),
                    y_feature: table.feature_names[j].clone(),
                    series,
                });
            }
        }

        PanelGrid {
            size: n,
            features: table.feature_names.clone(),
            panels,
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Panel> {
        if row >= self.size || col >= self.size {
            return None;
        }
        self.panels.get(row * self.size + col)
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// One figure holding every panel on a coupled N×N subplot grid, so all
    /// panels share the figure's single mode bar.
    pub fn render(&self, style: &PlotConfig) -> Plot {
        let mut plot = Plot::new();
        for panel in &self.panels {
            let (x_axis, y_axis) = panel.axes();
            for series in &panel.series {
                plot.add_trace(series_trace(series, &x_axis, &y_axis, style));
            }
        }
        plot.set_layout(self.layout(style));
        plot
    }

    fn layout(&self, style: &PlotConfig) -> Layout {
        let n = self.size.max(1);
        let any_legend = self
            .panels
            .iter()
            .any(|p| p.series.iter().any(|s| s.in_legend));

        let mut layout = Layout::new()
            .width(style.panel_width * n)
            .height(style.panel_height * n)
            .grid(
                LayoutGrid::new()
                    .rows(self.size)
                    .columns(self.size)
                    .pattern(GridPattern::Coupled),
            )
            .show_legend(any_legend)
            .legend(legend(style));

        if self.features.len() > MAX_TITLED_AXES {
            log::debug!(
                "{} features; axes past the {MAX_TITLED_AXES}th are left untitled",
                self.features.len()
            );
        }
        for (k, name) in self.features.iter().enumerate() {
            layout = titled_axes(layout, k, name);
        }
        layout
    }
}

fn series_trace(
    series: &Series,
    x_axis: &str,
    y_axis: &str,
    style: &PlotConfig,
) -> Box<Scatter<f64, f64>> {
    let mut trace = Scatter::new(series.x.clone(), series.y.clone())
        .mode(Mode::Markers)
        .marker(
            Marker::new()
                .size(style.marker_size)
                .color(to_plotly(series.color)),
        )
        .x_axis(x_axis)
        .y_axis(y_axis)
        .show_legend(series.in_legend);
    if let Some(label) = &series.label {
        // one legend group per label toggles it across every panel
        let label = label.to_string();
        trace = trace.name(&label).legend_group(&label);
    }
    trace
}

fn legend(style: &PlotConfig) -> Legend {
    let (x, y, x_anchor, y_anchor) = match style.legend_location {
        LegendLocation::TopLeft => (0.0, 1.0, Anchor::Left, Anchor::Top),
        LegendLocation::TopRight => (1.0, 1.0, Anchor::Right, Anchor::Top),
        LegendLocation::BottomLeft => (0.0, 0.0, Anchor::Left, Anchor::Bottom),
        LegendLocation::BottomRight => (1.0, 0.0, Anchor::Right, Anchor::Bottom),
    };
    Legend::new()
        .x(x)
        .y(y)
        .x_anchor(x_anchor)
        .y_anchor(y_anchor)
        .font(Font::new().size(style.legend_font_size))
        .trace_group_gap(0)
}

/// `x`, `x2`, `x3`... for zero-based axis `k`.
fn axis_id(prefix: &str, k: usize) -> String {
    if k == 0 {
        prefix.to_string()
    } else {
        format!("{prefix}{}", k + 1)
    }
}

fn titled_axes(layout: Layout, k: usize, name: &str) -> Layout {
    let x = Axis::new().title(Title::with_text(name));
    let y = Axis::new().title(Title::with_text(name));
    match k {
        0 => layout.x_axis(x).y_axis(y),
        1 => layout.x_axis2(x).y_axis2(y),
        2 => layout.x_axis3(x).y_axis3(y),
        3 => layout.x_axis4(x).y_axis4(y),
        4 => layout.x_axis5(x).y_axis5(y),
        5 => layout.x_axis6(x).y_axis6(y),
        6 => layout.x_axis7(x).y_axis7(y),
        7 => layout.x_axis8(x).y_axis8(y),
        _ => layout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaletteKind;
    use crate::data::filter::label_groups;
    use crate::data::model::{FeatureSet, Labeling, RawColumn, RawTable};

    fn feature_set(target: Option<Vec<Value>>) -> FeatureSet {
        let mut columns = vec![
            RawColumn::new("a", vec![Value::Float(1.0), Value::Float(2.0)]),
            RawColumn::new("b", vec![Value::Float(10.0), Value::Float(20.0)]),
        ];
        if let Some(values) = target {
            columns.push(RawColumn::new("target", values));
        }
        FeatureSet::from_table(RawTable { columns, n_rows: 2 }).unwrap()
    }

    fn grid_for(fset: &FeatureSet, features: &[&str]) -> PanelGrid {
        let table = fset.table(features).unwrap();
        let groups = label_groups(&fset.labeling(), fset.len());
        let colors = ColorMap::new(&groups, PaletteKind::PuBu);
        PanelGrid::build(&table, &groups, &colors)
    }

    fn figure_json(plot: &Plot) -> serde_json::Value {
        serde_json::from_str(&plot.to_json()).unwrap()
    }

    #[test]
    fn two_features_two_labels() {
        let fset = feature_set(Some(vec![Value::Integer(0), Value::Integer(1)]));
        let grid = grid_for(&fset, &["a", "b"]);

        assert_eq!(grid.len(), 4);
        let diag = grid.get(0, 0).unwrap();
        assert!(diag.is_diagonal());
        assert_eq!(diag.legend_labels(), vec!["0", "1"]);
        assert_eq!(diag.x_feature, "a");
        assert_eq!(diag.y_feature, "a");

        let off = grid.get(0, 1).unwrap();
        assert!(off.legend_labels().is_empty());
        assert_eq!(off.series.len(), 2);
        assert_ne!(off.series[0].color, off.series[1].color);
        assert_eq!(off.series[1].x, vec![2.0]);
        assert_eq!(off.series[1].y, vec![20.0]);
        assert_eq!(off.axes(), ("x".to_string(), "y2".to_string()));
    }

    #[test]
    fn unlabeled_uses_one_series_without_legend() {
        let fset = feature_set(None);
        assert_eq!(fset.labeling(), Labeling::Absent);
        let grid = grid_for(&fset, &["a", "b", "a"]);

        assert_eq!(grid.len(), 9);
        for panel in &grid.panels {
            assert_eq!(panel.series.len(), 1);
            assert_eq!(panel.series[0].x.len(), 2);
            assert!(panel.legend_labels().is_empty());
        }
    }

    #[test]
    fn continuous_target_plots_as_unlabeled() {
        let fset = feature_set(Some(vec![Value::Float(0.1), Value::Float(0.9)]));
        let grid = grid_for(&fset, &["a"]);
        assert_eq!(grid.panels[0].series.len(), 1);
        assert!(grid.panels[0].series[0].label.is_none());
    }

    #[test]
    fn render_puts_every_panel_on_one_coupled_grid() {
        let fset = feature_set(Some(vec![Value::Integer(0), Value::Integer(1)]));
        let grid = grid_for(&fset, &["a", "b"]);
        let fig = figure_json(&grid.render(&PlotConfig::default()));

        let traces = fig["data"].as_array().unwrap();
        assert_eq!(traces.len(), 8);
        let layout = &fig["layout"];
        assert_eq!(layout["grid"]["rows"], 2);
        assert_eq!(layout["grid"]["columns"], 2);
        assert_eq!(layout["grid"]["pattern"], "coupled");
        assert_eq!(layout["width"], 600);
        assert_eq!(layout["xaxis2"]["title"]["text"], "b");
        assert_eq!(layout["yaxis"]["title"]["text"], "a");

        let legend = &layout["legend"];
        assert_eq!(legend["x"], 1.0);
        assert_eq!(legend["y"], 0.0);
        assert_eq!(legend["xanchor"], "right");
        assert_eq!(legend["yanchor"], "bottom");
        assert_eq!(legend["font"]["size"], 8);

        // panel (0, 0) comes first: both series are legend entries
        assert_eq!(traces[0]["xaxis"], "x");
        assert_eq!(traces[0]["yaxis"], "y");
        assert_eq!(traces[0]["showlegend"], true);
        assert_eq!(traces[0]["name"], "0");
        assert_eq!(traces[0]["legendgroup"], "0");
        assert_eq!(traces[0]["mode"], "markers");
        // panel (0, 1) draws the same groups without legend entries
        assert_eq!(traces[2]["yaxis"], "y2");
        assert_eq!(traces[2]["showlegend"], false);
        assert_eq!(traces[3]["legendgroup"], "1");
        assert_ne!(traces[2]["marker"]["color"], traces[3]["marker"]["color"]);
    }

    #[test]
    fn unlabeled_render_hides_the_legend() {
        let fset = feature_set(None);
        let grid = grid_for(&fset, &["a"]);
        let fig = figure_json(&grid.render(&PlotConfig::default()));

        assert_eq!(fig["layout"]["showlegend"], false);
        let traces = fig["data"].as_array().unwrap();
        assert_eq!(traces.len(), 1);
        assert!(traces[0].get("name").is_none());
    }

    #[test]
    fn axis_ids_skip_the_number_one() {
        assert_eq!(axis_id("x", 0), "x");
        assert_eq!(axis_id("y", 1), "y2");
        assert_eq!(axis_id("x", 9), "x10");
    }
}
