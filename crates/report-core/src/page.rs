use serde::{Deserialize, Serialize};

/// One navigable page of the report. The renderer emits these; the assembler
/// consumes them. This schema is the whole contract between the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageModel {
    pub title: String,
    /// Stable identifier used for navigation anchors.
    pub slug: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Section {
    Table(Table),
    Chart(ChartSpec),
    Narrative(Narrative),
}

/// Already-formatted tabular values. No computation happens past this point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub title: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    Radar,
    Box,
    Heatmap,
}

/// A named value sequence; `x` carries the category labels (years, metric
/// names) and `values` may hold gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    pub x: Vec<String>,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeTone {
    Strength,
    Weakness,
    Recommendation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeItem {
    pub tone: NarrativeTone,
    pub text: String,
}

/// Canned, classifier-produced statements for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub heading: String,
    pub items: Vec<NarrativeItem>,
}
