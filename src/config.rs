use serde::{Deserialize, Serialize};

/// Horizontal alignment of packed rows inside their container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// Child ordering applied before packing. Packing is order-dependent, so
/// the mode is part of the layout contract, not a display concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Subtrees before leaves, each group alphabetical.
    Subtrees,
    /// Alphabetical regardless of subtree/leaf class.
    Alphabetical,
}

/// Parameters for one layout run. Shared by reference through the whole
/// recursive computation and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Gap between sibling boxes and between rows, px.
    pub gap: f32,
    /// Inner padding of a container, px.
    pub padding: f32,
    /// Vertical space reserved for a container's title, px.
    pub header_height: f32,
    /// Horizontal gap between root trees, px.
    pub root_gap: f32,
    /// Margin around the whole drawing, px.
    pub view_margin: f32,
    /// Target width/height ratio the scorer steers toward.
    pub aspect_ratio: f32,
    pub alignment: Alignment,
    /// Depth at which subtrees collapse into leaf cards; -1 = unlimited.
    pub max_depth: i32,
    pub sort_mode: SortMode,
    pub min_leaf_width: f32,
    pub max_leaf_width: f32,
    pub leaf_height: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            gap: 8.0,
            padding: 12.0,
            header_height: 48.0,
            root_gap: 30.0,
            view_margin: 20.0,
            aspect_ratio: 1.6,
            alignment: Alignment::Center,
            max_depth: -1,
            sort_mode: SortMode::Subtrees,
            min_leaf_width: 120.0,
            max_leaf_width: 200.0,
            leaf_height: 55.0,
        }
    }
}
