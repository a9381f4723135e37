/// Index of a node in the layout arena.
pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub w: f32,
    pub h: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Explicit placement of one item inside a row, relative to the row origin.
/// Used after backfill, where leaf cards tile in columns instead of flowing
/// left to right.
#[derive(Debug, Clone)]
pub struct Placement {
    pub node: NodeId,
    pub x: f32,
    pub y: f32,
}

/// One horizontal band of a container's content area.
///
/// `placements` is empty for a plain left-to-right row; once backfill has
/// touched a row, every item (original and tiled) carries a placement.
#[derive(Debug, Clone, Default)]
pub struct RowMeta {
    pub items: Vec<NodeId>,
    pub width: f32,
    pub height: f32,
    pub placements: Vec<Placement>,
}

/// Outcome of one candidate packing: overall content box plus its rows.
#[derive(Debug, Clone)]
pub struct PackResult {
    pub w: f32,
    pub h: f32,
    pub rows: Vec<RowMeta>,
}

/// Working node of the layout arena. Interned once per input node, sized
/// bottom-up, positioned top-down. Children are arena indices; rows refer
/// to children by the same indices, so nothing aliases.
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub children: Vec<NodeId>,
    pub size: Size,
    pub rows: Vec<RowMeta>,
    pub pos: Point,
    pub depth: usize,
    /// True when the node has no children or sits at the depth cutoff.
    /// Fixed at arena construction; never changes afterward.
    pub effective_leaf: bool,
}

/// Final geometry for one layout call: the flattened arena (parent/child
/// links preserved as indices), root indices in input order, canvas bounds,
/// and the uniform leaf card size.
#[derive(Debug, Clone)]
pub struct LayoutResult {
    pub nodes: Vec<LayoutNode>,
    pub roots: Vec<NodeId>,
    pub total_width: f32,
    pub total_height: f32,
    pub leaf_size: Size,
}
