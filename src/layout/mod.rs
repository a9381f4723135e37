mod backfill;
mod banded;
mod flow;
mod leaf_size;
mod pack;
mod position;
mod score;
mod sizing;
pub(crate) mod types;

pub use types::*;

use backfill::*;
use banded::*;
use flow::*;
use leaf_size::*;
use pack::*;
use position::*;
use score::*;
use sizing::*;

use crate::config::{Alignment, LayoutOptions, SortMode};
use crate::model::CapabilityNode;

/// Intern one capability subtree into the arena. Classification into
/// effective leaves happens here: nodes below the depth cutoff are never
/// interned, so the arena holds exactly the nodes that get laid out.
fn intern(
    nodes: &mut Vec<LayoutNode>,
    cap: &CapabilityNode,
    depth: usize,
    options: &LayoutOptions,
) -> NodeId {
    let effective_leaf = cap.children.is_empty()
        || (options.max_depth != -1 && depth as i32 >= options.max_depth);

    let id = nodes.len();
    nodes.push(LayoutNode {
        id: cap.id.clone(),
        name: cap.name.clone(),
        description: cap.description.clone(),
        children: Vec::new(),
        size: Size { w: 0.0, h: 0.0 },
        rows: Vec::new(),
        pos: Point::default(),
        depth,
        effective_leaf,
    });

    if !effective_leaf {
        let children: Vec<NodeId> = cap
            .children
            .iter()
            .map(|child| intern(nodes, child, depth + 1, options))
            .collect();
        nodes[id].children = children;
    }

    id
}

/// Lay out a capability forest: uniform leaf sizing, bottom-up size
/// computation per root, top-down positioning, then canvas bounds.
///
/// Pure with respect to its inputs; identical inputs produce bit-identical
/// results. `measure` must return a non-negative finite width for any
/// string and be stable within the call.
pub fn layout_trees<F: Fn(&str) -> f32>(
    roots: &[CapabilityNode],
    options: &LayoutOptions,
    measure: F,
) -> LayoutResult {
    let mut nodes: Vec<LayoutNode> = Vec::new();
    let root_ids: Vec<NodeId> = roots
        .iter()
        .map(|root| intern(&mut nodes, root, 0, options))
        .collect();

    let leaf = uniform_leaf_size(&nodes, options, &measure);

    for &root in &root_ids {
        calculate_size(&mut nodes, root, leaf, options);
    }

    position_roots(&mut nodes, &root_ids, options);

    let mut total_width = 0.0f32;
    let mut total_height = 0.0f32;
    for &root in &root_ids {
        let node = &nodes[root];
        total_width = total_width.max(node.pos.x + node.size.w);
        total_height = total_height.max(node.pos.y + node.size.h);
    }
    if root_ids.is_empty() {
        // nothing to draw: a margin on each side of zero extent
        total_width = options.view_margin;
        total_height = options.view_margin;
    }
    total_width += options.view_margin;
    total_height += options.view_margin;

    LayoutResult {
        nodes,
        roots: root_ids,
        total_width,
        total_height,
        leaf_size: leaf,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    fn bare(name: &str, size: Size, effective_leaf: bool) -> LayoutNode {
        LayoutNode {
            id: name.to_string(),
            name: name.to_string(),
            description: None,
            children: Vec::new(),
            size,
            rows: Vec::new(),
            pos: Point::default(),
            depth: 0,
            effective_leaf,
        }
    }

    /// Arena of already-sized leaf nodes, ids in declaration order.
    pub fn sized_arena(sizes: &[(f32, f32)]) -> (Vec<LayoutNode>, Vec<NodeId>) {
        let nodes = sizes
            .iter()
            .enumerate()
            .map(|(i, &(w, h))| bare(&format!("n{i}"), Size { w, h }, true))
            .collect();
        (nodes, (0..sizes.len()).collect())
    }

    /// Arena mixing classes: `(w, h, is_leaf)` per node.
    pub fn mixed_arena(specs: &[(f32, f32, bool)]) -> (Vec<LayoutNode>, Vec<NodeId>) {
        let nodes = specs
            .iter()
            .enumerate()
            .map(|(i, &(w, h, is_leaf))| bare(&format!("n{i}"), Size { w, h }, is_leaf))
            .collect();
        (nodes, (0..specs.len()).collect())
    }

    /// Arena of zero-sized nodes with explicit names and classes.
    pub fn named_arena(specs: &[(&str, bool)]) -> (Vec<LayoutNode>, Vec<NodeId>) {
        let nodes = specs
            .iter()
            .map(|&(name, is_leaf)| bare(name, Size { w: 0.0, h: 0.0 }, is_leaf))
            .collect();
        (nodes, (0..specs.len()).collect())
    }

    pub fn leaf(name: &str) -> CapabilityNode {
        CapabilityNode::new(name, name)
    }

    pub fn branch(name: &str, child_names: &[&str]) -> CapabilityNode {
        let mut node = CapabilityNode::new(name, name);
        node.children = child_names.iter().map(|n| leaf(n)).collect();
        node
    }
}
