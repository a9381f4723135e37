use crate::layout::LayoutResult;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Flat, serializable mirror of a computed layout. Written by
/// `render --dump-layout` for debugging and golden comparisons.
#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub total_width: f32,
    pub total_height: f32,
    pub leaf_width: f32,
    pub leaf_height: f32,
    pub nodes: Vec<NodeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub name: String,
    pub depth: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub leaf: bool,
    pub children: Vec<usize>,
}

impl LayoutDump {
    pub fn from_layout(layout: &LayoutResult) -> Self {
        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                name: node.name.clone(),
                depth: node.depth,
                x: node.pos.x,
                y: node.pos.y,
                width: node.size.w,
                height: node.size.h,
                leaf: node.effective_leaf,
                children: node.children.clone(),
            })
            .collect();

        LayoutDump {
            total_width: layout.total_width,
            total_height: layout.total_height,
            leaf_width: layout.leaf_size.w,
            leaf_height: layout.leaf_size.h,
            nodes,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &LayoutResult) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &LayoutDump::from_layout(layout))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutOptions;
    use crate::layout::layout_trees;
    use crate::model::CapabilityNode;
    use crate::text_metrics::stub_measure;

    #[test]
    fn dump_mirrors_layout() {
        let mut root = CapabilityNode::new("r_0", "Root");
        root.children.push(CapabilityNode::new("a_0", "A"));
        let layout = layout_trees(&[root], &LayoutOptions::default(), stub_measure);
        let dump = LayoutDump::from_layout(&layout);
        assert_eq!(dump.nodes.len(), 2);
        assert_eq!(dump.total_width, layout.total_width);
        assert_eq!(dump.leaf_width, layout.leaf_size.w);
        let root_dump = &dump.nodes[0];
        assert_eq!(root_dump.name, "Root");
        assert!(!root_dump.leaf);
        assert_eq!(root_dump.children, vec![1]);
    }
}
