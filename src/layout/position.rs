use super::*;

/// Top-down positioning. Roots march left to right along the view margin;
/// every container then places its rows under its header, honoring the
/// alignment offset, and recurses depth-first.
pub(super) fn position_roots(nodes: &mut [LayoutNode], roots: &[NodeId], options: &LayoutOptions) {
    let mut cursor_x = options.view_margin;
    for &root in roots {
        nodes[root].pos = Point {
            x: cursor_x,
            y: options.view_margin,
        };
        position_children(nodes, root, options);
        cursor_x += nodes[root].size.w + options.root_gap;
    }
}

fn position_children(nodes: &mut [LayoutNode], node: NodeId, options: &LayoutOptions) {
    if nodes[node].effective_leaf {
        return;
    }

    let origin = nodes[node].pos;
    let content_width = nodes[node].size.w - 2.0 * options.padding;
    // Rows are read-only here; clone frees the arena for child writes.
    let rows = nodes[node].rows.clone();

    let mut y = options.header_height;
    for row in &rows {
        let row_offset_x = match options.alignment {
            Alignment::Left => 0.0,
            Alignment::Center => ((content_width - row.width) / 2.0).max(0.0),
            Alignment::Right => (content_width - row.width).max(0.0),
        };

        if !row.placements.is_empty() {
            for placement in &row.placements {
                nodes[placement.node].pos = Point {
                    x: origin.x + options.padding + row_offset_x + placement.x,
                    y: origin.y + y + placement.y,
                };
                position_children(nodes, placement.node, options);
            }
        } else {
            let mut x = options.padding + row_offset_x;
            for &child in &row.items {
                nodes[child].pos = Point {
                    x: origin.x + x,
                    y: origin.y + y,
                };
                x += nodes[child].size.w + options.gap;
                position_children(nodes, child, options);
            }
        }

        y += row.height + options.gap;
    }
}
