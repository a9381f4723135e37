use super::*;

/// Rebuild a row's flow positions as explicit placements so tiled leaves
/// can join items that were packed left to right. No-op once placements
/// exist.
fn ensure_placements(nodes: &[LayoutNode], row: &mut RowMeta, options: &LayoutOptions) {
    if !row.placements.is_empty() {
        return;
    }
    let mut x = 0.0f32;
    for &item in &row.items {
        row.placements.push(Placement { node: item, x, y: 0.0 });
        x += nodes[item].size.w + options.gap;
    }
}

/// Tile leaf cards into the horizontal slack of already-packed rows, last
/// row first. Within a row, leaves fill a column-major grid bounded by the
/// row's height and the remaining content width. Returns the leaves that
/// found no room, in their original order.
///
/// All leaves share one size, so capacity math only consults the first.
pub(super) fn backfill_rows(
    nodes: &[LayoutNode],
    rows: &mut [RowMeta],
    leaves: &[NodeId],
    content_width: f32,
    options: &LayoutOptions,
) -> Vec<NodeId> {
    if leaves.is_empty() {
        return Vec::new();
    }

    let leaf_w = nodes[leaves[0]].size.w;
    let leaf_h = nodes[leaves[0]].size.h;
    let mut leaf_idx = 0usize;

    for row in rows.iter_mut().rev() {
        if leaf_idx >= leaves.len() {
            break;
        }
        let start_x = row.width + if row.items.is_empty() { 0.0 } else { options.gap };
        let available = content_width - start_x;
        if available < leaf_w {
            continue;
        }

        let max_cols = ((available + options.gap) / (leaf_w + options.gap)).floor() as usize;
        if max_cols == 0 {
            continue;
        }
        let stack_height = ((row.height + options.gap) / (leaf_h + options.gap)).floor() as usize;
        if stack_height == 0 {
            continue;
        }

        let capacity = max_cols * stack_height;
        let place_count = capacity.min(leaves.len() - leaf_idx);
        if place_count == 0 {
            continue;
        }

        ensure_placements(nodes, row, options);

        for p in 0..place_count {
            let col = p / stack_height;
            let stack_row = p % stack_height;
            let leaf = leaves[leaf_idx];
            leaf_idx += 1;

            let px = start_x + col as f32 * (leaf_w + options.gap);
            let py = stack_row as f32 * (leaf_h + options.gap);

            row.placements.push(Placement {
                node: leaf,
                x: px,
                y: py,
            });
            row.items.push(leaf);
            row.width = row.width.max(px + nodes[leaf].size.w);
            row.height = row.height.max(py + nodes[leaf].size.h);
        }
    }

    leaves[leaf_idx..].to_vec()
}
