use super::*;

/// Greedy left-to-right row wrap of `children` against a hypothetical
/// container width. A child that alone exceeds the available content width
/// still gets a row of its own; rows are never empty.
pub(super) fn pack_rows(
    nodes: &[LayoutNode],
    children: &[NodeId],
    target_width: f32,
    options: &LayoutOptions,
) -> PackResult {
    let content_width = target_width - 2.0 * options.padding;

    let mut rows: Vec<Vec<NodeId>> = Vec::new();
    let mut current: Vec<NodeId> = Vec::new();
    let mut current_width = 0.0f32;

    for &child in children {
        let w = nodes[child].size.w;
        let needed = if current.is_empty() { w } else { options.gap + w };
        if !current.is_empty() && current_width + needed > content_width {
            rows.push(std::mem::take(&mut current));
            current.push(child);
            current_width = w;
        } else {
            current.push(child);
            current_width += needed;
        }
    }
    if !current.is_empty() {
        rows.push(current);
    }

    let mut max_row_width = 0.0f32;
    let mut total_height = options.header_height;
    let mut meta: Vec<RowMeta> = Vec::with_capacity(rows.len());

    for (r, row) in rows.into_iter().enumerate() {
        let mut row_width = 0.0f32;
        let mut row_height = 0.0f32;
        for (j, &item) in row.iter().enumerate() {
            if j > 0 {
                row_width += options.gap;
            }
            row_width += nodes[item].size.w;
            row_height = row_height.max(nodes[item].size.h);
        }
        max_row_width = max_row_width.max(row_width);
        if r > 0 {
            total_height += options.gap;
        }
        total_height += row_height;
        meta.push(RowMeta {
            items: row,
            width: row_width,
            height: row_height,
            placements: Vec::new(),
        });
    }

    PackResult {
        w: max_row_width + 2.0 * options.padding,
        h: total_height + options.padding,
        rows: meta,
    }
}
