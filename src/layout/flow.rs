use super::*;

/// Homogeneous packing: all children are the same class (all leaf cards or
/// all subtree containers). Tries one candidate container width per prefix
/// of the child list and keeps the best-scoring packing; ties keep the
/// earliest (narrowest) candidate.
pub(super) fn flow_layout(
    nodes: &[LayoutNode],
    children: &[NodeId],
    options: &LayoutOptions,
) -> PackResult {
    if children.is_empty() {
        return PackResult {
            w: 2.0 * options.padding,
            h: options.header_height + options.padding,
            rows: Vec::new(),
        };
    }
    if let [only] = children {
        let size = nodes[*only].size;
        return PackResult {
            w: size.w + 2.0 * options.padding,
            h: size.h + options.header_height + options.padding,
            rows: vec![RowMeta {
                items: vec![*only],
                width: size.w,
                height: size.h,
                placements: Vec::new(),
            }],
        };
    }

    let mut best: Option<PackResult> = None;
    let mut best_score = f32::INFINITY;

    for target in prefix_widths(nodes, children, options) {
        let candidate = pack_rows(nodes, children, target, options);
        let score = score_layout(nodes, &candidate, options);
        if score < best_score {
            best_score = score;
            best = Some(candidate);
        }
    }

    best.expect("candidate search over a non-empty child list")
}

/// Candidate container widths: for each prefix of `children`, the width
/// that fits exactly that prefix in one row.
pub(super) fn prefix_widths(
    nodes: &[LayoutNode],
    children: &[NodeId],
    options: &LayoutOptions,
) -> Vec<f32> {
    let mut widths = Vec::with_capacity(children.len());
    let mut row_width = 0.0f32;
    for (i, &child) in children.iter().enumerate() {
        if i > 0 {
            row_width += options.gap;
        }
        row_width += nodes[child].size.w;
        widths.push(row_width + 2.0 * options.padding);
    }
    widths
}
