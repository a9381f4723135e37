use super::*;

/// Bounding box over an assembled row list, same accounting as `pack_rows`.
fn layout_from_rows(rows: Vec<RowMeta>, options: &LayoutOptions) -> PackResult {
    let mut max_row_width = 0.0f32;
    let mut h = options.header_height;
    for (r, row) in rows.iter().enumerate() {
        max_row_width = max_row_width.max(row.width);
        if r > 0 {
            h += options.gap;
        }
        h += row.height;
    }
    PackResult {
        w: max_row_width + 2.0 * options.padding,
        h: h + options.padding,
        rows,
    }
}

/// Heterogeneous packing for a parent with both subtree and leaf children:
/// subtrees pack into rows, leaves tile into the rows' slack, overflow
/// leaves pack into trailing rows. Candidate widths are the prefix widths
/// of both groups; each candidate owns its rows, so backfill mutation
/// cannot leak across candidates.
pub(super) fn banded_flow_layout(
    nodes: &[LayoutNode],
    subtrees: &[NodeId],
    leaves: &[NodeId],
    options: &LayoutOptions,
) -> PackResult {
    let mut candidates = prefix_widths(nodes, subtrees, options);
    candidates.extend(prefix_widths(nodes, leaves, options));

    let mut best: Option<PackResult> = None;
    let mut best_score = f32::INFINITY;

    for target in candidates {
        let mut rows = pack_rows(nodes, subtrees, target, options).rows;
        let remaining = backfill_rows(
            nodes,
            &mut rows,
            leaves,
            target - 2.0 * options.padding,
            options,
        );
        if !remaining.is_empty() {
            rows.extend(pack_rows(nodes, &remaining, target, options).rows);
        }
        let layout = layout_from_rows(rows, options);

        let score = score_layout(nodes, &layout, options);
        if score < best_score {
            best_score = score;
            best = Some(layout);
        }
    }

    best.expect("banded search requires at least one subtree or leaf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::test_support::mixed_arena;

    #[test]
    fn narrow_subtree_gets_backfilled_leaves() {
        let (nodes, ids) = mixed_arena(&[
            (150.0, 130.0, false),
            (120.0, 55.0, true),
            (120.0, 55.0, true),
            (120.0, 55.0, true),
        ]);
        let options = LayoutOptions::default();
        let result = banded_flow_layout(&nodes, &ids[..1], &ids[1..], &options);

        let first = &result.rows[0];
        assert!(
            first.items.len() > 1,
            "expected at least one leaf tiled into the subtree row, got {:?}",
            result.rows.iter().map(|r| r.items.len()).collect::<Vec<_>>()
        );
        assert!(!first.placements.is_empty());
        // every child appears exactly once across all rows
        let mut seen: Vec<NodeId> = result.rows.iter().flat_map(|r| r.items.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, ids);
    }

    #[test]
    fn overflow_leaves_form_trailing_rows() {
        // subtree too short to host any leaf: all leaves overflow
        let (nodes, ids) = mixed_arena(&[
            (400.0, 30.0, false),
            (120.0, 55.0, true),
            (120.0, 55.0, true),
        ]);
        let options = LayoutOptions::default();
        let result = banded_flow_layout(&nodes, &ids[..1], &ids[1..], &options);
        assert!(result.rows.len() >= 2);
        assert_eq!(result.rows[0].items, vec![ids[0]]);
        let trailing: Vec<NodeId> = result.rows[1..]
            .iter()
            .flat_map(|r| r.items.clone())
            .collect();
        assert_eq!(trailing, vec![ids[1], ids[2]]);
    }

    #[test]
    fn bounding_box_covers_all_rows() {
        let (nodes, ids) = mixed_arena(&[
            (200.0, 140.0, false),
            (180.0, 120.0, false),
            (120.0, 55.0, true),
            (120.0, 55.0, true),
        ]);
        let options = LayoutOptions::default();
        let result = banded_flow_layout(&nodes, &ids[..2], &ids[2..], &options);
        let widest = result
            .rows
            .iter()
            .map(|r| r.width)
            .fold(0.0f32, f32::max);
        assert_eq!(result.w, widest + 2.0 * options.padding);
        let stacked: f32 = result.rows.iter().map(|r| r.height).sum::<f32>()
            + options.gap * (result.rows.len() as f32 - 1.0);
        assert_eq!(
            result.h,
            options.header_height + stacked + options.padding
        );
    }
}
