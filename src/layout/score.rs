use super::*;

// Global penalty weights; tuned as a set, never per call.
const ASPECT_WEIGHT: f32 = 3.0;
const WASTE_WEIGHT: f32 = 2.0;
const ROW_BALANCE_WEIGHT: f32 = 1.5;
const HEIGHT_SPREAD_WEIGHT: f32 = 2.5;
const LAST_ROW_WEIGHT: f32 = 1.0;

/// Scalar badness of one candidate packing; lower is better. An empty row
/// list scores infinite so it can never win the candidate search.
pub(super) fn score_layout(
    nodes: &[LayoutNode],
    layout: &PackResult,
    options: &LayoutOptions,
) -> f32 {
    if layout.rows.is_empty() {
        return f32::INFINITY;
    }

    let aspect = layout.w / layout.h;
    let aspect_penalty = (aspect - options.aspect_ratio).abs();

    let mut child_area = 0.0f32;
    for row in &layout.rows {
        for &item in &row.items {
            child_area += nodes[item].size.w * nodes[item].size.h;
        }
    }
    let wasted_fraction = 1.0 - child_area / (layout.w * layout.h);

    // RMS of row underfill against the widest possible content row.
    let max_content_width = layout.w - 2.0 * options.padding;
    let mut variance_sum = 0.0f32;
    for row in &layout.rows {
        let fill = if max_content_width > 0.0 {
            row.width / max_content_width
        } else {
            1.0
        };
        variance_sum += (1.0 - fill) * (1.0 - fill);
    }
    let row_balance = (variance_sum / layout.rows.len() as f32).sqrt();

    // Height raggedness within class-homogeneous rows; mixed rows are
    // exempt because subtree and leaf heights differ by design.
    let mut spread_sum = 0.0f32;
    let mut spread_rows = 0usize;
    for row in &layout.rows {
        if row.items.len() < 2 {
            continue;
        }
        let mut has_leaf = false;
        let mut has_subtree = false;
        let mut max_h = 0.0f32;
        let mut min_h = f32::INFINITY;
        for &item in &row.items {
            let node = &nodes[item];
            max_h = max_h.max(node.size.h);
            min_h = min_h.min(node.size.h);
            if node.effective_leaf {
                has_leaf = true;
            } else {
                has_subtree = true;
            }
        }
        if has_leaf && has_subtree {
            continue;
        }
        if max_h > 0.0 {
            spread_sum += (max_h - min_h) / max_h;
            spread_rows += 1;
        }
    }
    let height_spread = if spread_rows > 0 {
        spread_sum / spread_rows as f32
    } else {
        0.0
    };

    let mut last_row_penalty = 0.0f32;
    if layout.rows.len() > 1 {
        let first_width = layout.rows[0].width;
        let last_width = layout.rows[layout.rows.len() - 1].width;
        if first_width > 0.0 {
            last_row_penalty = (1.0 - last_width / first_width).max(0.0) * 0.5;
        }
    }

    aspect_penalty * ASPECT_WEIGHT
        + wasted_fraction * WASTE_WEIGHT
        + row_balance * ROW_BALANCE_WEIGHT
        + height_spread * HEIGHT_SPREAD_WEIGHT
        + last_row_penalty * LAST_ROW_WEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::pack::pack_rows;
    use crate::layout::test_support::{mixed_arena, sized_arena};

    #[test]
    fn empty_rows_score_infinite() {
        let layout = PackResult {
            w: 24.0,
            h: 60.0,
            rows: Vec::new(),
        };
        assert!(score_layout(&[], &layout, &LayoutOptions::default()).is_infinite());
    }

    #[test]
    fn target_aspect_beats_skewed_aspect() {
        let (nodes, ids) = sized_arena(&[(120.0, 55.0); 4]);
        let options = LayoutOptions::default();
        // one tall column vs two balanced rows
        let column = pack_rows(&nodes, &ids, 130.0 + 2.0 * options.padding, &options);
        let grid = pack_rows(&nodes, &ids, 248.0 + 2.0 * options.padding, &options);
        assert!(
            score_layout(&nodes, &grid, &options) < score_layout(&nodes, &column, &options),
            "balanced grid should outscore a single column"
        );
    }

    #[test]
    fn ragged_heights_penalized_in_homogeneous_rows() {
        let (even_nodes, even_ids) = sized_arena(&[(100.0, 50.0), (100.0, 50.0)]);
        let (ragged_nodes, ragged_ids) = sized_arena(&[(100.0, 50.0), (100.0, 150.0)]);
        let options = LayoutOptions::default();
        let even = pack_rows(&even_nodes, &even_ids, 400.0, &options);
        let ragged = pack_rows(&ragged_nodes, &ragged_ids, 400.0, &options);
        let even_score = score_layout(&even_nodes, &even, &options);
        let ragged_score = score_layout(&ragged_nodes, &ragged, &options);
        assert!(even_score < ragged_score);
    }

    #[test]
    fn mixed_rows_exempt_from_height_spread() {
        // same geometry, but one row mixes a subtree with a leaf
        let (nodes, ids) = mixed_arena(&[(100.0, 50.0, false), (100.0, 150.0, true)]);
        let (homog_nodes, homog_ids) = sized_arena(&[(100.0, 50.0), (100.0, 150.0)]);
        let options = LayoutOptions::default();
        let mixed = pack_rows(&nodes, &ids, 400.0, &options);
        let homog = pack_rows(&homog_nodes, &homog_ids, 400.0, &options);
        let mixed_score = score_layout(&nodes, &mixed, &options);
        let homog_score = score_layout(&homog_nodes, &homog, &options);
        assert!(mixed_score < homog_score);
        let spread = (150.0 - 50.0f32) / 150.0 * 2.5;
        assert!((homog_score - mixed_score - spread).abs() < 1e-4);
    }

    #[test]
    fn sparse_last_row_penalized() {
        let (nodes, ids) = sized_arena(&[(100.0, 50.0), (100.0, 50.0), (20.0, 50.0)]);
        let options = LayoutOptions::default();
        let layout = pack_rows(&nodes, &ids, 208.0 + 2.0 * options.padding, &options);
        assert_eq!(layout.rows.len(), 2);
        // last row fills 20/208 of the first; penalty term is bounded by 0.5
        let score = score_layout(&nodes, &layout, &options);
        assert!(score.is_finite());
        assert!(score > 0.0);
    }
}
