use super::*;

/// One card size for every effective leaf in the forest: the widest leaf
/// name plus padding and a small caption allowance, clamped to the
/// configured bounds. Height is fixed by configuration. A forest with no
/// leaves falls back to the minimum width.
pub(super) fn uniform_leaf_size<F: Fn(&str) -> f32>(
    nodes: &[LayoutNode],
    options: &LayoutOptions,
    measure: &F,
) -> Size {
    let mut max_text_width = 0.0f32;
    for node in nodes {
        if node.effective_leaf {
            max_text_width = max_text_width.max(measure(&node.name));
        }
    }

    let w = options
        .min_leaf_width
        .max((max_text_width + 2.0 * options.padding + 10.0).min(options.max_leaf_width));

    Size {
        w,
        h: options.leaf_height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::test_support::named_arena;
    use crate::text_metrics::stub_measure;

    #[test]
    fn short_names_clamp_to_minimum() {
        let (nodes, _) = named_arena(&[("Hi", true)]);
        let options = LayoutOptions::default();
        let size = uniform_leaf_size(&nodes, &options, &stub_measure);
        // 2*7 + 24 + 10 = 48, below the 120 floor
        assert_eq!(size.w, 120.0);
        assert_eq!(size.h, 55.0);
    }

    #[test]
    fn widest_leaf_name_wins_within_bounds() {
        let (nodes, _) = named_arena(&[
            ("Billing", true),
            ("Customer Relationship Mgmt", true),
            ("HR", true),
        ]);
        let options = LayoutOptions::default();
        let size = uniform_leaf_size(&nodes, &options, &stub_measure);
        // 26*7 + 24 + 10 = 216, above the 200 ceiling
        assert_eq!(size.w, 200.0);
    }

    #[test]
    fn only_effective_leaves_are_measured() {
        let (nodes, _) = named_arena(&[
            ("An Extremely Long Container Name Indeed", false),
            ("Ok", true),
        ]);
        let options = LayoutOptions::default();
        let size = uniform_leaf_size(&nodes, &options, &stub_measure);
        assert_eq!(size.w, 120.0);
    }

    #[test]
    fn leafless_forest_uses_minimum() {
        let (nodes, _) = named_arena(&[("Root", false)]);
        let options = LayoutOptions::default();
        let size = uniform_leaf_size(&nodes, &options, &stub_measure);
        assert_eq!(size.w, options.min_leaf_width);
    }
}
