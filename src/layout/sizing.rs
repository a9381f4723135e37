use super::*;

/// Order children for packing. Classification into subtree/leaf is already
/// fixed at this point, so the comparator only reads flags and names.
/// Byte-lexicographic name order keeps results identical across platforms.
pub(super) fn sort_children(nodes: &[LayoutNode], children: &mut [NodeId], mode: SortMode) {
    match mode {
        SortMode::Subtrees => children.sort_by(|&a, &b| {
            nodes[a]
                .effective_leaf
                .cmp(&nodes[b].effective_leaf)
                .then_with(|| nodes[a].name.cmp(&nodes[b].name))
        }),
        SortMode::Alphabetical => {
            children.sort_by(|&a, &b| nodes[a].name.cmp(&nodes[b].name));
        }
    }
}

/// Bottom-up sizing: children first (post-order), then sort, split into
/// subtree/leaf groups, and pack the node's own content box. Effective
/// leaves take the uniform card size and carry no rows.
pub(super) fn calculate_size(
    nodes: &mut Vec<LayoutNode>,
    node: NodeId,
    leaf: Size,
    options: &LayoutOptions,
) {
    if nodes[node].effective_leaf {
        nodes[node].size = leaf;
        nodes[node].rows.clear();
        return;
    }

    let mut children = std::mem::take(&mut nodes[node].children);
    for &child in &children {
        calculate_size(nodes, child, leaf, options);
    }

    sort_children(nodes, &mut children, options.sort_mode);

    let mut subtrees: Vec<NodeId> = Vec::new();
    let mut leaves: Vec<NodeId> = Vec::new();
    for &child in &children {
        if nodes[child].effective_leaf {
            leaves.push(child);
        } else {
            subtrees.push(child);
        }
    }

    let pack = if !subtrees.is_empty() && !leaves.is_empty() {
        banded_flow_layout(nodes, &subtrees, &leaves, options)
    } else {
        flow_layout(nodes, &children, options)
    };

    let entry = &mut nodes[node];
    entry.children = children;
    entry.size = Size {
        w: pack.w,
        h: pack.h,
    };
    entry.rows = pack.rows;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::test_support::named_arena;

    #[test]
    fn subtrees_mode_partitions_then_alphabetizes() {
        let (nodes, mut ids) = named_arena(&[
            ("zebra", true),
            ("apple", false),
            ("mango", true),
            ("cherry", false),
        ]);
        sort_children(&nodes, &mut ids, SortMode::Subtrees);
        let names: Vec<&str> = ids.iter().map(|&i| nodes[i].name.as_str()).collect();
        assert_eq!(names, vec!["apple", "cherry", "mango", "zebra"]);
    }

    #[test]
    fn alphabetical_mode_ignores_class() {
        let (nodes, mut ids) = named_arena(&[
            ("zebra", true),
            ("apple", false),
            ("mango", true),
            ("cherry", false),
        ]);
        sort_children(&nodes, &mut ids, SortMode::Alphabetical);
        let names: Vec<&str> = ids.iter().map(|&i| nodes[i].name.as_str()).collect();
        assert_eq!(names, vec!["apple", "cherry", "mango", "zebra"]);
        // same outcome here, but class no longer drives the order
        let (nodes, mut ids) = named_arena(&[("beta", false), ("alpha", true)]);
        sort_children(&nodes, &mut ids, SortMode::Alphabetical);
        assert_eq!(nodes[ids[0]].name, "alpha");
    }

    #[test]
    fn sort_is_stable_for_equal_names() {
        let (nodes, mut ids) = named_arena(&[("same", true), ("same", true), ("same", true)]);
        let before = ids.clone();
        sort_children(&nodes, &mut ids, SortMode::Subtrees);
        assert_eq!(ids, before);
    }
}
