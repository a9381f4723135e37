use bcm_renderer::config::LayoutOptions;
use bcm_renderer::layout::layout_trees;
use bcm_renderer::model::CapabilityNode;
use bcm_renderer::render::render_svg;
use bcm_renderer::text_metrics::stub_measure;
use bcm_renderer::theme::Theme;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

/// Flat fan-out: one root with `n` leaf children.
fn wide_tree(n: usize) -> Vec<CapabilityNode> {
    let mut root = CapabilityNode::new("root_0", "Enterprise");
    for i in 0..n {
        root.children
            .push(CapabilityNode::new(format!("leaf_{i}"), format!("Capability {i}")));
    }
    vec![root]
}

/// Balanced hierarchy: `breadth` children per node, `depth` levels.
fn deep_tree(breadth: usize, depth: usize) -> Vec<CapabilityNode> {
    fn grow(path: &str, breadth: usize, depth: usize) -> CapabilityNode {
        let mut node = CapabilityNode::new(path.to_string(), format!("Node {path}"));
        if depth > 0 {
            for i in 0..breadth {
                node.children.push(grow(&format!("{path}-{i}"), breadth, depth - 1));
            }
        }
        node
    }
    vec![grow("r", breadth, depth)]
}

/// Mixed shape: subtree and leaf children at every level, exercising the
/// banded packer and backfill.
fn mixed_tree(sections: usize) -> Vec<CapabilityNode> {
    let mut root = CapabilityNode::new("org_0", "Organization");
    for s in 0..sections {
        let mut section = CapabilityNode::new(format!("sec_{s}"), format!("Section {s}"));
        for i in 0..4 {
            let mut group =
                CapabilityNode::new(format!("grp_{s}_{i}"), format!("Group {s}.{i}"));
            for j in 0..3 {
                group
                    .children
                    .push(CapabilityNode::new(format!("g_{s}_{i}_{j}"), format!("Item {j}")));
            }
            section.children.push(group);
        }
        for i in 0..6 {
            section
                .children
                .push(CapabilityNode::new(format!("l_{s}_{i}"), format!("Leaf {s}.{i}")));
        }
        root.children.push(section);
    }
    vec![root]
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let options = LayoutOptions::default();

    for n in [16usize, 64, 256] {
        let roots = wide_tree(n);
        group.bench_with_input(BenchmarkId::new("wide", n), &roots, |b, roots| {
            b.iter(|| {
                let layout = layout_trees(black_box(roots), &options, stub_measure);
                black_box(layout.nodes.len());
            });
        });
    }

    for (breadth, depth) in [(3usize, 4usize), (4, 5)] {
        let name = format!("b{breadth}_d{depth}");
        let roots = deep_tree(breadth, depth);
        group.bench_with_input(BenchmarkId::new("deep", name), &roots, |b, roots| {
            b.iter(|| {
                let layout = layout_trees(black_box(roots), &options, stub_measure);
                black_box(layout.nodes.len());
            });
        });
    }

    for sections in [4usize, 12] {
        let roots = mixed_tree(sections);
        group.bench_with_input(BenchmarkId::new("mixed", sections), &roots, |b, roots| {
            b.iter(|| {
                let layout = layout_trees(black_box(roots), &options, stub_measure);
                black_box(layout.nodes.len());
            });
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_svg");
    let options = LayoutOptions::default();
    let theme = Theme::classic();

    for sections in [4usize, 12] {
        let roots = mixed_tree(sections);
        let layout = layout_trees(&roots, &options, stub_measure);
        group.bench_with_input(BenchmarkId::from_parameter(sections), &layout, |b, layout| {
            b.iter(|| {
                let svg = render_svg(black_box(layout), &theme, &options);
                black_box(svg.len());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_layout, bench_render);
criterion_main!(benches);
