use crate::config::LayoutOptions;
use crate::layout::{LayoutResult, NodeId};
use crate::theme::Theme;

/// Render a computed layout to an SVG string. Containers draw before their
/// children, so nesting order is paint order.
pub fn render_svg(layout: &LayoutResult, theme: &Theme, options: &LayoutOptions) -> String {
    let width = layout.total_width;
    let height = layout.total_height;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    for &root in &layout.roots {
        render_node(&mut svg, layout, root, theme, options);
    }

    svg.push_str("</svg>");
    svg
}

fn render_node(
    svg: &mut String,
    layout: &LayoutResult,
    id: NodeId,
    theme: &Theme,
    options: &LayoutOptions,
) {
    let node = &layout.nodes[id];
    let fill = if node.effective_leaf {
        theme.leaf_fill.as_str()
    } else {
        theme.depth_fill(node.depth)
    };

    svg.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{}\" ry=\"{}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
        node.pos.x,
        node.pos.y,
        node.size.w,
        node.size.h,
        theme.corner_radius,
        theme.corner_radius,
        fill,
        theme.border,
        theme.stroke_width
    ));

    let font = if node.effective_leaf {
        &theme.leaf_font
    } else {
        &theme.parent_font
    };
    let weight = if font.bold { "bold" } else { "normal" };
    let color = font.color.as_deref().unwrap_or("#000000");

    // leaf labels center in the card; container labels center in the header band
    let label_x = node.pos.x + node.size.w / 2.0;
    let label_y = if node.effective_leaf {
        node.pos.y + node.size.h / 2.0
    } else {
        node.pos.y + options.header_height / 2.0
    };

    svg.push_str(&format!(
        "<text x=\"{label_x:.2}\" y=\"{label_y:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{}\" font-weight=\"{weight}\" fill=\"{color}\">{}</text>",
        escape_xml(&font.family),
        font.size,
        escape_xml(&node.name)
    ));

    for &child in &node.children {
        render_node(svg, layout, child, theme, options);
    }
}

/// Standalone HTML page embedding the SVG, print-friendly.
pub fn wrap_html(svg: &str, width: f32, _height: f32, theme: &Theme) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width={width}, initial-scale=1.0">
<title>Business Capability Map</title>
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  body {{
    background: {background};
    display: flex;
    justify-content: center;
    align-items: flex-start;
    min-height: 100vh;
    padding: 20px;
  }}
  svg {{ max-width: 100%; height: auto; }}
  @media print {{
    body {{ padding: 0; }}
    svg {{ max-width: 100%; page-break-inside: avoid; }}
  }}
</style>
</head>
<body>
{svg}
</body>
</html>
"#,
        background = theme.background,
    )
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &std::path::Path, scale: f32) -> anyhow::Result<()> {
    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size();
    let width = (size.width() * scale).ceil() as u32;
    let height = (size.height() * scale).ceil() as u32;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width.max(1), height.max(1))
        .ok_or_else(|| anyhow::anyhow!("failed to allocate pixmap"))?;

    let transform = resvg::tiny_skia::Transform::from_scale(scale, scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
