//! SVG drawings of snapshot layouts for visual review.

use crate::error::TfResult;
use crate::schema::{Binding, BindingName, Direction};
use crate::snapshot::{SnapshotBundle, ViewportSnapshot};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const FALLBACK_COLOR: &str = "#94A3B8";

pub fn role_color(role: BindingName) -> &'static str {
    match role {
        BindingName::Move => "#1F6F8B",
        BindingName::Aim => "#0F4C81",
        BindingName::Primary => "#F59E0B",
        BindingName::Secondary => "#60A5FA",
        BindingName::Tertiary => "#A78BFA",
        BindingName::Modifier => FALLBACK_COLOR,
        BindingName::Jump => "#F97316",
        BindingName::Magnitude => "#22C55E",
        BindingName::Pause => "#64748B",
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn format_keys(keys: &Binding) -> String {
    match keys {
        Binding::Key(k) => k.clone(),
        Binding::Axis(axis) => [Direction::Up, Direction::Down, Direction::Left, Direction::Right]
            .into_iter()
            .filter_map(|d| axis.get(d).map(|k| format!("{}:{}", d, k)))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

pub fn build_svg(game: &str, viewport: &str, snapshot: &ViewportSnapshot) -> String {
    let m = &snapshot.metrics;
    let sa = m.safe_area;
    let safe_width = (m.width - sa.left - sa.right).max(0.0);
    let safe_height = (m.height - sa.top - sa.bottom).max(0.0);
    let header = format!("{} - {} ({})", game, viewport, snapshot.summary.layout);

    let mut svg = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = m.width,
        h = m.height
    );
    svg.push_str("<defs>\n<style>\n");
    svg.push_str("text { font-family: ui-monospace, Menlo, Consolas, monospace; }\n");
    svg.push_str(".label { fill: #E2E8F0; font-size: 12px; }\n");
    svg.push_str(".title { fill: #E2E8F0; font-size: 14px; font-weight: 600; }\n");
    svg.push_str(".safe { fill: none; stroke: #475569; stroke-width: 2; stroke-dasharray: 6 4; }\n");
    svg.push_str(".button { stroke: #0F172A; stroke-width: 2; }\n");
    svg.push_str("</style>\n</defs>\n");
    let _ = writeln!(
        svg,
        r##"<rect width="{}" height="{}" fill="#0B1020" />"##,
        m.width, m.height
    );
    let _ = writeln!(
        svg,
        r#"<rect class="safe" x="{}" y="{}" width="{}" height="{}" />"#,
        sa.left, sa.top, safe_width, safe_height
    );
    let _ = writeln!(
        svg,
        r#"<text class="title" x="12" y="22">{}</text>"#,
        escape_xml(&header)
    );

    for button in &snapshot.summary.buttons {
        let radius = button.size / 2.0;
        let font_size = (radius / 2.0).floor().clamp(10.0, 14.0);
        let label = escape_xml(&button.id);
        let keys = escape_xml(&format_keys(&button.keys));
        let _ = writeln!(
            svg,
            r#"<g class="button-group"><title>{label} {keys}</title><circle class="button" cx="{x}" cy="{y}" r="{r}" fill="{fill}" /><text class="label" x="{x}" y="{ty:.1}" text-anchor="middle" font-size="{fs}">{label}</text></g>"#,
            label = label,
            keys = keys,
            x = button.x,
            y = button.y,
            r = radius,
            fill = role_color(button.role),
            ty = button.y + font_size / 3.0,
            fs = font_size,
        );
    }

    svg.push_str("</svg>\n");
    svg
}

/// Writes `<out>/<game>/<viewport>.svg` for every selected game.
pub fn render_bundle<P: AsRef<Path>>(
    bundle: &SnapshotBundle,
    output_dir: P,
    allow: Option<&BTreeSet<String>>,
) -> TfResult<Vec<PathBuf>> {
    let output_dir = output_dir.as_ref();
    let mut written = Vec::new();

    for (game, entry) in &bundle.games {
        if allow.is_some_and(|names| !names.contains(game)) {
            continue;
        }
        let dir = output_dir.join(game);
        fs::create_dir_all(&dir)?;
        for (viewport, snapshot) in &entry.layouts {
            let path = dir.join(format!("{}.svg", viewport));
            fs::write(&path, build_svg(game, viewport, snapshot))?;
            written.push(path);
        }
    }

    info!("Wrote {} layout renders to {}", written.len(), output_dir.display());
    Ok(written)
}
