use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use touchforge::compare::{CompareReport, Diff};
use touchforge::geometry::{LayoutMetrics, Packing};
use touchforge::keycodes::KeyDescriptor;
use touchforge::schema::Binding;
use touchforge::snapshot::SnapshotBundle;
use touchforge::LayoutResult;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn align_right(table: &mut Table, columns: std::ops::RangeInclusive<usize>) {
    for i in columns {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
}

fn keys_text(keys: &Binding) -> String {
    match keys {
        Binding::Key(k) => k.clone(),
        Binding::Axis(axis) => axis
            .iter()
            .map(|(dir, key)| format!("{}:{}", dir, key))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn diff_text(diffs: &[Diff]) -> String {
    diffs
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn layout(result: &LayoutResult) {
    println!("\nLayout: {}", result.layout);
    let mut table = new_table();

    table.add_row(vec![
        Cell::new("Id").add_attribute(Attribute::Bold),
        Cell::new("Role"),
        Cell::new("Type"),
        Cell::new("Keys"),
        Cell::new("X").fg(Color::Cyan),
        Cell::new("Y").fg(Color::Cyan),
        Cell::new("Size"),
        Cell::new("Pair"),
    ]);
    align_right(&mut table, 4..=6);

    for b in &result.buttons {
        let pair = b
            .pair
            .as_ref()
            .map(|p| format!("{} ({})", p.id, p.position))
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(&b.id).add_attribute(Attribute::Bold),
            Cell::new(b.role),
            Cell::new(b.control_type),
            Cell::new(keys_text(&b.keys)),
            Cell::new(format!("{:.1}", b.x)).fg(Color::Cyan),
            Cell::new(format!("{:.1}", b.y)).fg(Color::Cyan),
            Cell::new(format!("{:.1}", b.size)),
            Cell::new(pair),
        ]);
    }
    println!("{}", table);
}

pub fn metrics(m: &LayoutMetrics) {
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("Viewport").add_attribute(Attribute::Bold),
        Cell::new("Safe T/R/B/L"),
        Cell::new("Pad"),
        Cell::new("Gap"),
        Cell::new("Move"),
        Cell::new("Action"),
        Cell::new("Small"),
        Cell::new("Packing"),
    ]);
    align_right(&mut table, 2..=6);

    let packing = match m.packing {
        Packing::Standard => Cell::new(m.packing).fg(Color::Green),
        Packing::Tight => Cell::new(m.packing).fg(Color::Yellow),
        Packing::Compact => Cell::new(m.packing).fg(Color::Red),
    };
    let sa = m.safe_area;
    table.add_row(vec![
        Cell::new(format!("{}x{}", m.width, m.height)).add_attribute(Attribute::Bold),
        Cell::new(format!("{}/{}/{}/{}", sa.top, sa.right, sa.bottom, sa.left)),
        Cell::new(format!("{:.1}", m.edge_padding)),
        Cell::new(format!("{:.1}", m.spacing)),
        Cell::new(format!("{:.1}", m.movement_size)),
        Cell::new(format!("{:.1}", m.action_size)),
        Cell::new(format!("{:.1}", m.small_action_size)),
        packing,
    ]);
    println!("{}", table);
}

pub fn key_descriptors(resolved: &[(String, KeyDescriptor)]) {
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("Name").add_attribute(Attribute::Bold),
        Cell::new("Code"),
        Cell::new("Key"),
        Cell::new("KeyCode"),
        Cell::new("Location"),
    ]);
    align_right(&mut table, 3..=4);

    for (name, d) in resolved {
        table.add_row(vec![
            Cell::new(name).add_attribute(Attribute::Bold),
            Cell::new(&d.code),
            Cell::new(format!("{:?}", d.key)),
            Cell::new(d.key_code),
            Cell::new(u8::from(d.location)),
        ]);
    }
    println!("{}", table);
}

pub fn key_vocabulary(descriptors: &[KeyDescriptor], aliases: &[(&str, &str)]) {
    let resolved: Vec<(String, KeyDescriptor)> = descriptors
        .iter()
        .map(|d| (d.code.clone(), d.clone()))
        .collect();
    key_descriptors(&resolved);

    let mut table = new_table();
    table.add_row(vec![
        Cell::new("Alias").add_attribute(Attribute::Bold),
        Cell::new("Resolves To"),
    ]);
    for (alias, target) in aliases {
        table.add_row(vec![Cell::new(alias), Cell::new(target)]);
    }
    println!("\n{}", table);
}

pub fn snapshot_summary(bundle: &SnapshotBundle) {
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("Game").add_attribute(Attribute::Bold),
        Cell::new("Layout"),
        Cell::new("Buttons"),
        Cell::new("Packings"),
    ]);
    align_right(&mut table, 2..=2);

    for (name, game) in &bundle.games {
        let Some(first) = game.layouts.values().next() else {
            continue;
        };
        let packings: Vec<String> = game
            .layouts
            .iter()
            .filter(|(_, l)| l.metrics.packing != Packing::Standard)
            .map(|(vp, l)| format!("{}={}", vp, l.metrics.packing))
            .collect();
        let packing_cell = if packings.is_empty() {
            Cell::new("standard").fg(Color::Green)
        } else {
            Cell::new(packings.join(", ")).fg(Color::Yellow)
        };
        table.add_row(vec![
            Cell::new(name).add_attribute(Attribute::Bold),
            Cell::new(first.summary.layout),
            Cell::new(first.summary.buttons.len()),
            packing_cell,
        ]);
    }

    for (name, reason) in &bundle.failures {
        table.add_row(vec![
            Cell::new(name).add_attribute(Attribute::Bold).fg(Color::Red),
            Cell::new("FAILED").fg(Color::Red),
            Cell::new("-"),
            Cell::new(reason),
        ]);
    }
    println!("\n{}", table);
}

pub fn comparison(report: &CompareReport) {
    let total = report.games.len();
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("Game").add_attribute(Attribute::Bold),
        Cell::new("Config"),
        Cell::new("Layout"),
    ]);

    let status = |diffs: &[Diff]| {
        if diffs.is_empty() {
            Cell::new("match").fg(Color::Green)
        } else {
            Cell::new(diff_text(diffs)).fg(Color::Red)
        }
    };

    for g in &report.games {
        let config_cell = match &g.config {
            Some(diffs) => status(diffs),
            None => Cell::new("-"),
        };
        table.add_row(vec![
            Cell::new(&g.name).add_attribute(Attribute::Bold),
            config_cell,
            status(&g.layout),
        ]);
    }
    println!("\n{}", table);

    println!("Config matches: {} / {}", report.config_matches(), total);
    println!("Layout matches: {} / {}", report.layout_matches(), total);
    if !report.missing_configs.is_empty() {
        println!("Missing configs: {}", report.missing_configs.join(", "));
    }
    if !report.missing_gold.is_empty() {
        println!("Missing gold configs: {}", report.missing_gold.join(", "));
    }
}
