use loader_upkeep::{Item, MISSING_SUFFIX, StatsDump};
use std::fmt;

/// What a piece of report text is, mapped to an SGR code when color is on.
#[derive(Clone, Copy)]
enum Role {
    Heading,
    Rule,
    Field,
    Label,
    Found,
    Missing,
    Muted,
}

impl Role {
    fn sgr(self) -> &'static str {
        match self {
            Role::Heading => "1;36",
            Role::Rule => "90",
            Role::Field => "34",
            Role::Label => "36",
            Role::Found => "32",
            Role::Missing => "33",
            Role::Muted => "2",
        }
    }
}

struct Painter {
    color: bool,
}

impl Painter {
    fn paint(&self, role: Role, text: impl fmt::Display) -> String {
        if self.color { format!("\x1b[{}m{text}\x1b[0m", role.sgr()) } else { text.to_string() }
    }
}

/// Everything one CLI run produced.
pub struct RunReport {
    pub loader: &'static str,
    pub items: Vec<Item>,
    pub stats: StatsDump,
}

pub fn print_run(report: &RunReport, color: bool) {
    let painter = Painter { color };
    println!("\n{}", painter.paint(Role::Heading, format!("⚙  {}: {} item(s)", report.loader, report.items.len())));

    println!("\n{}", painter.paint(Role::Rule, "━━━ Items ━━━"));
    print_items(&report.items, &painter);

    println!("\n{}", painter.paint(Role::Rule, "━━━ Parser stats ━━━"));
    print_stats(&report.stats, &painter);

    let elapsed = report.stats.dumped_at - report.stats.started_at;
    println!(
        "\n  {} {}",
        painter.paint(Role::Muted, "Elapsed:"),
        painter.paint(Role::Found, format!("{}ms", elapsed.num_milliseconds()))
    );
    println!();
}

fn print_items(items: &[Item], painter: &Painter) {
    for (idx, item) in items.iter().enumerate() {
        println!("  {}", painter.paint(Role::Rule, format!("[{idx}]")));
        if item.is_empty() {
            println!("      {}", painter.paint(Role::Muted, "(no fields)"));
        }
        for (field, values) in item.fields() {
            println!("      {} {}", painter.paint(Role::Field, format!("{field}:")), format_values(values));
        }
    }
}

fn print_stats(stats: &StatsDump, painter: &Painter) {
    if stats.values.is_empty() {
        println!("{}", painter.paint(Role::Muted, "  No rules reported"));
        return;
    }

    let suffix = format!("/{MISSING_SUFFIX}");
    for (label, count) in &stats.values {
        let marker = if label.ends_with(&suffix) { painter.paint(Role::Missing, "✗") } else { painter.paint(Role::Found, "✓") };
        println!("  {} {} {}", marker, painter.paint(Role::Label, label), painter.paint(Role::Muted, format!("× {count}")));
    }

    let missing = stats.missing().count();
    if missing > 0 {
        println!(
            "\n  {}",
            painter.paint(Role::Missing, format!("{missing} rule position(s) produced nothing at least once"))
        );
    }
}

fn format_values(values: &[String]) -> String {
    let shown: Vec<String> = values.iter().take(5).map(|v| format!("{:?}", preview(v))).collect();
    let mut out = shown.join(", ");
    if values.len() > 5 {
        out.push_str(&format!(", … +{} more", values.len() - 5));
    }
    out
}

fn preview(value: &str) -> String {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(80).collect()
}
