mod stats_report;

use loader_upkeep::{Document, ItemLoader, LoaderType, MemoryStats, Options, Rules, SelectorKind};
use std::io::{self, IsTerminal, Read};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

loader_upkeep::loader_type!(PageLoader);

const LOG_ENV: &str = "UPKEEP_LOG";

fn main() {
    init_tracing();

    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    match run(&config) {
        Ok(report) => stats_report::print_run(&report, config.color),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Ordered fallback rules for one (field, kind) pair, as given on the command line.
struct FieldRules {
    field: String,
    kind: SelectorKind,
    rules: Vec<String>,
}

struct CliConfig {
    html: String,
    scope: Option<String>,
    fields: Vec<FieldRules>,
    names: Vec<(String, String)>,
    options: Options,
    color: bool,
}

impl CliConfig {
    fn name_for(&self, field: &str) -> Option<&str> {
        self.names.iter().rev().find(|(name_field, _)| name_field == field).map(|(_, name)| name.as_str())
    }
}

fn run(config: &CliConfig) -> loader_upkeep::Result<stats_report::RunReport> {
    let document = Document::parse(&config.html);
    let stats = Arc::new(MemoryStats::new());

    let scopes = match &config.scope {
        Some(expression) => document.root().css(expression)?,
        None => vec![document.root()],
    };

    let mut items = Vec::with_capacity(scopes.len());
    for scope in scopes {
        let mut loader = ItemLoader::<PageLoader>::with_options(&config.options).with_scope(scope).with_stats(stats.clone());
        for group in &config.fields {
            let mut rules = Rules::from(&group.rules);
            if let Some(name) = config.name_for(&group.field) {
                rules = rules.named(name);
            }
            match group.kind {
                SelectorKind::Css => loader.add_css(&group.field, rules)?,
                SelectorKind::XPath => loader.add_xpath(&group.field, rules)?,
            }
        }
        items.push(loader.load_item());
    }

    Ok(stats_report::RunReport { loader: PageLoader::NAME, items, stats: stats.dump() })
}

fn parse_args() -> Result<CliConfig, String> {
    let mut input: Option<String> = None;
    let mut scope: Option<String> = None;
    let mut fields: Vec<FieldRules> = Vec::new();
    let mut names: Vec<(String, String)> = Vec::new();
    let mut options = Options::default();
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("upkeep {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--input" | "-i" => {
                let value = args.next().ok_or_else(|| "error: --input expects a file".to_string())?;
                set_once(&mut input, value, "input")?;
            }
            "--scope" => {
                let value = args.next().ok_or_else(|| "error: --scope expects a CSS selector".to_string())?;
                set_once(&mut scope, value, "scope")?;
            }
            "--css" | "--xpath" => {
                let kind = if arg == "--css" { SelectorKind::Css } else { SelectorKind::XPath };
                let value = args.next().ok_or_else(|| format!("error: {arg} expects <field>=<rule>"))?;
                let (field, rule) = split_assignment(&arg, &value)?;
                push_rule(&mut fields, field, kind, rule);
            }
            "--name" => {
                let value = args.next().ok_or_else(|| "error: --name expects <field>=<name>".to_string())?;
                let (field, name) = split_assignment(&arg, &value)?;
                names.push((field.to_string(), name.to_string()));
            }
            "--start" => {
                let value = args.next().ok_or_else(|| "error: --start expects a number".to_string())?;
                options.start_position = parse_start(&value)?;
            }
            _ if arg.starts_with("--start=") => {
                options.start_position = parse_start(arg.trim_start_matches("--start="))?;
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => set_once(&mut input, arg, "input")?,
        }
    }

    if fields.is_empty() {
        return Err(format!("error: no rules given (use --css or --xpath)\n\n{}", help_text()));
    }

    let html = match input {
        Some(path) => {
            std::fs::read_to_string(&path).map_err(|err| format!("error: failed to read '{path}': {err}"))?
        }
        None => read_stdin_input()?,
    };
    if html.trim().is_empty() {
        return Err(format!("error: no HTML provided\n\n{}", help_text()));
    }

    Ok(CliConfig { html, scope, fields, names, options, color })
}

fn set_once(slot: &mut Option<String>, value: String, what: &str) -> Result<(), String> {
    if slot.is_some() {
        return Err(format!("error: {what} provided multiple times"));
    }
    *slot = Some(value);
    Ok(())
}

fn split_assignment<'v>(flag: &str, value: &'v str) -> Result<(&'v str, &'v str), String> {
    match value.split_once('=') {
        Some((field, rest)) if !field.trim().is_empty() && !rest.is_empty() => Ok((field.trim(), rest)),
        _ => Err(format!("error: {flag} expects <field>=<value>, got '{value}'")),
    }
}

/// Rules for the same field and kind are grouped, keeping command-line order.
fn push_rule(fields: &mut Vec<FieldRules>, field: &str, kind: SelectorKind, rule: &str) {
    match fields.iter_mut().find(|group| group.field == field && group.kind == kind) {
        Some(group) => group.rules.push(rule.to_string()),
        None => fields.push(FieldRules { field: field.to_string(), kind, rules: vec![rule.to_string()] }),
    }
}

fn parse_start(value: &str) -> Result<usize, String> {
    value.parse().map_err(|_| format!("error: invalid --start '{value}' (expected a non-negative integer)"))
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "upkeep {version}

Evaluate fallback extraction rules against an HTML page and show which rules
still produce data.

Usage:
  upkeep [OPTIONS] --css <field>=<rule>... [FILE]

Options:
  -i, --input <file>         HTML file to read. Reads stdin when omitted.
  --scope <css>              Run one loader per element matching this selector.
  --css <field>=<rule>       Add a CSS fallback rule for a field (repeatable;
                             order is priority order).
  --xpath <field>=<rule>     Add an XPath fallback rule for a field.
  --name <field>=<name>      Name the rules of a field in the reported labels.
  --start <n>                First position assigned per field and kind.
                             Default: 1
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  {log_env}=<filter>          Log filter, e.g. loader_upkeep=debug. Default: warn

Exit codes:
  0  Success.
  1  Extraction error (invalid selector, missing scope).
  2  Invalid arguments or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
        log_env = LOG_ENV,
    )
}
