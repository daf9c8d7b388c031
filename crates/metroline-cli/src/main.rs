use metroline::{
    Aggregation, Metro, MetroLayout, PreparedEdge, PreparedNode, TickLabel, format_date,
};
use serde::Serialize;
use serde_json::{Value, json};
use std::io::Read;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Metro(metroline::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Metro(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<metroline::Error> for CliError {
    fn from(value: metroline::Error) -> Self {
        Self::Metro(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Layout,
    Prepare,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    weight: Option<f64>,
    from: Option<String>,
    to: Option<String>,
    by_day: bool,
    hide_unlinked: bool,
    config: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LayoutOut<'a> {
    width: i64,
    height: f64,
    labels: &'a [TickLabel],
    #[serde(flatten)]
    layout: &'a MetroLayout,
}

#[derive(Serialize)]
struct PreparedNodeOut<'a> {
    #[serde(flatten)]
    node: &'a PreparedNode,
    tooltip: String,
    outgoing: Vec<&'a str>,
}

#[derive(Serialize)]
struct PrepareOut<'a> {
    start: Option<String>,
    end: Option<String>,
    communities: Vec<Option<&'a str>>,
    nodes: Vec<PreparedNodeOut<'a>>,
    edges: &'a [PreparedEdge],
}

fn usage() -> &'static str {
    "metroline-cli\n\
\n\
USAGE:\n\
  metroline-cli [layout] [--pretty] [--weight <w>] [--from <date>] [--to <date>] [--by-day] [--hide-unlinked] [--config <path>] [<path>|-]\n\
  metroline-cli prepare [--pretty] [--weight <w>] [--from <date>] [--to <date>] [--by-day] [--config <path>] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', the dataset is read from stdin.\n\
  - The dataset is a JSON object with `nodes`, `edges` and `community`.\n\
  - --from/--to use the view date format (`dateFormatView`, ISO by default).\n\
  - --config layers a JSON object onto the default configuration.\n\
  - Set METROLINE_LOG (e.g. `debug`) to see diagnostics on stderr.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "prepare" => args.command = Command::Prepare,
            "--pretty" => args.pretty = true,
            "--by-day" => args.by_day = true,
            "--hide-unlinked" => args.hide_unlinked = true,
            "--weight" => {
                let Some(w) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let w = w.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
                if !w.is_finite() {
                    return Err(CliError::Usage(usage()));
                }
                args.weight = Some(w);
            }
            "--from" => {
                let Some(from) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.from = Some(from.clone());
            }
            "--to" => {
                let Some(to) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.to = Some(to.clone());
            }
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("METROLINE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_metro(args: &Args) -> Result<Metro, CliError> {
    let text = read_input(args.input.as_deref())?;
    let mut metro = Metro::from_json_str(&text)?;
    if let Some(path) = args.config.as_deref() {
        let overrides: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        metro = metro.config(&overrides)?;
    }
    if args.hide_unlinked {
        metro = metro.config(&json!({ "drawUnlinked": false }))?;
    }
    if let Some(weight) = args.weight {
        metro = metro.weight(weight);
    }
    if args.by_day {
        metro = metro.aggregation(Aggregation::ByDay);
    }
    Ok(metro.range(args.from.as_deref(), args.to.as_deref()))
}

fn run(args: Args) -> Result<(), CliError> {
    let metro = build_metro(&args)?;
    tracing::debug!(command = ?args.command, "running");

    match args.command {
        Command::Layout => {
            let out = metro.layout()?;
            write_json(
                &LayoutOut {
                    width: out.width(),
                    height: out.height,
                    labels: &out.labels,
                    layout: &out.layout,
                },
                args.pretty,
            )
        }
        Command::Prepare => {
            let prepared = metro.prepare()?;
            let data = &prepared.data;
            let view = prepared.view_format.as_str();
            let nodes = data
                .nodes()
                .iter()
                .enumerate()
                .map(|(ix, node)| PreparedNodeOut {
                    node,
                    tooltip: data.describe(ix, view),
                    outgoing: data
                        .outgoing(&node.id)
                        .iter()
                        .map(|&e| data.edge(e).target_id.as_str())
                        .collect(),
                })
                .collect();
            write_json(
                &PrepareOut {
                    start: data.start().map(|d| format_date(view, d)),
                    end: data.end().map(|d| format_date(view, d)),
                    communities: data.community_labels().collect(),
                    nodes,
                    edges: data.edges(),
                },
                args.pretty,
            )
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    init_tracing();

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
