use std::fs;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use statespice_core::{
    AnalysisConfig, Circuit, Expr, InputSelection, OutputSpec, SwitchConfig, SwitchState,
};
use statespice_netlist::netlist_types::ValueSuffix;
use statespice_netlist::{Bindings, GROUND, Netlist, Span, parse};

use crate::output::{Entry, ModelReport, Report, SystemReport};

mod logger;
mod output;

const EXIT_IO: i32 = 1;
const EXIT_NETLIST: i32 = 2;
const EXIT_ANALYSIS: i32 = 3;

#[derive(Parser, Debug)]
#[command(
    name = "statespice",
    about = "Assemble MNA matrices of a linear network and reduce them to state space",
    version
)]
struct Args {
    /// Input netlist file
    #[arg(value_name = "NETLIST")]
    netlist: PathBuf,

    /// Switch (or diode) to treat as closed
    #[arg(long = "close", value_name = "SWITCH")]
    close: Vec<String>,

    /// Switch (or diode) to treat as open
    #[arg(long = "open", value_name = "SWITCH")]
    open: Vec<String>,

    /// Bind a parameter to a value, e.g. `R=10k`
    #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
    params: Vec<(String, f64)>,

    /// Output row: `V(n)`, `V(a,b)` or `I(element)`. Defaults to every state.
    #[arg(long = "output", value_name = "SPEC", value_parser = parse_output)]
    outputs: Vec<OutputSpec>,

    /// Source kept as an input; the others become drift. Defaults to all sources.
    #[arg(long = "input", value_name = "SOURCE")]
    inputs: Vec<String>,

    /// Reference node label
    #[arg(long, default_value = GROUND)]
    ground: String,

    /// Keep unbound component values as symbols
    #[arg(long)]
    symbolic: bool,

    /// Print JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Stop after assembling G, Cm and B
    #[arg(long)]
    system_only: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_param(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in '{s}'"));
    }
    Ok((name.to_string(), parse_scaled(value.trim())?))
}

/// A number with an optional SPICE scale suffix (`10k`, `4.7u`, `1Meg`).
fn parse_scaled(s: &str) -> Result<f64, String> {
    let split = s
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_alphabetic())
        .last()
        .map_or(s.len(), |(i, _)| i);
    let (number, suffix) = s.split_at(split);
    // words such as `inf` parse as a whole
    let (number, suffix) = match number.parse::<f64>() {
        Ok(_) => (number, suffix),
        Err(_) => (s, ""),
    };
    let value: f64 = number
        .parse()
        .map_err(|_| format!("invalid parameter value '{s}'"))?;
    let scale = ValueSuffix::from_str(suffix).map_or(1.0, |suffix| suffix.scale());
    Ok(value * scale)
}

fn parse_output(s: &str) -> Result<OutputSpec, String> {
    s.parse().map_err(|e| format!("{e}"))
}

fn main() {
    let args = Args::parse();
    logger::init(args.verbose);

    let input = fs::read_to_string(&args.netlist).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", args.netlist.display(), e);
        std::process::exit(EXIT_IO);
    });

    let netlist = match parse(&input) {
        Ok(netlist) => netlist,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            if let Some(span) = e.error_span() {
                eprintln!();
                render_error_snippet(&input, span);
            }
            std::process::exit(EXIT_NETLIST);
        }
    };

    if let Err(e) = run(&args, netlist) {
        eprintln!("error: {e:#}");
        std::process::exit(EXIT_ANALYSIS);
    }
}

fn run(args: &Args, netlist: Netlist) -> anyhow::Result<()> {
    let mut bindings = Bindings::new();
    for (name, value) in &args.params {
        bindings.set(name.as_str(), *value);
    }
    let netlist = if bindings.is_empty() {
        netlist
    } else {
        netlist.bind(&bindings)
    };

    let mut switches = SwitchConfig::new();
    for name in &args.close {
        switches.set(name.as_str(), SwitchState::Closed);
    }
    for name in &args.open {
        switches.set(name.as_str(), SwitchState::Open);
    }
    if let Some(name) = args
        .close
        .iter()
        .find(|c| args.open.iter().any(|o| o.eq_ignore_ascii_case(c)))
    {
        bail!("switch '{name}' is given as both open and closed");
    }

    let config = AnalysisConfig {
        ground: args.ground.clone(),
        inputs: if args.inputs.is_empty() {
            InputSelection::AllSources
        } else {
            InputSelection::Named(args.inputs.clone())
        },
        outputs: args.outputs.clone(),
        ..AnalysisConfig::default()
    };

    if args.symbolic {
        analyze::<Expr>(args, &netlist, &switches, &config)
    } else {
        let unbound = netlist.symbols();
        if !unbound.is_empty() {
            bail!(
                "unbound parameters {}; bind them with --param or pass --symbolic",
                unbound.join(", ")
            );
        }
        analyze::<f64>(args, &netlist, &switches, &config)
    }
}

fn analyze<T: Entry>(
    args: &Args,
    netlist: &Netlist,
    switches: &SwitchConfig,
    config: &AnalysisConfig,
) -> anyhow::Result<()> {
    let circuit: Circuit<T> = Circuit::assemble(netlist, switches, config)
        .context("failed to assemble the MNA system")?;
    log::info!(
        "{} unknowns, {} excitations",
        circuit.system().dim(),
        circuit.system().excitations().len()
    );

    if !args.json {
        print!("{}", output::render_system(circuit.system()));
    }

    let model = if args.system_only {
        None
    } else {
        Some(
            circuit
                .state_space(config)
                .context("failed to reduce to state space")?,
        )
    };

    if args.json {
        let report = Report {
            unknowns: circuit.system().labels(),
            system: SystemReport::new(circuit.system()),
            state_space: model.as_ref().map(ModelReport::new),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if let Some(model) = &model {
        println!();
        print!("{}", output::render_model(model));
    }
    Ok(())
}

fn render_error_snippet(src: &str, span: Span) {
    let start = span.start.min(src.len());
    let line_start = src[..start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = src[start..].find('\n').map_or(src.len(), |i| start + i);
    let end = (span.end + 1).clamp(start, line_end);
    let (Some(prefix), Some(highlight), Some(line)) = (
        src.get(line_start..start),
        src.get(start..end),
        src.get(line_start..line_end),
    ) else {
        return;
    };
    let col = prefix.chars().count();
    let width = highlight.chars().count().max(1);

    let line_no = src[..line_start].chars().filter(|&c| c == '\n').count() + 1;
    eprintln!("{:>4} | {}", line_no, line);
    let underline = "~".repeat(width);
    eprintln!(
        "     | {:space$}\x1b[31m{}\x1b[0m",
        "",
        underline,
        space = col
    );
}
