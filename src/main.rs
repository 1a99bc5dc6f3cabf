use std::sync::Arc;

use clap::Parser;
use log_script_filter::{
    logging, Configuration, Filter, FilterResult, LogEvent, PluginRegistry, Script, ScriptFilter, ScriptManager,
};

/// Runs a filter script against one log event given as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Log event document, e.g. {"loggerName":"app","level":"ERROR","message":{"type":"simple","text":"boom"}}
    event: String,
    /// Inline script body
    #[arg(long, conflicts_with_all = ["script_file", "config"])]
    script: Option<String>,
    /// Read the script body from a file
    #[arg(long, conflicts_with = "config")]
    script_file: Option<String>,
    /// Load every filter from a JSON configuration document instead
    #[arg(long)]
    config: Option<String>,
    /// Result when the script returns true
    #[arg(long, default_value = "ACCEPT")]
    on_match: FilterResult,
    /// Result for every other outcome
    #[arg(long, default_value = "DENY")]
    on_mismatch: FilterResult,
    /// Configuration property, repeatable
    #[arg(long = "property", value_parser = parse_property)]
    properties: Vec<(String, String)>,
}

fn parse_property(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{s}`"))
}

fn main() {
    logging::init();
    let args = Args::parse();

    let event: LogEvent = match serde_json::from_str(&args.event) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Invalid event JSON: {e}");
            std::process::exit(1);
        }
    };

    let filters: Vec<Arc<dyn Filter>> = if let Some(path) = args.config.as_ref() {
        let json = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Cannot read {path}: {e}");
                std::process::exit(1);
            }
        };
        match PluginRegistry::with_builtins().load(&json, Arc::new(ScriptManager::new())) {
            Ok(loaded) => loaded.filters,
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
    } else {
        let script = match (args.script, args.script_file) {
            (Some(body), _) => Some(Script::inline("cli", body)),
            (None, Some(path)) => match Script::from_file(None, None, &path) {
                Ok(s) => Some(s),
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            },
            (None, None) => None,
        };
        let configuration = Arc::new(Configuration::builder().properties(args.properties).build());
        match ScriptFilter::create(script, Some(args.on_match), Some(args.on_mismatch), configuration) {
            Ok(f) => vec![Arc::new(f) as Arc<dyn Filter>],
            Err(_) => std::process::exit(2),
        }
    };

    for filter in filters {
        println!("{}\t{}", filter, filter.filter_event(&event));
    }
}
