use relgraph::catalog::Catalog;
use relgraph::config::EditorConfig;
use relgraph::policy::GraphScope;
use relgraph::session::EditorSession;
use std::env;
use std::fs;
use std::process;
use tracing_subscriber::EnvFilter;

fn read_or_exit(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {}: {}", path, e);
            process::exit(1);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <catalog.json> [options]", args[0]);
        eprintln!();
        eprintln!("Options:");
        eprintln!("  -s, --snapshot <file>     Load a saved graph snapshot");
        eprintln!("  -m, --mode <scope>        schema or federation (default: from config, else schema)");
        eprintln!("  -c, --config <file>       Editor config JSON");
        eprintln!("      --suggestions <file>  Ingest a suggestion feed");
        eprintln!("  -l, --layout              Run auto layout before saving");
        eprintln!("  -o, --output <file>       Output file (default: stdout)");
        process::exit(1);
    }

    let catalog_path = &args[1];
    let mut snapshot_path: Option<String> = None;
    let mut config_path: Option<String> = None;
    let mut feed_path: Option<String> = None;
    let mut output_path: Option<String> = None;
    let mut scope: Option<GraphScope> = None;
    let mut run_layout = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "-s" | "--snapshot" => {
                i += 1;
                if i < args.len() {
                    snapshot_path = Some(args[i].clone());
                }
            }
            "-c" | "--config" => {
                i += 1;
                if i < args.len() {
                    config_path = Some(args[i].clone());
                }
            }
            "--suggestions" => {
                i += 1;
                if i < args.len() {
                    feed_path = Some(args[i].clone());
                }
            }
            "-o" | "--output" => {
                i += 1;
                if i < args.len() {
                    output_path = Some(args[i].clone());
                }
            }
            "-m" | "--mode" => {
                i += 1;
                if i < args.len() {
                    scope = Some(GraphScope::from_str(&args[i]).unwrap_or_else(|| {
                        eprintln!("Invalid mode: {}", args[i]);
                        process::exit(1);
                    }));
                }
            }
            "-l" | "--layout" => run_layout = true,
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let catalog = match Catalog::from_json(&read_or_exit(catalog_path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Catalog error: {}", e);
            process::exit(1);
        }
    };

    let mut config = match config_path {
        Some(path) => EditorConfig::from_json(&read_or_exit(&path)).unwrap_or_else(|e| {
            eprintln!("Config error: {}", e);
            process::exit(1);
        }),
        None => EditorConfig::default(),
    };
    if let Some(scope) = scope {
        config = config.with_scope(scope);
    }

    let mut session = EditorSession::new(catalog, config);

    let load_report = snapshot_path.map(|path| match session.restore_json(&read_or_exit(&path)) {
        Ok(report) => {
            for issue in &report.issues {
                tracing::warn!(?issue, "snapshot entry not loaded");
            }
            report
        }
        Err(e) => {
            eprintln!("Snapshot error: {}", e);
            process::exit(1);
        }
    });

    let ingest_report = feed_path.map(|path| match session.ingest_suggestions_json(&read_or_exit(&path)) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Suggestion feed error: {}", e);
            process::exit(1);
        }
    });

    if run_layout {
        session.auto_layout();
    }

    let document = serde_json::json!({
        "scope": session.scope(),
        "snapshot": session.snapshot(),
        "pendingSuggestions": session.ledger().pending_by_confidence(),
        "loadReport": load_report,
        "ingestReport": ingest_report,
    });
    let output = match serde_json::to_string_pretty(&document) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Serialization error: {}", e);
            process::exit(1);
        }
    };

    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(&path, &output) {
                eprintln!("Failed to write {}: {}", path, e);
                process::exit(1);
            }
        }
        None => println!("{}", output),
    }
}
