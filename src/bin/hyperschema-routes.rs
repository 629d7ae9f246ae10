//! Hyper-Schema routes CLI
//!
//! Command-line interface for deriving routes and types from a JSON Hyper-Schema.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use hyperschema_routes::{
    load_schema_auto, load_symbol_list, method_counts, parse_routes, ExistingSymbols, JsonType,
    ParseError, RouteIo, RouteParam, Routes,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hyperschema-routes")]
#[command(about = "Derive REST routes and JSON types from a JSON Hyper-Schema")]
#[command(version)]
struct Cli {
    /// Log derivation steps (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the routes, sorted by path
    Routes {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        /// Only routes whose handler function is not declared yet
        #[arg(long)]
        missing_handlers: bool,

        #[command(flatten)]
        existing: ExistingArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print the routes grouped by path, methods in priority order
    Resources {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print the named types reachable from the routes
    Types {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        /// Only object types
        #[arg(long)]
        objects_only: bool,

        #[command(flatten)]
        existing: ExistingArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Parse the schema and report the first error, if any
    Check {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        /// Output result as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct ExistingArgs {
    /// File listing handler functions already declared, one per line
    #[arg(long, env = "HYPERSCHEMA_EXISTING_HANDLERS")]
    existing_handlers: Option<PathBuf>,

    /// File listing types already declared, one per line
    #[arg(long, env = "HYPERSCHEMA_EXISTING_TYPES")]
    existing_types: Option<PathBuf>,
}

#[derive(Args)]
struct OutputArgs {
    /// Output file (stdout if not specified)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Routes {
            schema,
            missing_handlers,
            existing,
            output,
        } => run_routes(&schema, missing_handlers, &existing, &output),
        Commands::Resources { schema, output } => run_resources(&schema, &output),
        Commands::Types {
            schema,
            objects_only,
            existing,
            output,
        } => run_types(&schema, objects_only, &existing, &output),
        Commands::Check { schema, json } => run_check(&schema, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Load and parse, reporting failures on stderr.
fn load_routes(source: &str) -> Result<Routes, u8> {
    let schema = load_schema_auto(source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    parse_routes(&schema).map_err(|e| {
        report_parse_error(&e);
        e.exit_code() as u8
    })
}

fn report_parse_error(err: &ParseError) {
    eprintln!("Error: {}", err);
    match err {
        ParseError::TypeRedefinition {
            first,
            redefinitions,
            ..
        } => {
            eprintln!("  first:     {}", first.definition());
            for redefinition in redefinitions {
                eprintln!("  redefined: {}", redefinition.definition());
            }
        }
        ParseError::InvalidSchema { schema, .. } if !schema.title.is_empty() => {
            eprintln!("  in schema: {}", schema.title);
        }
        _ => {}
    }
}

fn load_existing(args: &ExistingArgs) -> Result<ExistingSymbols, u8> {
    let read = |path: &Option<PathBuf>| -> Result<Vec<String>, u8> {
        match path {
            Some(path) => load_symbol_list(path).map_err(|e| {
                eprintln!("Error: {}", e);
                e.exit_code() as u8
            }),
            None => Ok(Vec::new()),
        }
    };
    Ok(ExistingSymbols::new()
        .with_handlers(read(&args.existing_handlers)?)
        .with_types(read(&args.existing_types)?))
}

fn write_json<T: Serialize>(value: &T, args: &OutputArgs) -> Result<(), u8> {
    let json_output = if args.pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match &args.output {
        Some(path) => write_file(path, &json_output),
        None => {
            println!("{}", json_output);
            Ok(())
        }
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), u8> {
    std::fs::write(path, content).map_err(|e| {
        eprintln!("Error writing to {}: {}", path.display(), e);
        3u8
    })
}

fn run_routes(
    source: &str,
    missing_handlers: bool,
    existing: &ExistingArgs,
    output: &OutputArgs,
) -> Result<(), u8> {
    let routes = load_routes(source)?;
    if missing_handlers {
        let existing = load_existing(existing)?;
        write_json(&routes.missing_handlers(&existing), output)
    } else {
        write_json(&routes, output)
    }
}

/// A resource with its methods listed in priority order.
#[derive(Serialize)]
struct ResourceView<'a> {
    path: &'a str,
    name: &'a str,
    route_params: &'a [RouteParam],
    methods: Vec<MethodView<'a>>,
}

#[derive(Serialize)]
struct MethodView<'a> {
    method: &'a str,
    #[serde(flatten)]
    io: &'a RouteIo,
}

fn run_resources(source: &str, output: &OutputArgs) -> Result<(), u8> {
    let routes = load_routes(source)?;
    let resources = routes.by_resource();
    let views: Vec<ResourceView<'_>> = resources
        .iter()
        .map(|resource| ResourceView {
            path: &resource.path,
            name: &resource.name,
            route_params: &resource.route_params,
            methods: resource
                .methods()
                .into_iter()
                .map(|method| MethodView {
                    method,
                    io: &resource.method_routes[method],
                })
                .collect(),
        })
        .collect();
    write_json(&views, output)
}

/// A named type with its canonical definition.
#[derive(Serialize)]
struct TypeView<'a> {
    name: Option<&'a str>,
    definition: String,
    #[serde(rename = "type")]
    json_type: &'a JsonType,
}

fn run_types(
    source: &str,
    objects_only: bool,
    existing: &ExistingArgs,
    output: &OutputArgs,
) -> Result<(), u8> {
    let routes = load_routes(source)?;
    let existing = load_existing(existing)?;
    let views: Vec<TypeView<'_>> = routes
        .named_types_to_generate(&existing)
        .into_iter()
        .filter(|t| !objects_only || matches!(t, JsonType::Object(_)))
        .map(|t| TypeView {
            name: t.name(),
            definition: t.definition(),
            json_type: t,
        })
        .collect();
    write_json(&views, output)
}

fn run_check(source: &str, json_output: bool) -> Result<(), u8> {
    let schema = match load_schema_auto(source) {
        Ok(schema) => schema,
        Err(e) => {
            report_error(json_output, &e.to_string());
            return Err(e.exit_code() as u8);
        }
    };

    match parse_routes(&schema) {
        Ok(routes) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": true,
                    "routes": routes.len(),
                    "types": routes.named_types().len(),
                });
                println!("{}", output);
            } else {
                let summary: Vec<String> = method_counts(&routes)
                    .into_iter()
                    .map(|(method, count)| format!("{} {}", method, count))
                    .collect();
                println!(
                    "OK: {} routes ({}), {} named types",
                    routes.len(),
                    summary.join(", "),
                    routes.named_types().len()
                );
            }
            Ok(())
        }
        Err(e) => {
            if json_output {
                report_error(true, &e.to_string());
            } else {
                report_parse_error(&e);
            }
            Err(e.exit_code() as u8)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}
