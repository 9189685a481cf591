use std::env;
use std::fs;
use std::path::Path;
use std::process;

use anyhow::{Context, Result, bail};
use quadra::Compiler;
use quadra::config::CompilerConfig;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Default)]
struct Options {
    input: String,
    output: Option<String>,
    config: Option<String>,
    check_only: bool,
    listing: bool,
    verbose: bool,
}

fn print_usage() {
    println!("quadc v{}", VERSION);
    println!("Usage: quadc [options] <trace_file> [-o output.json]");
    println!();
    println!("Options:");
    println!("  -o <file>          Write the program artifact to <file> (default: <trace>.json)");
    println!("  --config <file>    Address layout configuration (TOML)");
    println!("  --check            Validate the trace without writing output");
    println!("  --listing          Print a numbered quadruple listing");
    println!("  -v, --verbose      Log declarations, emitted quadruples and backpatches");
    println!("  --version, -V      Show version");
    println!("  --help, -h         Show this help");
    println!();
    println!("Examples:");
    println!("  quadc program.trace");
    println!("  quadc --listing --check program.trace");
    println!("  quadc --config layout.toml program.trace -o program.json");
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options::default();
    let mut input: Option<String> = None;
    let mut i = 1;

    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "--version" | "-V" => {
                println!("quadc v{}", VERSION);
                process::exit(0);
            }
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            "--check" => options.check_only = true,
            "--listing" => options.listing = true,
            "-v" | "--verbose" => options.verbose = true,
            "-o" => {
                i += 1;
                let Some(path) = args.get(i) else {
                    bail!("-o requires a file name");
                };
                options.output = Some(path.clone());
            }
            "--config" => {
                i += 1;
                let Some(path) = args.get(i) else {
                    bail!("--config requires a file name");
                };
                options.config = Some(path.clone());
            }
            _ if arg.starts_with('-') => bail!("unknown option: {}", arg),
            _ => {
                if input.is_some() {
                    bail!("more than one input file given");
                }
                input = Some(arg.clone());
            }
        }
        i += 1;
    }

    let Some(input) = input else {
        bail!("no input file given");
    };
    options.input = input;
    Ok(options)
}

fn run(options: &Options) -> Result<()> {
    let config = match &options.config {
        Some(path) => CompilerConfig::load(path)
            .with_context(|| format!("loading configuration {}", path))?,
        None => CompilerConfig::default(),
    };
    let source = fs::read_to_string(&options.input)
        .with_context(|| format!("reading {}", options.input))?;

    let artifact = Compiler::with_config(config)
        .compile(&source)
        .with_context(|| format!("compiling {}", options.input))?;

    if options.listing {
        print!("{}", artifact.listing());
    }
    if options.check_only {
        println!("{}: ok ({} quadruples)", options.input, artifact.quadruples.len());
        return Ok(());
    }

    let output = options.output.clone().unwrap_or_else(|| {
        Path::new(&options.input)
            .with_extension("json")
            .to_string_lossy()
            .into_owned()
    });
    let json = serde_json::to_string_pretty(&artifact).context("serializing artifact")?;
    fs::write(&output, json).with_context(|| format!("writing {}", output))?;
    log::info!("wrote {}", output);
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            process::exit(2);
        }
    };

    let default_filter = if options.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(&options) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
