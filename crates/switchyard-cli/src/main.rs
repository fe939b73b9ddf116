mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_CONFIG_ERROR, EXIT_FAILURE};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "switchyard",
    version,
    about = "Host and supervise a reconfigurable message-routing engine"
)]
struct Cli {
    /// Override a configuration value (repeatable).
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE", global = true)]
    defines: Vec<String>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Bootstrap the control channel, replay persisted scripts and wait for
    /// a termination signal.
    Run {
        /// Give up waiting after this many seconds and shut down.
        #[arg(long, value_name = "SECS")]
        wait_timeout: Option<u64>,
        /// How long to wait for the engine to stop once shutdown is forced.
        #[arg(long, value_name = "SECS", default_value_t = 10)]
        termination_timeout: u64,
    },
    /// Show resolved configuration.
    Config {
        /// Only print the value of this key.
        key: Option<String>,
    },
    /// Evaluate a route script and list its routes.
    CheckScript {
        /// Filesystem path or `packaged-resource:<path>`.
        reference: String,
    },
    /// List the persisted scripts replayed on launch.
    Scripts,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("SWITCHYARD_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let json_output = cli.json;
    let result = match cli.command {
        Commands::Run {
            wait_timeout,
            termination_timeout,
        } => commands::resolve_config(&cli.defines).and_then(|config| {
            commands::run::run(config, wait_timeout, termination_timeout, json_output)
        }),
        Commands::Config { key } => commands::resolve_config(&cli.defines)
            .and_then(|config| commands::config::run(&config, key.as_deref(), json_output)),
        Commands::CheckScript { reference } => commands::resolve_config(&cli.defines)
            .and_then(|config| commands::check_script::run(config, &reference, json_output)),
        Commands::Scripts => commands::resolve_config(&cli.defines)
            .and_then(|config| commands::scripts::run(&config, json_output)),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("configuration error:") {
                EXIT_CONFIG_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
