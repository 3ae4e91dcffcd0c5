//! dpll command - DPLL device and pin configuration.

mod commands;

use clap::Parser;
use dplink::output::{OutputFormat, OutputOptions};

#[derive(Parser)]
#[command(
    name = "dpll",
    about = "DPLL device and pin configuration tool",
    disable_version_flag = true
)]
struct Cli {
    /// Print version information.
    #[arg(short = 'V', long = "Version")]
    version: bool,

    /// Output JSON.
    #[arg(short = 'j', long)]
    json: bool,

    /// Pretty print JSON.
    #[arg(short = 'p', long)]
    pretty: bool,

    /// OBJECT { COMMAND | help } [ ARGS ]
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG wins; warn when it is unset
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    if cli.version {
        println!("dpll utility, dplink-{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let opts = OutputOptions { pretty: cli.pretty };

    if let Err(e) = commands::run(&cli.args, format, &opts).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
