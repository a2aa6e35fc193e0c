use clap::{Parser, Subcommand};
use prompt_roller_cli::commands::{
    check_cmd, generate_cmd, generate_cmd::GenerateArgs, variables_cmd,
};
use prompt_roller_cli::config::AppConfig;
use prompt_roller_cli::errors::Error;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

/// PromptRoller CLI: Generate prompts from templates
#[derive(Parser, Debug)]
#[command(name = "prompt-roller")]
#[command(about = "Generate prompts from templates with validated variables", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./prompt-roller.toml when present).
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a prompt from a template file
    Generate(GenerateArgs),

    /// List the placeholders used by a template
    Variables {
        /// Path to the template file.
        #[arg(long)]
        template: String,
    },

    /// Check whether a variable name is valid
    CheckName {
        name: String,
    },

    /// Check whether a path is valid and show its normalized form
    CheckPath {
        path: String,

        /// Validate as a directory path.
        #[arg(long)]
        directory: bool,
    },

    /// Show the CLI version
    Version,
}

fn load_config(cli: &Cli) -> Result<AppConfig, Error> {
    let current_dir = std::env::current_dir().map_err(Error::LoadFile)?;
    AppConfig::discover(cli.config.as_deref(), &current_dir)
}

async fn run(cli: &Cli) -> Result<i32, Error> {
    match &cli.command {
        Commands::Generate(args) => {
            let config = load_config(cli)?;
            let report = generate_cmd::execute(args, &config).await?;
            let text = generate_cmd::format_report(&report, args.json, args.output.as_deref())?;

            if report.success {
                println!("{}", text);
                Ok(0)
            } else {
                if args.json {
                    println!("{}", text);
                } else {
                    eprintln!("{}", text);
                }
                Ok(1)
            }
        }
        Commands::Variables { template } => {
            let config = load_config(cli)?;
            let variables = variables_cmd::execute(template, &config).await?;
            print!("{}", variables_cmd::format_variables(template, &variables));
            Ok(0)
        }
        Commands::CheckName { name } => {
            let config = load_config(cli)?;
            let result = check_cmd::check_name(name, &config).map(|_| name.clone());
            println!("{}", check_cmd::format_check(name, &result));
            Ok(if result.is_ok() { 0 } else { 1 })
        }
        Commands::CheckPath { path, directory } => {
            let config = load_config(cli)?;
            let result = check_cmd::check_path(path, *directory, &config).map(String::from);
            println!("{}", check_cmd::format_check(path, &result));
            Ok(if result.is_ok() { 0 } else { 1 })
        }
        Commands::Version => {
            println!(
                "prompt-roller version {}",
                option_env!("PROMPT_ROLLER_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
            );
            Ok(0)
        }
    }
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so that generated prompts can be piped from stdout
    tracing_subscriber::registry()
        .with(fmt::layer().pretty().with_writer(std::io::stderr))
        .with(EnvFilter::from_env("PROMPT_ROLLER_LOG"))
        .init();

    let cli = Cli::parse();
    match run(&cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("Error: {e}");
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}
