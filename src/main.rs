use clap::Parser;
use docrelate::{
    ModelManager,
    RelateConfig,
    error,
    index,
    pipeline,
};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Command};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("DOCRELATE_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Some(Command::Completions(args)) = &cli.command {
        args.generate();
        return Ok(());
    }

    let config =
        RelateConfig::resolve(cli.config.as_deref(), cli.settings.overrides())?;

    match cli.command {
        None | Some(Command::Build) => cmd_build(&config)?,
        Some(Command::Show(args)) => cmd_show(&config, &args)?,
        Some(Command::Completions(_)) => {}
    }

    Ok(())
}

fn cmd_build(config: &RelateConfig) -> error::Result<()> {
    let mut model = ModelManager::with_model_id(config.model.clone());
    pipeline::run(config, &mut model)?;
    Ok(())
}

fn cmd_show(config: &RelateConfig, args: &cli::ShowArgs) -> error::Result<()> {
    let related = index::read(&config.output_path)?;
    let records = related
        .lookup(&config.url_prefix, &args.document)
        .ok_or_else(|| error::Error::NotFound {
            kind: "document",
            name: args.document.clone(),
        })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(records)?);
    } else if records.is_empty() {
        println!("No related documents for '{}'", args.document);
    } else {
        for record in records {
            let date = if record.date.is_empty() {
                String::new()
            } else {
                format!(" ({})", record.date)
            };
            println!(
                "{:.3}  {}{date}\n       {}",
                record.score, record.title, record.url
            );
        }
    }

    Ok(())
}
