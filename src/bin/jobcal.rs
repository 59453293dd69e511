use anyhow::Result;
use jobcal::config::Config;
use jobcal::context::{AppContext, StandardContext};
use simplelog::{
    ColorChoice, CombinedLogger, LevelFilter, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;

struct Args {
    root: Option<PathBuf>,
    once: bool,
    verbose: bool,
    help: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        root: None,
        once: false,
        verbose: false,
        help: false,
    };
    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-r" | "--root" => {
                let path = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--root needs a path"))?;
                args.root = Some(PathBuf::from(path));
            }
            "-1" | "--once" => args.once = true,
            "-v" | "--verbose" => args.verbose = true,
            "-h" | "--help" | "help" => args.help = true,
            other => return Err(anyhow::anyhow!("Unknown argument '{}'", other)),
        }
    }
    Ok(args)
}

fn init_logging(ctx: &dyn AppContext, verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = ctx.get_log_file_path()
        && let Ok(file) = OpenOptions::new().create(true).append(true).open(&path)
    {
        loggers.push(WriteLogger::new(level, simplelog::Config::default(), file));
    }
    // Only fails if a logger is already set.
    let _ = CombinedLogger::init(loggers);
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;
    if args.help {
        jobcal::cli::print_help("jobcal");
        return Ok(());
    }

    let ctx = StandardContext::new(args.root);
    init_logging(&ctx, args.verbose);

    if args.once {
        let config = Config::load(&ctx).inspect_err(|e| {
            if Config::is_missing_config_error(e)
                && let Ok(path) = Config::get_path_string(&ctx)
            {
                log::error!("Create a configuration at {} (see --help)", path);
            }
        })?;
        jobcal::bot::run_pass(&config).await?;
        return Ok(());
    }

    jobcal::bot::run_forever(&ctx).await
}
