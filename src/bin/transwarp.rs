use rusqlite::types::ToSql;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use transwarp::{
    config::{self, LoggingConfig},
    create_engine,
    sql::StatementType,
    DbError, Result,
};

const USAGE: &str = "usage: transwarp [--config <config.toml>] <statement> [args...]";

/// Explicit `--config` path, or the per-user config file.
fn config_path(explicit: Option<String>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(PathBuf::from(path)),
        None => config::default_config_path()
            .ok_or_else(|| DbError::Configuration("no config directory on this platform".to_string())),
    }
}

fn run(config_path: PathBuf, statement: &str, args: &[String]) -> Result<()> {
    let config = config::load_config(&config_path)?;
    transwarp::logging::init(config.logging.as_ref().unwrap_or(&LoggingConfig::default()))?;
    info!("Starting transwarp with {}...", config_path.display());

    let engine = create_engine(config.database)?;
    let mut ctx = engine.context();
    let bound: Vec<&dyn ToSql> = args.iter().map(|a| a as &dyn ToSql).collect();

    if StatementType::from_sql(statement).returns_rows() {
        for row in ctx.select_all(statement, &bound)? {
            println!("{}", row.to_json()?);
        }
    } else {
        let affected = ctx.update(statement, &bound)?;
        println!("{} row(s) affected", affected);
    }
    Ok(())
}

fn main() -> ExitCode {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let explicit = if args.len() >= 2 && (args[0] == "-c" || args[0] == "--config") {
        let path = args.remove(1);
        args.remove(0);
        Some(path)
    } else {
        None
    };
    if args.is_empty() || args[0].starts_with('-') {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    }

    let outcome = config_path(explicit).and_then(|path| run(path, &args[0], &args[1..]));
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
