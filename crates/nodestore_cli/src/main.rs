//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open the configured store, seed the demo hierarchy when empty, and print
//!   per-kind counts.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Pass `--reset` to clear the collection before seeding.

use log::info;
use nodestore_core::db::{open_db, open_db_in_memory};
use nodestore_core::{
    core_version, init_logging, seed_demo_nodes, CoreConfig, NodeKind, NodeService,
    SqliteNodeRepository,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    // A missing `.env` file is not an error.
    let _ = dotenvy::dotenv();

    match run(std::env::args().any(|arg| arg == "--reset")) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("nodestore: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(reset: bool) -> Result<(), Box<dyn Error>> {
    let config = CoreConfig::from_env()?;
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(config.log_level, log_dir)?;
    }

    let conn = match config.db_path.as_deref() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let service = NodeService::new(SqliteNodeRepository::try_new(&conn)?);

    if reset {
        service.clear()?;
    }
    if service.find(NodeKind::Node, None).count()? == 0 {
        seed_demo_nodes(&service)?;
        info!("event=demo_seed module=cli status=ok");
    }

    println!("nodestore_core version={}", core_version());
    for kind in NodeKind::ALL {
        println!("kind={kind} count={}", service.find(kind, None).count()?);
    }
    if let Some(dashboard) = service.find(NodeKind::Dashboard, None).first()? {
        println!("{}", dashboard.look_at_me()?);
    }

    Ok(())
}
