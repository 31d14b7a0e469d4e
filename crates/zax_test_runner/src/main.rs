//! zax_test_runner entry point.
#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::Parser;
use std::io;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use zax_test_runner::cli::Cli;
use zax_test_runner::{watch, ExitCode, Session};

fn init_logging() {
    let filter = EnvFilter::try_from_env("ZAX_LOG").unwrap_or_else(|_| EnvFilter::new("off"));

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("zax_test_runner: {e}");
            match e.downcast_ref::<zax_test_runner::Error>() {
                Some(err) => ExitCode::from(err),
                None => ExitCode::InternalError,
            }
        }
    };

    std::process::exit(exit_code as i32);
}

async fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let criteria = cli.criteria()?;
    let session = Session::new(cli.root(), cli.config.clone(), cli.overrides());

    let cancel = session.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, no further test files will start");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    if cli.watch {
        watch::watch(&session, &criteria).await?;
        return Ok(if session.is_cancelled() { ExitCode::Interrupted } else { ExitCode::Success });
    }

    let project = session.load()?;

    if cli.list_tests {
        let selection = project.select(&criteria);
        for path in &selection.tests {
            println!("{}", project.discovery().relative(path));
        }
        return Ok(ExitCode::Success);
    }

    let executor = Arc::new(session.executor(&project)?);
    let summary = session
        .run(&project, &criteria, executor, io::stdout(), io::stderr())
        .await?;
    Ok(summary.exit_code(project.config().pass_with_no_tests))
}
