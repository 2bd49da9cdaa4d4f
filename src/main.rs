use std::{
    io::{self, Write},
    process,
    sync::Arc,
};

use serde::Serialize;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;
use vitrina::{
    application::{error::AppError, session::StaticSession},
    config::{self, Command},
    context::AppContext,
    infra::{error::InfraError, telemetry},
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    // The binary only reads, so it never holds a session.
    let app = AppContext::build(&settings, Arc::new(StaticSession::anonymous()));
    info!(command = ?cli_args.command, "Running catalog query");

    match cli_args.command {
        Command::List(args) => {
            let page = app
                .products
                .list(&args.filter(), &args.page_request())
                .await?;
            print_json(&page)
        }
        Command::Show(args) => print_json(&app.products.get(&args.id).await?),
        Command::Search(args) => print_json(&app.products.search(&args.query).await?),
        Command::Categories => print_json(&app.products.categories().await?),
        Command::ByCategory(args) => print_json(&app.products.by_category(&args.category).await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).map_err(InfraError::from)?;
    writeln!(stdout).map_err(InfraError::from)?;
    Ok(())
}
