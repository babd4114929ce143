use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc::unbounded_channel;
use tracing::info;

mod client;
mod controller;
mod domain;
mod inputter;
mod logging;
mod model;
mod notifier;
mod ui;

use client::HttpTableDataClient;
use controller::Controller;
use domain::{Message, RTError, ViewConfig};
use model::{Model, Status};
use notifier::ChannelNotifier;
use ui::TableUI;

fn main() -> ExitCode {
    let cfg = ViewConfig::parse();
    let result = run(cfg);
    ratatui::restore();
    match result {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run(cfg: ViewConfig) -> Result<(), RTError> {
    logging::init(&cfg.log_path())?;
    info!("Starting reltable!");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let client = HttpTableDataClient::new(&cfg.endpoint, Duration::from_secs(cfg.request_timeout))?;
    let (outcome_tx, mut outcome_rx) = unbounded_channel();
    let (toast_tx, mut toast_rx) = unbounded_channel();

    let mut model = Model::new(
        cfg.clone(),
        Arc::new(client),
        Arc::new(ChannelNotifier::new(toast_tx)),
        runtime.handle().clone(),
        outcome_tx,
    )?;
    let mut ui = TableUI::new();
    let controller = Controller::new(&cfg);

    let mut terminal = ratatui::init();
    model.connected();

    while model.status != Status::QUITTING {
        // Apply finished requests and notifications before rendering
        while let Ok(outcome) = outcome_rx.try_recv() {
            model.update(Message::Loaded(outcome))?;
        }
        while let Ok(toast) = toast_rx.try_recv() {
            ui.push_toast(toast);
        }

        terminal.draw(|f| ui.draw(&model, f))?;

        if let Some(message) = controller.handle_event(&model)? {
            model.update(message)?;
        };
    }

    info!("Shutting down");
    runtime.shutdown_timeout(Duration::from_millis(200));
    Ok(())
}
