mod cli;
mod config;
mod console;
mod logging;

use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, bail, Context};
use chrono::{Local, TimeZone};
use clap::Parser;
use engine_logging::engine_info;
use log::LevelFilter;
use pagescribe_core::{ControlMsg, RunRequest};
use pagescribe_engine::{EngineHandle, FileProgressStore};

use crate::cli::{Cli, Command};
use crate::config::AppConfig;
use crate::console::Finish;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli(&cli);
    logging::initialize(config.log_file.as_deref(), LevelFilter::Info);

    let request = match cli.command {
        Command::Status { run_id } => return show_status(&config, &run_id),
        Command::Novel { index_url } => ControlMsg::StartRun(RunRequest::Novel { index_url }),
        Command::Urls { input, run_id, .. } => ControlMsg::StartRun(RunRequest::UrlList {
            text: read_input(&input)?,
            run_id,
        }),
        Command::SavePartial { run_id } => ControlMsg::SavePartial { run_id },
    };

    let handle =
        EngineHandle::new(config.engine_config()).context("failed to start the engine runtime")?;
    if !handle.send(request) {
        bail!("engine stopped before the request was sent");
    }
    while let Some(msg) = handle.recv() {
        let (line, finish) = console::render(&msg);
        println!("{line}");
        match finish {
            Some(Finish::Done(_)) => return Ok(()),
            Some(Finish::Failed(message)) => return Err(anyhow!(message)),
            None => {}
        }
    }
    bail!("engine stopped without reporting a result")
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read URL list from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(Path::new(input))
        .with_context(|| format!("failed to read URL list {input}"))
}

fn show_status(config: &AppConfig, run_id: &str) -> anyhow::Result<()> {
    let store = FileProgressStore::new(config.store_dir.clone());
    let Some(state) = store.read(run_id)? else {
        println!("{run_id}: no saved progress");
        return Ok(());
    };
    engine_info!("read checkpoint of {} from {:?}", run_id, config.store_dir);

    let updated = Local
        .timestamp_millis_opt(state.last_update())
        .single()
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| state.last_update().to_string());
    println!("{}: {}", state.run_id(), state.title());
    println!("  concluded: {}", state.completed_identities().len());
    println!("  excluded:  {}", state.excluded_identities().len());
    println!("  updated:   {updated}");
    if store.is_locked(run_id) {
        println!("  running:   yes");
    }
    if let Some(last) = state.completed_identities().last() {
        println!("  last item: {last}");
    }
    Ok(())
}
