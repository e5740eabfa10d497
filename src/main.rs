use anyhow::Context;
use clap::Parser;

use automata::{AppConfig, AutomataApp};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::parse();
    if let Err(err) = run(config) {
        log::error!("{:#}", err);
        std::process::exit(1);
    }
}

fn run(config: AppConfig) -> anyhow::Result<()> {
    let app = AutomataApp::new(config).context("failed to create event loop")?;
    app.run().context("simulation terminated")
}
