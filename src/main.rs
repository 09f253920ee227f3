use clap::Parser;
use flow_viewer::Cli;

fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config()?;
    flow_viewer::run(config)
}
