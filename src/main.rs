use anyhow::Result;
use clap::Parser;

use dxlclean::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
