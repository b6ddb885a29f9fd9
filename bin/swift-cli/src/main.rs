//! `swift` binary: seed, leech, and inspect swarms from a shell.

mod cli;
mod uri;

use clap::Parser;

fn main() -> eyre::Result<()> {
    let cli = cli::SwiftCli::parse();
    cli::run(cli)
}
