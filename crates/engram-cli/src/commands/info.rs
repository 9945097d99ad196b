//! System information command

use anyhow::Result;
use clap::Args;
use colored::Colorize;

#[derive(Args)]
pub struct InfoArgs {}

pub fn run(_args: InfoArgs) -> Result<()> {
    println!("{}", "Engram - episodic graph memory".bold());
    println!("  version:   {}", env!("CARGO_PKG_VERSION"));
    println!("  protocol:  CSP/1");
    println!("  backend:   in-memory reference store");
    println!("  signals:   semantic + lexical + graph proximity");
    Ok(())
}
