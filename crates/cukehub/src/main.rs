//! Command line front end for the CukeHub feature-file editor.

mod cli;
mod output;

fn main() -> eyre::Result<()> {
    cli::run()
}
