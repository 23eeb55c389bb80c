use cca_gate::cli::{init_tracing, Cli, GateCommand};
use clap::Parser;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let command = GateCommand::new(cli.stdin_timeout_ms);
    std::process::exit(command.execute());
}
