//! ticker - personal task tracker
//!
//! Tasks with due dates, groups and dependency gating, stored as a JSON
//! document in a per-user data directory.

use clap::Parser;
use ticker::cli::{resolve_data_dir, Cli};
use ticker::logging;
use ticker::output::{emit_error, infer_command_name_from_args};

fn main() {
    let command = infer_command_name_from_args();
    let cli = Cli::parse();
    logging::init(&resolve_data_dir(cli.dir.clone()));

    let json = cli.json;
    if let Err(err) = cli.run() {
        tracing::warn!(command = %command, error = %err, "command failed");
        let _ = emit_error(&command, &err, json);
        std::process::exit(err.exit_code());
    }
}
