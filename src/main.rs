// src/main.rs

use std::process::ExitCode;

use cyclexec::{cli, logging, run};

// Not a tokio main: the executor blocks on worker results, which tokio
// forbids from inside a runtime context.
fn main() -> ExitCode {
    match run_main() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            eprintln!("cyclexec error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn run_main() -> anyhow::Result<bool> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args)
}
