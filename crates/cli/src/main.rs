use std::process::ExitCode;

fn main() -> ExitCode {
    burgeria_cli::run()
}
