use std::process::ExitCode;

fn main() -> ExitCode {
    contentspec_cli::run()
}
