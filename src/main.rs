use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    match orcestra_storage::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}
