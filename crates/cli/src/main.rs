fn main() {
    match xpath_tester_cli::run() {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            // Tracing is initialized inside run() after argument parsing.
            tracing::error!(%error, "CLI execution failed");
            std::process::exit(1);
        }
    }
}
