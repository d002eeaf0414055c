//! perfwatch CLI entry point.

#[tokio::main]
async fn main() {
    let result = match perfwatch_cli::load_env_file() {
        Ok(()) => perfwatch_cli::run().await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
