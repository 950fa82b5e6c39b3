// src/main.rs

use jepsen_matrix::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("jepsen-matrix error: {err:?}");
        std::process::exit(1);
    }

    match run(args).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("jepsen-matrix error: {err:?}");
            std::process::exit(err.exit_code());
        }
    }
}
