// src/main.rs

use cxxrun::{cli, logging, run};

#[tokio::main]
async fn main() {
    // Exit explicitly: a blocked terminal read must not keep the runtime alive.
    match run_main().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("cxxrun error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<i32> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
