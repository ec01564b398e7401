use ssg_runner::StaticGenerator;
use ssg_runner::error::Result;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    // `with_env_filter` reads the RUST_LOG environment variable to set the log level.
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .init();

    // First argument is the config file; without one every default applies
    let generator = match std::env::args().nth(1) {
        Some(path) => StaticGenerator::from_config_file(path)?,
        None => StaticGenerator::from_config_str("{}")?,
    };

    let config = generator.config();
    println!(
        "Generating {} from {}...",
        config.output_dir().display(),
        config.ssr_dir().display()
    );

    if let Err(e) = generator.generate().await {
        eprintln!("Static generation failed: {}", e);
        return Err(e);
    }

    println!("Done");
    Ok(())
}
