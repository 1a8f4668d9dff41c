use std::path::PathBuf;

// This main function is the entry point when running `cargo run -p web-server`.
// It serves the API with `config.toml` from the working directory.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = configuration::load_config(&PathBuf::from("config.toml"))?;
    let _guard = configuration::init_tracing(&config.logging)?;
    web_server::run_server(&config).await
}
