use consign_core::Config;

// mimalloc as the global allocator, notably for musl-based container images.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (telemetry, collaborators, routes)
    let (_state, router) = consign_api::setup::initialize_app(config.clone()).await?;

    consign_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
