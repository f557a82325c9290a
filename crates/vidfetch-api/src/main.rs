use vidfetch_core::Config;

// Use mimalloc as the global allocator for better performance and lower fragmentation,
// especially when running on musl-based systems inside containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (tools, progress registry, routes)
    let (_state, router) = vidfetch_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    vidfetch_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
