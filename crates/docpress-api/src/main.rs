use docpress_core::Config;

// mimalloc keeps fragmentation low when the service runs in musl-based containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let (state, router) = docpress_api::setup::initialize_app(config.clone()).await?;

    docpress_api::setup::server::start_server(&config, state, router).await?;

    Ok(())
}
