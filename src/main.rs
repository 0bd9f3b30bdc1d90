use diorama::{DioramaApp, DioramaConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DioramaConfig::from_env()?;
    log::info!(
        "Starting diorama: {} shapes, assets in '{}'",
        config.spawn.count,
        config.assets.root.display()
    );

    DioramaApp::new(config)?.run()?;
    Ok(())
}
