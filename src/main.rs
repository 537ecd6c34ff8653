use tile_streamer::{config::TileWorldConfig, game};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = TileWorldConfig::default();
    simple_logger::SimpleLogger::new()
        .with_level(config.log_level)
        .init()?;

    if let Err(e) = game::run(config) {
        log::error!("failed to start: {}", e);
        return Err(e);
    }
    Ok(())
}
