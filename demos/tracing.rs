use {
    levelroll::{RollingSink, RotationConfig, SystemClock, TimeZone},
    std::{sync::Arc, time::Duration},
    tracing_subscriber::util::SubscriberInitExt,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = RotationConfig {
        rotation_period: Duration::from_secs(60),
        max_age: Duration::from_secs(3 * 60),
        date_suffix_pattern: "%Y%m%d%H%M".to_owned(),
        time_zone: TimeZone::Local.offset(),
        file_mode: None,
    };
    let path = std::env::current_dir()?.join("logs").join("tracing.log");
    // The sink is used directly as an appender; it rotates every minute.
    let sink: &'static RollingSink = Box::leak(Box::new(RollingSink::new(path, config, Arc::new(SystemClock))?));

    let (non_blocking, _guard) = tracing_appender::non_blocking(sink);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .finish()
        .try_init()?;

    tracing::info!("This is an info message");
    tracing::warn!("This is a warning message");
    tracing::error!("This is an error message");

    Ok(())
}
