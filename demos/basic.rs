use levelroll::{fields, Format, Level, LoggerBuilder, TimeZone};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::current_dir()?.join("logs").join("basic.log");
    let logger = LoggerBuilder::new(path)
        .format(Format::Structured)
        .level(Level::Debug)
        .time_zone(TimeZone::UTC) // Name files and align midnight in UTC
        .record_caller(true)
        .build()?;

    // Files look like logs/basic.log-20250401, with logs/basic.log pointing at the newest
    logger.info(fields! { "hello" => "world" }, "hello");
    levelroll::debug!(logger, { "port" => 8080 }, "listening on {}", "0.0.0.0");
    levelroll::warn!(logger, "config file not found, using defaults");

    Ok(())
}
