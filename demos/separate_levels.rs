use {
    levelroll::{fields, LoggerBuilder},
    std::time::Duration,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::current_dir()?.join("logs").join("app.log");
    let logger = LoggerBuilder::new(path)
        .separate_by_level(true) // app.log.info-<date>, app.log.error-<date>, ...
        .rotation_period(Duration::from_secs(60 * 60)) // Rotate hourly
        .date_suffix_pattern("%Y%m%d%H")
        .max_age(Duration::from_secs(24 * 60 * 60)) // Keep one day of hourly files
        .file_mode(0o640)
        .build()?;

    for error_code in [500, 502, 503, 504] {
        logger.error(fields! { "code" => error_code }, "server encountered an internal error");
    }
    logger.warn(fields! { "username" => "warn" }, "slow response");
    logger.info(fields! {}, "requests served");

    Ok(())
}
