use levelroll::{fields, global_logger, set_global, LoggerBuilder, Options};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Before a logger is installed, calls go to stderr.
    global_logger::info(fields! {}, "starting up");

    let path = std::env::current_dir()?.join("logs").join("global.log");
    let options: Options = serde_json::from_value(serde_json::json!({
        "path": path,
        "format": "structured",
        "level": "debug",
        "max_age": 7 * 24 * 3600,
    }))?;
    set_global(LoggerBuilder::from_options(options).build()?)?;

    global_logger::debug(fields! { "stage" => "ready" }, "global logger installed");
    global_logger::error(fields! { "retry" => true }, "upstream unavailable");

    Ok(())
}
