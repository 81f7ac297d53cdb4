use {
    chrono::{FixedOffset, TimeZone as _, Utc},
    levelroll::{fields, Fields, Format, Level, LogError, Logger, LoggerBuilder, ManualClock, TimeZone},
    serde_json::Value,
    std::{
        fs,
        panic::{catch_unwind, AssertUnwindSafe},
        path::Path,
        sync::Arc,
        time::Duration,
    },
    tempfile::TempDir,
};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

fn builder(dir: &Path) -> LoggerBuilder {
    LoggerBuilder::new(dir.join("app.log"))
        .time_zone(TimeZone::Fix(FixedOffset::east_opt(0).unwrap()))
        .clock(Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 17, 10, 0, 0).unwrap())))
}

fn read(logger: &Logger, level: Level) -> String {
    fs::read_to_string(logger.router().route(level).current_path()).unwrap()
}

fn records(text: &str) -> Vec<Value> {
    text.lines().map(|line| serde_json::from_str(line).unwrap()).collect()
}

#[derive(Debug, PartialEq)]
struct Exited(i32);

fn fake_exit(code: i32) -> ! {
    std::panic::panic_any(Exited(code))
}

#[test]
fn structured_entry_lands_in_a_single_file() {
    let dir = TempDir::new().unwrap();
    let logger = builder(dir.path())
        .rotation_period(DAY)
        .max_age(7 * DAY)
        .separate_by_level(false)
        .format(Format::Structured)
        .build()
        .unwrap();

    logger.info(fields! { "hello" => "world" }, "hello");

    let files: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .flatten()
        .filter(|entry| entry.file_type().unwrap().is_file())
        .collect();
    assert_eq!(files.len(), 1);
    let records = records(&fs::read_to_string(files[0].path()).unwrap());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["level"], "info");
    assert_eq!(records[0]["msg"], "hello");
    assert_eq!(records[0]["hello"], "world");
    assert_eq!(records[0]["time"], "2024-05-17 10:00:00");
}

#[test]
fn separate_mode_keeps_levels_apart() {
    let dir = TempDir::new().unwrap();
    let logger = builder(dir.path())
        .separate_by_level(true)
        .format(Format::Structured)
        .build()
        .unwrap();

    logger.warn(fields! { "username" => "warn" }, "careful");
    logger.error(fields! { "username" => "error" }, "broken");

    let warn = records(&read(&logger, Level::Warn));
    let error = records(&read(&logger, Level::Error));
    assert_eq!(warn.len(), 1);
    assert_eq!(error.len(), 1);
    assert_eq!(warn[0]["level"], "warn");
    assert_eq!(error[0]["level"], "error");

    assert_ne!(
        logger.router().route(Level::Warn).current_path(),
        logger.router().route(Level::Error).current_path()
    );
    assert_eq!(
        logger.router().route(Level::Warn).current_path(),
        dir.path().join("app.log.warn-20240517")
    );
    for level in [Level::Panic, Level::Fatal, Level::Info, Level::Debug] {
        assert!(read(&logger, level).is_empty(), "{level} file received an entry");
    }
}

#[test]
fn shared_mode_keeps_write_order_across_levels() {
    let dir = TempDir::new().unwrap();
    let logger = builder(dir.path()).level(Level::Debug).build().unwrap();

    logger.debug(Fields::new(), "one");
    logger.info(Fields::new(), "two");
    logger.warn(Fields::new(), "three");
    logger.error(Fields::new(), "four");

    assert_eq!(
        read(&logger, Level::Info),
        "2024-05-17 10:00:00 [DEBUG] one\n\
         2024-05-17 10:00:00 [INFO] two\n\
         2024-05-17 10:00:00 [WARN] three\n\
         2024-05-17 10:00:00 [ERROR] four\n"
    );
}

#[test]
fn levels_below_threshold_write_nothing() {
    let dir = TempDir::new().unwrap();
    let logger = builder(dir.path()).level(Level::Warn).separate_by_level(true).build().unwrap();

    logger.debug(fields! { "a" => 1 }, "hidden");
    logger.info(fields! { "a" => 2 }, "hidden");
    levelroll::info!(logger, "also hidden {}", 3);
    assert!(levelroll::log!(logger, Level::Debug, "hidden too").is_ok());

    for level in Level::ALL {
        let size = fs::metadata(logger.router().route(level).current_path()).unwrap().len();
        assert_eq!(size, 0, "{level} file grew");
    }

    logger.warn(Fields::new(), "visible");
    assert!(read(&logger, Level::Warn).contains("visible"));
}

#[test]
fn text_fields_are_appended_as_key_value_pairs() {
    let dir = TempDir::new().unwrap();
    let logger = builder(dir.path()).build().unwrap();

    levelroll::info!(logger, { "user" => "bob", "tries" => 3 }, "login {}", "ok");

    assert_eq!(read(&logger, Level::Info), "2024-05-17 10:00:00 [INFO] login ok tries=3 user=bob\n");
}

#[test]
fn caller_location_is_the_call_site() {
    let dir = TempDir::new().unwrap();
    let logger = builder(dir.path()).format(Format::Structured).record_caller(true).build().unwrap();

    logger.info(Fields::new(), "direct");
    let direct = format!("{}:{}", file!(), line!() - 1);
    levelroll::warn!(logger, "via macro");
    let via_macro = format!("{}:{}", file!(), line!() - 1);
    levelroll::log!(logger, Level::Error, "via log").unwrap();
    let via_log = format!("{}:{}", file!(), line!() - 1);

    let records = records(&read(&logger, Level::Info));
    assert_eq!(records[0]["call"], direct);
    assert_eq!(records[1]["call"], via_macro);
    assert_eq!(records[2]["call"], via_log);
}

#[test]
fn caller_field_name_is_configurable() {
    let dir = TempDir::new().unwrap();
    let logger = builder(dir.path())
        .format(Format::Structured)
        .record_caller(true)
        .caller_field_name("caller")
        .build()
        .unwrap();

    logger.info(Fields::new(), "x");

    let records = records(&read(&logger, Level::Info));
    assert!(records[0]["caller"].as_str().unwrap().starts_with(file!()));
    assert!(records[0].get("call").is_none());
}

#[test]
fn data_key_nests_user_fields() {
    let dir = TempDir::new().unwrap();
    let logger = builder(dir.path()).format(Format::Structured).data_key("data").build().unwrap();

    logger.info(fields! { "msg" => "user msg" }, "real msg");

    let records = records(&read(&logger, Level::Info));
    assert_eq!(records[0]["msg"], "real msg");
    assert_eq!(records[0]["data"]["msg"], "user msg");
}

#[test]
fn pretty_output_is_still_one_object_per_entry() {
    let dir = TempDir::new().unwrap();
    let logger = builder(dir.path())
        .format(Format::Structured)
        .pretty_structured_output(true)
        .build()
        .unwrap();

    logger.info(fields! { "a" => 1 }, "first");
    logger.info(fields! { "b" => 2 }, "second");

    let text = read(&logger, Level::Info);
    let values: Vec<Value> = serde_json::Deserializer::from_str(&text)
        .into_iter::<Value>()
        .map(Result::unwrap)
        .collect();
    assert_eq!(values.len(), 2);
    assert_eq!(values[1]["msg"], "second");
    assert!(text.lines().count() > 2);
}

#[test]
fn panic_writes_before_unwinding() {
    let dir = TempDir::new().unwrap();
    let logger = builder(dir.path()).build().unwrap();

    let payload = catch_unwind(AssertUnwindSafe(|| logger.panic(fields! { "code" => 7 }, "boom"))).unwrap_err();

    assert_eq!(payload.downcast_ref::<String>().map(String::as_str), Some("boom"));
    assert_eq!(read(&logger, Level::Panic), "2024-05-17 10:00:00 [PANIC] boom code=7\n");
}

#[test]
fn panic_macro_formats_fields_and_message() {
    let dir = TempDir::new().unwrap();
    let logger = builder(dir.path()).format(Format::Structured).build().unwrap();

    let payload = catch_unwind(AssertUnwindSafe(|| {
        levelroll::log_panic!(logger, { "shard" => 4 }, "shard {} unreachable", 4)
    }))
    .unwrap_err();

    assert_eq!(payload.downcast_ref::<String>().map(String::as_str), Some("shard 4 unreachable"));
    let records = records(&read(&logger, Level::Panic));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["level"], "panic");
    assert_eq!(records[0]["shard"], 4);
    assert_eq!(records[0]["msg"], "shard 4 unreachable");
}

#[test]
fn fatal_writes_before_exiting() {
    let dir = TempDir::new().unwrap();
    let logger = builder(dir.path()).separate_by_level(true).exit_fn(fake_exit).build().unwrap();

    let payload = catch_unwind(AssertUnwindSafe(|| levelroll::fatal!(logger, "cannot continue: {}", "disk"))).unwrap_err();

    assert_eq!(payload.downcast_ref::<Exited>(), Some(&Exited(1)));
    assert_eq!(read(&logger, Level::Fatal), "2024-05-17 10:00:00 [FATAL] cannot continue: disk\n");
}

#[test]
fn fatal_through_log_also_exits() {
    let dir = TempDir::new().unwrap();
    let logger = builder(dir.path()).exit_fn(fake_exit).build().unwrap();

    let payload = catch_unwind(AssertUnwindSafe(|| {
        let _ = logger.log(Level::Fatal, Fields::new(), "bye");
    }))
    .unwrap_err();

    assert_eq!(payload.downcast_ref::<Exited>(), Some(&Exited(1)));
    assert!(read(&logger, Level::Fatal).contains("[FATAL] bye"));
}

#[test]
fn log_surfaces_rotation_errors() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 17, 23, 0, 0).unwrap()));
    let logger = builder(dir.path()).clock(clock.clone()).build().unwrap();

    fs::create_dir(dir.path().join("app.log-20240518")).unwrap();
    clock.advance(chrono::Duration::hours(2));

    let err = logger.log(Level::Info, Fields::new(), "still written").unwrap_err();
    assert!(matches!(err, LogError::CreateFileFailed(..)));
    let old = fs::read_to_string(dir.path().join("app.log-20240517")).unwrap();
    assert!(old.contains("still written"));
}

#[test]
fn loggers_are_shareable_across_threads() {
    let dir = TempDir::new().unwrap();
    let logger = Arc::new(builder(dir.path()).build().unwrap());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let logger = Arc::clone(&logger);
            std::thread::spawn(move || {
                for i in 0..50 {
                    levelroll::info!(logger, { "thread" => t }, "entry {i}");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(read(&logger, Level::Info).lines().count(), 200);
}
