use std::fs::{self, File, OpenOptions};
use std::io;
use std::io::Write;
use std::sync::Mutex;

use lazy_static::lazy_static;
use regex::Regex;
use slog::{o, Drain, Duplicate, Fuse, Logger, Record};
use slog_async::{Async, OverflowStrategy};
use slog_json::Json;
use slog_term::{CountingWriter, FullFormat, RecordDecorator, TermDecorator, ThreadSafeTimestampFn};

lazy_static! {
    static ref MODULE_SEPARATOR_REGEX: Regex =
        Regex::new(r"::").expect("Could not compile module separator regex");
}

///
/// Format the message according to the following standard:
/// `[YY-mm-dd HH:MM:SS.SSS] [MODULE] <LEVEL>: <MESSAGE>[, ...<KEY>: <VALUE>]`
///
/// # Arguments
/// * fn_timestamp: Method to get the current timestamp
/// * rd: RecordDecorator to write formatted message to
/// * record: Record to retrieve current logger data from (E.g. module, location, etc)
/// * use_file_location: Whether to specify the destination file
///
/// # Returns
/// `Result<bool>`: `true` indicating message should be logged, `false` to skip
///
pub fn print_msg_header(
    fn_timestamp: &dyn ThreadSafeTimestampFn<Output = io::Result<()>>,
    mut rd: &mut dyn RecordDecorator,
    record: &Record,
    use_file_location: bool,
) -> io::Result<bool> {
    rd.start_whitespace()?;
    write!(rd, "[")?;

    rd.start_timestamp()?;
    fn_timestamp(&mut rd)?;

    rd.start_whitespace()?;
    write!(rd, "] [")?;

    rd.start_value()?;
    let module: &str = MODULE_SEPARATOR_REGEX
        .split(record.module())
        .last()
        .unwrap_or_else(|| record.module());
    write!(rd, "{}", module)?;

    rd.start_whitespace()?;
    write!(rd, "] ")?;

    rd.start_level()?;
    write!(rd, "{}", record.level().as_short_str())?;

    if use_file_location {
        rd.start_location()?;
        write!(
            rd,
            "[{}:{}:{}]",
            record.location().file,
            record.location().line,
            record.location().column
        )?;
    }

    rd.start_whitespace()?;
    write!(rd, ": ")?;

    rd.start_msg()?;
    let mut count_rd = CountingWriter::new(&mut rd);
    write!(count_rd, "{}", record.msg())?;
    Ok(count_rd.count() != 0)
}

///
/// Retrieve the current date time in the following format:
/// `YY-mm-dd HH:MM:SS.SSS`
///
pub fn timestamp_utc(io: &mut dyn io::Write) -> io::Result<()> {
    write!(io, "{}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"))
}

///
/// Initialise a logger with a given prefix for the log file. Log file name
/// will be in the following format: `logs/<PREFIX>_<TIMESTAMP>.log`
///
/// # Returns
/// * Logger: A logger instance with two drains for STDOUT and JSON file writer
///
pub fn initialize_logging(prefix: &str) -> Logger {
    let log_directory: &str = "logs";
    let directory_creation_message: &str = match fs::create_dir(log_directory) {
        Ok(_) => "Created logging directory",
        Err(_) => "Logging directory already exists, skipping",
    };

    let log_file_path: String = format!(
        "{}/{}_{}.log",
        log_directory,
        prefix,
        chrono::Utc::now().format("%Y%m%d_%H%M%S"),
    );
    let file: File = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_file_path.as_str())
        .expect("Unable to open log file");

    let decorator: TermDecorator = TermDecorator::new().build();

    // Drain for STDOUT logging
    let term_drain: Fuse<FullFormat<TermDecorator>> = FullFormat::new(decorator)
        .use_custom_timestamp(timestamp_utc)
        .use_custom_header_print(print_msg_header)
        .build()
        .fuse();
    // Drain for JSON file writing
    let json_drain: Fuse<Json<File>> = Json::default(file).fuse();
    // Both drains behind a mutex for thread safety, then an async worker
    // with a blocking overflow strategy so records are never dropped
    let both = Mutex::new(Duplicate::new(term_drain, json_drain)).fuse();
    let drain: Fuse<Async> = Async::new(both)
        .overflow_strategy(OverflowStrategy::Block)
        .build()
        .fuse();
    let log: Logger = Logger::root(drain, o!());

    slog::info!(log, "{}", directory_creation_message);
    log
}
