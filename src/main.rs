use log::{error, info, Level, Metadata, Record};
use q2rcon::server;
use std::error::Error;
use tokio::signal;

const LISTEN_ADDR: &str = "127.0.0.1:27910";
const PASSWORD: &str = "actionquake";

/// Prints responder activity to stdout, tagged with the module it came from.
struct ConsoleLogger {
    level: Level,
}

static LOGGER: ConsoleLogger = ConsoleLogger { level: Level::Info };

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            println!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    log::set_logger(&LOGGER).map_err(|e| e.to_string())?;
    log::set_max_level(LOGGER.level.to_level_filter());

    let server = server::Server::bind(LISTEN_ADDR, PASSWORD).await?;
    let handle = server.start(|command| match command {
        "status" => String::from("map: q2dm1\nnum score ping name\n"),
        other => format!("Unknown command \"{}\"\n", other),
    });

    tokio::select!(
        res = handle => {
            if let Err(err) = res {
                error!("responder stopped: {:?}", err);
            }
        }
        _ = signal::ctrl_c() => {}
    );

    info!("bye");
    Ok(())
}
