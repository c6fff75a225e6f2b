use clap::Parser;
use std::env;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Record keeping service for an auto-repair shop",
    long_about = "Serves cars, customers and the cars assigned to each customer over a JSON HTTP API, backed by a local SQLite database."
)]
pub struct Cli {
    #[arg(
        long,
        default_value_t = false,
        help = "Reset all persisted state (delete the SQLite database) before starting"
    )]
    pub reset: bool,

    #[arg(
        long,
        env = "AUTOSERVICE_DATA_DIR",
        default_value = ".autoservice/",
        value_name = "DIR",
        help = "Directory to store the SQLite database"
    )]
    pub data_dir: String,

    #[arg(
        long = "log-file",
        env = "AUTOSERVICE_LOG_FILE",
        value_name = "PATH",
        help = "Write logs to PATH (in addition to stderr)"
    )]
    pub log_file: Option<String>,

    #[arg(
        long = "api-listen",
        env = "AUTOSERVICE_API_LISTEN",
        value_name = "ADDR",
        default_value = "127.0.0.1:5001",
        help = "REST API listen address (host:port)"
    )]
    pub api_listen: std::net::SocketAddr,
}

pub fn parse() -> Cli {
    let dotenv_path = env::var("DOTENV_PATH").unwrap_or(".env".into());
    if dotenvy::from_filename(&dotenv_path).is_ok() {
        log::info!("📄 Loaded env from {}", dotenv_path);
    }

    Cli::parse()
}
