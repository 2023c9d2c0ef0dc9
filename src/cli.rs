use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "motor-server-rs",
    version,
    about = "Motor telemetry ingest and alert server"
)]
pub struct Args {
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,
    #[arg(long, default_value_t = 8000)]
    pub port: u16,
    #[arg(long, default_value_t = false)]
    pub print_openapi: bool,
}
