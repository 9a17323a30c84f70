use clap::Parser;
use env_logger::Env;
use log::info;

use subforge::settings::{init_settings, Settings};
use subforge::web_handlers;

/// Convert proxy subscriptions between client dialects
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the preferences file
    #[arg(short, long, value_name = "FILE", default_value = "pref.ini")]
    config: String,

    /// Listen address, overriding the preferences
    #[arg(short, long, value_name = "ADDRESS")]
    address: Option<String>,

    /// Listen port, overriding the preferences
    #[arg(short, long, value_name = "PORT")]
    port: Option<u32>,

    /// Run as a child of a foreign config manager: reload preferences and
    /// refresh rulesets on every request
    #[arg(long = "cfw")]
    cfw: bool,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let args = Args::parse();
    init_settings(&args.config, args.cfw).await;

    let listen_address = {
        let mut settings = (*Settings::current()).clone();
        if let Some(address) = args.address {
            settings.listen_address = address;
        }
        if let Some(port) = args.port {
            settings.listen_port = port;
        }
        let address = format!("{}:{}", settings.listen_address, settings.listen_port);
        Settings::replace(settings);
        address
    };

    let settings = Settings::current();
    info!("subforge starting on {}", listen_address);

    actix_web::HttpServer::new(|| actix_web::App::new().configure(web_handlers::config))
        .workers(settings.max_concur_threads as usize)
        .backlog(settings.max_pending_conns)
        .bind(listen_address)?
        .run()
        .await
}
