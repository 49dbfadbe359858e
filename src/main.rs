use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use survey_admin::api::SurveyClient;
use survey_admin::cli::{self, AppContext, Cli};
use survey_admin::config::Config;
use survey_admin::session::Session;
use survey_admin::store::LocalStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger to file (truncate on each run)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("survey-admin.log")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    dotenvy::dotenv().ok();

    let args = Cli::parse();
    info!("Starting survey-admin");

    let config = Config::load()?;
    let store_path = Config::store_path()?;
    let store = LocalStore::open(&store_path)
        .await
        .with_context(|| format!("Failed to open local store: {}", store_path.display()))?;
    let client = SurveyClient::from_config(&config.api)?;
    let session = Session::init(client, store).await?;

    let mut ctx = AppContext::new(config, session);
    cli::run(args, &mut ctx).await
}
