use actix_web::{cookie::Key, middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use watchlist::auth::HASH_COST;
use watchlist::cli::{Args, Command};
use watchlist::database::AdminDb;
use watchlist::{commands, handlers};

fn session_key(secret_key: Option<&str>) -> anyhow::Result<Key> {
    match secret_key {
        Some(secret_key) => {
            Key::try_from(secret_key.as_bytes()).context("Invalid session secret key")
        }
        None => {
            warn!("No secret key configured, sessions will not survive a restart");
            Ok(Key::generate())
        }
    }
}

async fn serve(db: sled::Db, bind: &str, secret_key: Option<&str>) -> anyhow::Result<()> {
    let key = session_key(secret_key)?;
    let tera = web::Data::new(watchlist::load_templates().context("Failed to load templates")?);
    let db = web::Data::new(db);
    if db.get_admin()?.is_none() {
        warn!("No admin configured yet, run `watchlist admin` to create one");
    }

    info!("Listening on http://{}", bind);
    HttpServer::new(move || {
        App::new()
            .wrap(handlers::error_handlers())
            .wrap(watchlist::identity_middleware())
            .wrap(watchlist::session_middleware(key.clone()))
            .wrap(Logger::default())
            .app_data(tera.clone())
            .app_data(db.clone())
            .configure(handlers::configure)
    })
    .bind(bind)?
    .run()
    .await?;
    Ok(())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("watchlist=debug,actix_web=info"),
    )
    .init();

    let args = Args::parse();
    let db = sled::open(&args.database)
        .with_context(|| format!("Failed to open database at {}", args.database.display()))?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(db, &args.bind, args.secret_key.as_deref()).await?,
        Command::Initdb { drop } => commands::initdb(&db, drop)?,
        Command::Forge { name } => {
            commands::forge(&db, &name)?;
        }
        Command::Admin { username, password } => {
            let (username, password) = commands::prompt_credentials(username, password)?;
            commands::admin(&db, &username, &password, HASH_COST)?;
        }
    }
    Ok(())
}
