mod config;
mod github;
mod hooks;
mod http;
mod middleware;
mod registry;
mod runner;
mod signature;
#[cfg(test)]
mod test_log;

use actix_web::{web, App, HttpServer};
use color_eyre::eyre::{self, WrapErr as _};

#[actix_web::main]
async fn main() -> eyre::Result<()> {
    dotenv::dotenv().ok();
    color_eyre::install()?;
    tracing_log::LogTracer::init()?;
    tracing::subscriber::set_global_default(tracing_subscriber::fmt().finish())?;

    let mut config: config::Config = envy::prefixed("HOOKD_")
        .from_env()
        .wrap_err("Failed to read HOOKD_* configuration")?;
    if let Some(path) = std::env::args_os().nth(1) {
        config.targets = path.into();
    }

    let registry = config::load_registry(&config.targets, config.routing)?;
    tracing::info!(
        "Loaded {} webhook(s) from {:?} with {:?} routing:",
        registry.len(),
        config.targets,
        config.routing,
    );
    for target in registry.iter() {
        tracing::info!(
            "  -> {} - {:?} at {:?}",
            target.id,
            target.command.exec,
            target.command.workdir,
        );
    }

    let registry = web::Data::new(registry);

    let addr = (config.host.as_str(), config.port);
    tracing::info!("Listening for GitHub webhooks on {}:{}", addr.0, addr.1);
    HttpServer::new(move || {
        App::new()
            .app_data(registry.clone())
            .wrap(middleware::Observe)
            .default_service(web::route().to(hooks::push_hook))
    })
    .bind(addr)?
    .run()
    .await
    .map_err(Into::into)
}
