use actix_cors::Cors;
use actix_files::Files;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;

use backend::config::{AppConfig, HEATMAP_ROUTE};
use backend::handlers;
use backend::services::classifier::Classifier;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::new().expect("invalid configuration");
    let classifier = Classifier::from_config(&config.classifier);

    // The renderer also creates this per request; here so the static mount
    // has a directory to serve from the first request on.
    std::fs::create_dir_all(&config.heatmap.dir)?;

    let bind = (config.host.clone(), config.port);
    log::info!("Server running at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(classifier.clone()))
            .service(web::resource("/predict").route(web::post().to(handlers::predict)))
            .service(web::resource("/heatmap").route(web::post().to(handlers::heatmap)))
            .service(web::resource("/health").route(web::get().to(handlers::health)))
            .service(Files::new(HEATMAP_ROUTE, config.heatmap.dir.clone()))
    })
    .bind(bind)?
    .run()
    .await
}
