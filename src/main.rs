use std::sync::Arc;

use actix_web::{web, App, HttpResponse, HttpServer};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medibill::config::Config;
use medibill::core::money;
use medibill::modules::composer::{DocumentComposer, HospitalIdentity};
use medibill::modules::ledger::controllers::ledger_controller::{self, DefaultTaxRate};
use medibill::modules::ledger::repositories::{
    MySqlChargeSourceRepository, MySqlInvoiceRepository,
};
use medibill::modules::ledger::services::LedgerService;
use medibill::modules::reports::controllers::report_controller;
use medibill::modules::reports::services::{
    HttpDocumentFetcher, HttpDocumentStore, InvoiceReportService, NotificationService,
    ReportMerger, SmtpNotifier,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "medibill=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");
    config.validate().expect("Configuration validation failed");

    tracing::info!("Starting MediBill Hospital Billing Platform");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Server binding to: {}", config.server.bind_address());

    // Create database connection pool
    let db_pool = config
        .database
        .create_pool()
        .await
        .expect("Failed to create database pool");

    tracing::info!(
        "Database pool initialized ({} connections)",
        config.database.pool_size
    );

    // Wire repositories and services
    let invoice_repo = Arc::new(MySqlInvoiceRepository::new(db_pool.clone()));
    let source_repo = Arc::new(MySqlChargeSourceRepository::new(db_pool.clone()));

    let ledger = Arc::new(LedgerService::new(invoice_repo, source_repo.clone()));

    let http_client = reqwest::Client::new();
    let composer = DocumentComposer::new(HospitalIdentity::from(&config.hospital));
    let merger = ReportMerger::new(
        Arc::new(HttpDocumentFetcher::new(http_client.clone())),
        Arc::new(HttpDocumentStore::new(
            http_client,
            config.storage.base_url.clone(),
            config.storage.signed_url_ttl_secs,
        )),
    );
    let reports = Arc::new(InvoiceReportService::new(
        ledger.clone(),
        source_repo,
        composer,
        merger,
    ));
    let notifier: Arc<dyn NotificationService> = Arc::new(SmtpNotifier::new(config.smtp.clone()));

    let default_tax = money::percent_to_rate(config.app.default_tax_percent.into());

    // Start HTTP server
    let bind_address = config.server.bind_address();
    let workers = config.server.workers;
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(ledger.clone()))
            .app_data(web::Data::new(reports.clone()))
            .app_data(web::Data::new(notifier.clone()))
            .app_data(web::Data::new(DefaultTaxRate(default_tax)))
            .route("/health", web::get().to(health_check))
            .route("/", web::get().to(index))
            .service(
                web::scope("/invoices")
                    .route("", web::post().to(ledger_controller::create_invoice))
                    .route("/{id}", web::get().to(ledger_controller::get_invoice))
                    .route("/{id}/sync", web::post().to(ledger_controller::sync_invoice))
                    .route("/{id}/items", web::post().to(ledger_controller::add_item))
                    .route(
                        "/{id}/items/{item_id}",
                        web::put().to(ledger_controller::update_item),
                    )
                    .route(
                        "/{id}/items/{item_id}",
                        web::delete().to(ledger_controller::delete_item),
                    )
                    .route(
                        "/{id}/payments",
                        web::post().to(ledger_controller::record_payment),
                    )
                    .route(
                        "/{id}/discount",
                        web::put().to(ledger_controller::set_discount),
                    )
                    .route(
                        "/{id}/document",
                        web::get().to(report_controller::download_document),
                    )
                    .route(
                        "/{id}/document",
                        web::post().to(report_controller::generate_document),
                    )
                    .route(
                        "/{id}/email",
                        web::post().to(report_controller::email_document),
                    ),
            )
            .route(
                "/admissions/{id}/room-charges",
                web::get().to(ledger_controller::room_charges),
            )
    })
    .workers(workers)
    .bind(&bind_address)?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "medibill"
    }))
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "service": "MediBill Hospital Billing Platform",
        "version": "0.1.0",
        "status": "running"
    }))
}
