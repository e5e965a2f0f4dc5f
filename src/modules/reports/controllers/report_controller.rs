use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::error::AppError;
use crate::middleware::StaffIdentity;
use crate::modules::composer::{ComposeOptions, NarrativeSection};
use crate::modules::reports::services::invoice_report_service::{
    GeneratedDocument, InvoiceReportService,
};
use crate::modules::reports::services::notification::NotificationService;

#[derive(Debug, Deserialize)]
pub struct DocumentQuery {
    #[serde(default)]
    pub include_reports: bool,
    #[serde(default)]
    pub collapse_summary: bool,
}

#[derive(Debug, Deserialize)]
pub struct GenerateDocumentRequest {
    #[serde(default)]
    pub include_reports: bool,
    #[serde(default)]
    pub collapse_summary: bool,
    #[serde(default)]
    pub narrative: Vec<NarrativeRequestSection>,
}

#[derive(Debug, Deserialize)]
pub struct NarrativeRequestSection {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub recipient: String,
}

fn document_response(document: GeneratedDocument) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(document.content_type)
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", document.filename),
        ))
        .body(document.bytes)
}

/// Download the invoice document
/// GET /invoices/{id}/document
pub async fn download_document(
    service: web::Data<Arc<InvoiceReportService>>,
    path: web::Path<i64>,
    query: web::Query<DocumentQuery>,
) -> Result<HttpResponse, AppError> {
    let options = ComposeOptions {
        collapse_summary: query.collapse_summary,
        narrative: Vec::new(),
    };

    let document = service
        .generate(path.into_inner(), query.include_reports, options)
        .await?;

    Ok(document_response(document))
}

/// Generate the invoice document with explicit options, including an
/// appended clinical summary page
/// POST /invoices/{id}/document
pub async fn generate_document(
    service: web::Data<Arc<InvoiceReportService>>,
    path: web::Path<i64>,
    request: web::Json<GenerateDocumentRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let options = ComposeOptions {
        collapse_summary: request.collapse_summary,
        narrative: request
            .narrative
            .into_iter()
            .map(|section| NarrativeSection {
                title: section.title,
                body: section.body,
            })
            .collect(),
    };

    let document = service
        .generate(path.into_inner(), request.include_reports, options)
        .await?;

    Ok(document_response(document))
}

/// Email the invoice document to a recipient
/// POST /invoices/{id}/email
pub async fn email_document(
    service: web::Data<Arc<InvoiceReportService>>,
    notifier: web::Data<Arc<dyn NotificationService>>,
    staff: StaffIdentity,
    path: web::Path<i64>,
    request: web::Json<EmailRequest>,
) -> Result<HttpResponse, AppError> {
    let invoice_id = path.into_inner();
    let document = service
        .generate(invoice_id, true, ComposeOptions::default())
        .await?;

    let subject = format!("Your invoice {}", document.filename.trim_end_matches(".pdf"));
    let body = "Please find your hospital invoice attached.";
    notifier
        .send_invoice(&request.recipient, &subject, body, &document)
        .await?;

    tracing::info!(
        invoice_id,
        recipient = %request.recipient,
        staff = %staff.audit_label(),
        "Invoice emailed"
    );

    Ok(HttpResponse::Accepted().json(serde_json::json!({
        "filename": document.filename,
        "recipient": request.recipient,
    })))
}
