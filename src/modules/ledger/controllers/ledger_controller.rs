use std::sync::Arc;

use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::core::error::AppError;
use crate::core::money;
use crate::middleware::StaffIdentity;
use crate::modules::financials::{DiscountRule, FinancialCalculator};
use crate::modules::ledger::services::LedgerService;

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub admission_id: i64,
    /// Fractional tax rate; defaults to the configured rate when absent
    pub tax_rate: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct CustomItemRequest {
    pub item_name: String,
    pub item_description: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub item_name: Option<String>,
    pub item_description: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DiscountRequest {
    pub discount_type: String,
    #[serde(default)]
    pub discount_value: Decimal,
    pub include_tax: bool,
}

/// Default fractional tax rate applied to new invoices
pub struct DefaultTaxRate(pub Decimal);

/// Create an invoice for an admission
/// POST /invoices
pub async fn create_invoice(
    service: web::Data<Arc<LedgerService>>,
    default_tax: web::Data<DefaultTaxRate>,
    staff: StaffIdentity,
    request: web::Json<CreateInvoiceRequest>,
) -> Result<HttpResponse, AppError> {
    let tax_rate = request.tax_rate.unwrap_or(default_tax.0);
    FinancialCalculator::new().validate_tax_rate(tax_rate)?;

    let invoice = service
        .create_invoice(request.admission_id, tax_rate, &staff.audit_label())
        .await?;

    Ok(HttpResponse::Created().json(invoice))
}

/// Get an invoice with its line items and calculated totals
/// GET /invoices/{id}
pub async fn get_invoice(
    service: web::Data<Arc<LedgerService>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let invoice_id = path.into_inner();
    let (invoice, items) = service.get_invoice(invoice_id).await?;

    let totals = FinancialCalculator::new().totals(
        invoice.total_amount,
        invoice.discount_rule(),
        invoice.include_tax,
        invoice.tax_rate,
        invoice.paid_amount,
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "invoice": invoice,
        "line_items": items,
        "totals": {
            "subtotal": money::round_display(totals.subtotal),
            "discount_amount": money::round_display(totals.discount_amount),
            "tax_amount": money::round_display(totals.tax_amount),
            "payable": money::round_display(totals.payable),
            "paid": money::round_display(totals.paid),
            "balance": money::round_display(totals.balance),
        }
    })))
}

/// Re-run the idempotent ledger sync for an invoice
/// POST /invoices/{id}/sync
pub async fn sync_invoice(
    service: web::Data<Arc<LedgerService>>,
    staff: StaffIdentity,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let invoice_id = path.into_inner();
    tracing::info!(invoice_id, staff = %staff.audit_label(), "Ledger sync requested");

    let report = service.sync_all(invoice_id).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Room charge estimate from occupancy history
/// GET /admissions/{id}/room-charges
pub async fn room_charges(
    service: web::Data<Arc<LedgerService>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let breakdown = service.compute_room_charges(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(breakdown))
}

/// Add a manually entered line item
/// POST /invoices/{id}/items
pub async fn add_item(
    service: web::Data<Arc<LedgerService>>,
    staff: StaffIdentity,
    path: web::Path<i64>,
    request: web::Json<CustomItemRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let item = service
        .add_custom_item(
            path.into_inner(),
            request.item_name,
            request.item_description,
            request.quantity,
            request.unit_price,
            &staff.audit_label(),
        )
        .await?;

    Ok(HttpResponse::Created().json(item))
}

/// Update a line item
/// PUT /invoices/{id}/items/{item_id}
pub async fn update_item(
    service: web::Data<Arc<LedgerService>>,
    staff: StaffIdentity,
    path: web::Path<(i64, i64)>,
    request: web::Json<UpdateItemRequest>,
) -> Result<HttpResponse, AppError> {
    let (invoice_id, item_id) = path.into_inner();
    let request = request.into_inner();

    let item = service
        .update_item(
            invoice_id,
            item_id,
            request.item_name,
            request.item_description,
            request.quantity,
            request.unit_price,
            &staff.audit_label(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(item))
}

/// Delete a line item
/// DELETE /invoices/{id}/items/{item_id}
pub async fn delete_item(
    service: web::Data<Arc<LedgerService>>,
    staff: StaffIdentity,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse, AppError> {
    let (invoice_id, item_id) = path.into_inner();
    service
        .delete_item(invoice_id, item_id, &staff.audit_label())
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Record a payment against an invoice
/// POST /invoices/{id}/payments
pub async fn record_payment(
    service: web::Data<Arc<LedgerService>>,
    staff: StaffIdentity,
    path: web::Path<i64>,
    request: web::Json<PaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let invoice = service
        .record_payment(
            path.into_inner(),
            request.amount,
            request.note,
            &staff.audit_label(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(invoice))
}

/// Update the invoice discount descriptor
/// PUT /invoices/{id}/discount
pub async fn set_discount(
    service: web::Data<Arc<LedgerService>>,
    staff: StaffIdentity,
    path: web::Path<i64>,
    request: web::Json<DiscountRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let rule = DiscountRule::from_parts(&request.discount_type, request.discount_value)
        .ok_or_else(|| {
            AppError::validation(format!(
                "Unknown discount type: {}",
                request.discount_type
            ))
        })?;

    service
        .set_discount(
            path.into_inner(),
            rule,
            request.include_tax,
            &staff.audit_label(),
        )
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
