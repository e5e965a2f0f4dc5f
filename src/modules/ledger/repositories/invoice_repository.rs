// Invoice/line-item persistence.
//
// The dedup invariant lives in the store: line_items carries a UNIQUE KEY
// over (invoice_id, item_type, reference_id), so concurrent sync calls for
// the same invoice cannot double-insert a source. Insert paths report a
// unique-key collision as "already present" instead of an error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::ledger::models::{Invoice, InvoiceStatus, LineItem};

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Create a pending invoice for an admission, allocating the next
    /// sequential invoice number
    async fn create_invoice(&self, admission_id: i64, tax_rate: Decimal) -> Result<Invoice>;

    async fn find_invoice(&self, id: i64) -> Result<Option<Invoice>>;

    async fn find_line_items(&self, invoice_id: i64) -> Result<Vec<LineItem>>;

    async fn find_line_item(&self, invoice_id: i64, item_id: i64) -> Result<Option<LineItem>>;

    /// Insert a line item, returning the stored row. Returns None when
    /// the item's (item_type, reference_id) pair is already present on
    /// the invoice.
    async fn insert_line_item(&self, item: &LineItem) -> Result<Option<LineItem>>;

    async fn update_line_item(&self, item: &LineItem) -> Result<()>;

    async fn delete_line_item(&self, invoice_id: i64, item_id: i64) -> Result<()>;

    /// Persist the recomputed derived total
    async fn update_total(&self, invoice_id: i64, total: Decimal) -> Result<()>;

    async fn update_discount(
        &self,
        invoice_id: i64,
        discount_type: &str,
        discount_value: Decimal,
        include_tax: bool,
    ) -> Result<()>;

    async fn record_payment(
        &self,
        invoice_id: i64,
        paid_amount: Decimal,
        status: InvoiceStatus,
        paid_at: DateTime<Utc>,
        note: Option<&str>,
    ) -> Result<()>;
}

/// MySQL-backed invoice repository
pub struct MySqlInvoiceRepository {
    pool: MySqlPool,
}

impl MySqlInvoiceRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvoiceRepository for MySqlInvoiceRepository {
    async fn create_invoice(&self, admission_id: i64, tax_rate: Decimal) -> Result<Invoice> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO invoices (
                admission_id, invoice_number, status, total_amount,
                discount_type, discount_value, include_tax, tax_rate,
                paid_amount, created_at, updated_at
            ) VALUES (?, '', 'pending', 0, 'none', 0, TRUE, ?, 0, NOW(), NOW())
            "#,
        )
        .bind(admission_id)
        .bind(tax_rate)
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_id() as i64;
        let invoice_number = format!("INV-{:06}", id);

        sqlx::query("UPDATE invoices SET invoice_number = ? WHERE id = ?")
            .bind(&invoice_number)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.find_invoice(id)
            .await?
            .ok_or_else(|| AppError::internal("Invoice vanished after creation"))
    }

    async fn find_invoice(&self, id: i64) -> Result<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, admission_id, invoice_number, status, total_amount,
                   discount_type, discount_value, include_tax, tax_rate,
                   paid_amount, last_payment_date, payment_note,
                   created_at, updated_at
            FROM invoices
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    async fn find_line_items(&self, invoice_id: i64) -> Result<Vec<LineItem>> {
        let items = sqlx::query_as::<_, LineItem>(
            r#"
            SELECT id, invoice_id, item_type, item_name, item_description,
                   quantity, unit_price, total_price, reference_id,
                   created_at, updated_at
            FROM line_items
            WHERE invoice_id = ?
            ORDER BY id
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn find_line_item(&self, invoice_id: i64, item_id: i64) -> Result<Option<LineItem>> {
        let item = sqlx::query_as::<_, LineItem>(
            r#"
            SELECT id, invoice_id, item_type, item_name, item_description,
                   quantity, unit_price, total_price, reference_id,
                   created_at, updated_at
            FROM line_items
            WHERE invoice_id = ? AND id = ?
            "#,
        )
        .bind(invoice_id)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn insert_line_item(&self, item: &LineItem) -> Result<Option<LineItem>> {
        let result = sqlx::query(
            r#"
            INSERT INTO line_items (
                invoice_id, item_type, item_name, item_description,
                quantity, unit_price, total_price, reference_id,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(item.invoice_id)
        .bind(item.item_type.to_string())
        .bind(&item.item_name)
        .bind(&item.item_description)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total_price)
        .bind(&item.reference_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                let mut stored = item.clone();
                stored.id = done.last_insert_id() as i64;
                Ok(Some(stored))
            }
            Err(e) => {
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_unique_violation() {
                        // Another sync already materialized this source
                        return Ok(None);
                    }
                }
                Err(AppError::Database(e))
            }
        }
    }

    async fn update_line_item(&self, item: &LineItem) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE line_items
            SET item_name = ?, item_description = ?, quantity = ?,
                unit_price = ?, total_price = ?, updated_at = NOW()
            WHERE invoice_id = ? AND id = ?
            "#,
        )
        .bind(&item.item_name)
        .bind(&item.item_description)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total_price)
        .bind(item.invoice_id)
        .bind(item.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_line_item(&self, invoice_id: i64, item_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM line_items WHERE invoice_id = ? AND id = ?")
            .bind(invoice_id)
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Line item {} on invoice {}",
                item_id, invoice_id
            )));
        }

        Ok(())
    }

    async fn update_total(&self, invoice_id: i64, total: Decimal) -> Result<()> {
        sqlx::query("UPDATE invoices SET total_amount = ?, updated_at = NOW() WHERE id = ?")
            .bind(total)
            .bind(invoice_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_discount(
        &self,
        invoice_id: i64,
        discount_type: &str,
        discount_value: Decimal,
        include_tax: bool,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE invoices
            SET discount_type = ?, discount_value = ?, include_tax = ?,
                updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(discount_type)
        .bind(discount_value)
        .bind(include_tax)
        .bind(invoice_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_payment(
        &self,
        invoice_id: i64,
        paid_amount: Decimal,
        status: InvoiceStatus,
        paid_at: DateTime<Utc>,
        note: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE invoices
            SET paid_amount = ?, status = ?, last_payment_date = ?,
                payment_note = COALESCE(?, payment_note), updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(paid_amount)
        .bind(status.to_string())
        .bind(paid_at)
        .bind(note)
        .bind(invoice_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
