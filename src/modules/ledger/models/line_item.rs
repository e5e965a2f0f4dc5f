// A line item is one billable entry on an invoice.
//
// Synced items carry a `reference_id` pointing at the charge source record
// they were materialized from; per invoice at most one item exists per
// distinct (item_type, reference_id) pair. That pair is what makes ledger
// sync idempotent. Custom items have no reference and can repeat freely.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::{AppError, Result};

/// Category of a billed line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "lowercase")]
pub enum LineItemType {
    #[serde(rename = "room")]
    Room,
    #[serde(rename = "medication")]
    Medication,
    #[serde(rename = "lab")]
    Lab,
    #[serde(rename = "custom")]
    Custom,
}

impl std::fmt::Display for LineItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineItemType::Room => write!(f, "room"),
            LineItemType::Medication => write!(f, "medication"),
            LineItemType::Lab => write!(f, "lab"),
            LineItemType::Custom => write!(f, "custom"),
        }
    }
}

impl LineItemType {
    /// Category header used in the detailed breakup section
    pub fn category_label(&self) -> &'static str {
        match self {
            LineItemType::Room => "Room/Bed Charges",
            LineItemType::Medication => "Medication Charges",
            LineItemType::Lab => "Lab Charges",
            LineItemType::Custom => "Other",
        }
    }
}

/// Represents a single line item on an invoice
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LineItem {
    pub id: i64,
    pub invoice_id: i64,
    pub item_type: LineItemType,
    pub item_name: String,
    pub item_description: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,

    /// quantity × unit_price, or source-supplied when the charge source
    /// carries a precomputed amount
    pub total_price: Decimal,

    /// Identifier of the originating charge source record; None for
    /// custom items
    pub reference_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LineItem {
    /// Build an unsaved item whose total derives from quantity × unit price
    pub fn new(
        invoice_id: i64,
        item_type: LineItemType,
        item_name: impl Into<String>,
        item_description: Option<String>,
        quantity: Decimal,
        unit_price: Decimal,
        reference_id: Option<String>,
    ) -> Result<Self> {
        let item_name = item_name.into();
        Self::validate_name(&item_name)?;
        Self::validate_quantity(quantity)?;
        Self::validate_unit_price(unit_price)?;

        let now = Utc::now();
        Ok(Self {
            id: 0,
            invoice_id,
            item_type,
            item_name,
            item_description,
            total_price: quantity * unit_price,
            quantity,
            unit_price,
            reference_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Build an unsaved item with a source-supplied total (e.g. a lab
    /// record's fixed catalog price)
    pub fn with_fixed_total(
        invoice_id: i64,
        item_type: LineItemType,
        item_name: impl Into<String>,
        item_description: Option<String>,
        total_price: Decimal,
        reference_id: Option<String>,
    ) -> Result<Self> {
        let mut item = Self::new(
            invoice_id,
            item_type,
            item_name,
            item_description,
            Decimal::ONE,
            total_price,
            reference_id,
        )?;
        item.total_price = total_price;
        Ok(item)
    }

    /// Dedup key; None for custom items, which repeat freely
    pub fn dedup_key(&self) -> Option<(LineItemType, &str)> {
        self.reference_id
            .as_deref()
            .map(|reference| (self.item_type, reference))
    }

    /// Recompute the derived total after a quantity/price change
    pub fn recalculate_total(&mut self) {
        self.total_price = self.quantity * self.unit_price;
        self.updated_at = Utc::now();
    }

    fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(AppError::validation("Line item name cannot be empty"));
        }

        if name.len() > 255 {
            return Err(AppError::validation(
                "Line item name cannot exceed 255 characters",
            ));
        }

        Ok(())
    }

    fn validate_quantity(quantity: Decimal) -> Result<()> {
        if quantity <= Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Quantity must be positive, got: {}",
                quantity
            )));
        }

        Ok(())
    }

    fn validate_unit_price(unit_price: Decimal) -> Result<()> {
        if unit_price < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Unit price must be non-negative, got: {}",
                unit_price
            )));
        }

        Ok(())
    }
}
