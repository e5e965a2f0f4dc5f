// Charge source records: the external, read-only records a line item can
// be materialized from. Each variant maps to a uniform LineItem through
// exactly one function.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::Result;
use crate::modules::ledger::models::{LineItem, LineItemType};

/// One stay in a room/bed, at a daily rate. An open segment (`end` = None)
/// is billed up to the sync instant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OccupancySegment {
    pub id: i64,
    pub admission_id: i64,
    pub room_label: String,
    pub bed_label: String,
    pub rate_per_day: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl OccupancySegment {
    /// Billable days: ceiling of the occupied span, minimum one day.
    /// A started day is a billed day.
    pub fn billable_days(&self, now: DateTime<Utc>) -> i64 {
        let end = self.end_date.unwrap_or(now);
        let span = end - self.start_date;
        let seconds = span.num_seconds().max(0);
        let days = (seconds + 86_399) / 86_400;
        days.max(1)
    }

    pub fn charge(&self, now: DateTime<Utc>) -> Decimal {
        Decimal::from(self.billable_days(now)) * self.rate_per_day
    }

    pub fn display_label(&self) -> String {
        format!("{} / {}", self.room_label, self.bed_label)
    }
}

/// Administered-medication aggregate: doses to date at a per-unit price
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MedicationAggregate {
    pub id: i64,
    pub admission_id: i64,
    pub medication_name: String,
    pub price_per_unit: Decimal,
    pub units_per_dose: Decimal,
    pub doses_administered: i64,
}

impl MedicationAggregate {
    pub fn charge(&self) -> Decimal {
        self.price_per_unit * self.units_per_dose * Decimal::from(self.doses_administered)
    }

    pub fn units_dispensed(&self) -> Decimal {
        self.units_per_dose * Decimal::from(self.doses_administered)
    }
}

/// Billing state of a lab record; only `billed` records generate charges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "lowercase")]
pub enum LabBillingStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "billed")]
    Billed,
}

/// Lab test billing record with a fixed catalog price
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LabBillingRecord {
    pub id: i64,
    pub admission_id: i64,
    pub test_name: String,
    pub price: Decimal,
    pub billing_status: LabBillingStatus,
    /// Storage key of the uploaded report document, when one exists
    pub report_key: Option<String>,
}

/// Patient/admission facts consumed by the document composer. Owned by the
/// patient/admission CRUD subsystem; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdmissionFacts {
    pub admission_id: i64,
    pub admission_number: String,
    pub patient_name: String,
    pub patient_code: String,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub gender: String,
    pub address: String,
    pub room_label: String,
    pub bed_label: String,
    pub attending_clinician: String,
    pub admitted_at: DateTime<Utc>,
}

/// Tagged union over everything that can generate a line item.
///
/// Each variant resolves to a uniform LineItem via `into_line_item`; the
/// sync paths never handle per-source shapes anywhere else.
#[derive(Debug, Clone)]
pub enum ChargeSource {
    Room(OccupancySegment),
    Medication(MedicationAggregate),
    Lab(LabBillingRecord),
    Custom {
        name: String,
        description: Option<String>,
        quantity: Decimal,
        unit_price: Decimal,
    },
}

impl ChargeSource {
    pub fn item_type(&self) -> LineItemType {
        match self {
            ChargeSource::Room(_) => LineItemType::Room,
            ChargeSource::Medication(_) => LineItemType::Medication,
            ChargeSource::Lab(_) => LineItemType::Lab,
            ChargeSource::Custom { .. } => LineItemType::Custom,
        }
    }

    /// Identifier of the backing record; None for custom entries
    pub fn reference_id(&self) -> Option<String> {
        match self {
            ChargeSource::Room(segment) => Some(segment.id.to_string()),
            ChargeSource::Medication(aggregate) => Some(aggregate.id.to_string()),
            ChargeSource::Lab(record) => Some(record.id.to_string()),
            ChargeSource::Custom { .. } => None,
        }
    }

    /// Resolve this source to a uniform, unsaved line item.
    ///
    /// `now` bounds open occupancy segments so the mapping stays a pure
    /// function of its inputs.
    pub fn into_line_item(self, invoice_id: i64, now: DateTime<Utc>) -> Result<LineItem> {
        let reference_id = self.reference_id();
        match self {
            ChargeSource::Room(segment) => {
                let days = segment.billable_days(now);
                LineItem::new(
                    invoice_id,
                    LineItemType::Room,
                    segment.display_label(),
                    Some(format!("{} day(s) @ {}/day", days, segment.rate_per_day)),
                    Decimal::from(days),
                    segment.rate_per_day,
                    reference_id,
                )
            }
            ChargeSource::Medication(aggregate) => LineItem::new(
                invoice_id,
                LineItemType::Medication,
                aggregate.medication_name.clone(),
                Some(format!(
                    "{} dose(s), {} unit(s)",
                    aggregate.doses_administered,
                    aggregate.units_dispensed()
                )),
                aggregate.units_dispensed(),
                aggregate.price_per_unit,
                reference_id,
            ),
            ChargeSource::Lab(record) => LineItem::with_fixed_total(
                invoice_id,
                LineItemType::Lab,
                record.test_name.clone(),
                None,
                record.price,
                reference_id,
            ),
            ChargeSource::Custom {
                name,
                description,
                quantity,
                unit_price,
            } => LineItem::new(
                invoice_id,
                LineItemType::Custom,
                name,
                description,
                quantity,
                unit_price,
                None,
            ),
        }
    }
}

/// One segment's contribution to the room-charge estimate
#[derive(Debug, Clone, Serialize)]
pub struct RoomSegmentCharge {
    pub segment_id: i64,
    pub room_label: String,
    pub bed_label: String,
    pub days: i64,
    pub rate_per_day: Decimal,
    pub charge: Decimal,
}

/// Room charges computed from the admission's occupancy history
#[derive(Debug, Clone, Serialize)]
pub struct RoomChargeBreakdown {
    pub segments: Vec<RoomSegmentCharge>,
    pub total: Decimal,
}
