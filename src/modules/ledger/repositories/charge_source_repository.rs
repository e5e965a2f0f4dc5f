// Read-only access to the charge source records owned by the clinical
// subsystems: occupancy history, medication administration, lab billing.

use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::core::Result;
use crate::modules::ledger::models::{
    AdmissionFacts, LabBillingRecord, MedicationAggregate, OccupancySegment,
};

#[async_trait]
pub trait ChargeSourceRepository: Send + Sync {
    /// Occupancy history of an admission, oldest segment first
    async fn occupancy_segments(&self, admission_id: i64) -> Result<Vec<OccupancySegment>>;

    async fn medication_aggregates(&self, admission_id: i64) -> Result<Vec<MedicationAggregate>>;

    async fn lab_billing_records(&self, admission_id: i64) -> Result<Vec<LabBillingRecord>>;

    /// Patient/admission facts for the document header block; None when
    /// the admission does not exist
    async fn admission_facts(&self, admission_id: i64) -> Result<Option<AdmissionFacts>>;
}

/// MySQL-backed charge source repository
pub struct MySqlChargeSourceRepository {
    pool: MySqlPool,
}

impl MySqlChargeSourceRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChargeSourceRepository for MySqlChargeSourceRepository {
    async fn occupancy_segments(&self, admission_id: i64) -> Result<Vec<OccupancySegment>> {
        let segments = sqlx::query_as::<_, OccupancySegment>(
            r#"
            SELECT id, admission_id, room_label, bed_label, rate_per_day,
                   start_date, end_date
            FROM occupancy_segments
            WHERE admission_id = ?
            ORDER BY start_date
            "#,
        )
        .bind(admission_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(segments)
    }

    async fn medication_aggregates(&self, admission_id: i64) -> Result<Vec<MedicationAggregate>> {
        let aggregates = sqlx::query_as::<_, MedicationAggregate>(
            r#"
            SELECT id, admission_id, medication_name, price_per_unit,
                   units_per_dose, doses_administered
            FROM medication_aggregates
            WHERE admission_id = ?
            ORDER BY id
            "#,
        )
        .bind(admission_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(aggregates)
    }

    async fn lab_billing_records(&self, admission_id: i64) -> Result<Vec<LabBillingRecord>> {
        let records = sqlx::query_as::<_, LabBillingRecord>(
            r#"
            SELECT id, admission_id, test_name, price, billing_status,
                   report_key
            FROM lab_billing_records
            WHERE admission_id = ?
            ORDER BY id
            "#,
        )
        .bind(admission_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn admission_facts(&self, admission_id: i64) -> Result<Option<AdmissionFacts>> {
        let facts = sqlx::query_as::<_, AdmissionFacts>(
            r#"
            SELECT a.id AS admission_id, a.admission_number,
                   p.full_name AS patient_name, p.patient_code,
                   p.date_of_birth, p.gender, p.address,
                   a.room_label, a.bed_label, a.attending_clinician,
                   a.admitted_at
            FROM admissions a
            JOIN patients p ON p.id = a.patient_id
            WHERE a.id = ?
            "#,
        )
        .bind(admission_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(facts)
    }
}
