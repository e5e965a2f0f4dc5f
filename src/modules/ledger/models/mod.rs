pub mod charge_source;
pub mod invoice;
pub mod line_item;

pub use charge_source::{
    AdmissionFacts, ChargeSource, LabBillingRecord, LabBillingStatus, MedicationAggregate,
    OccupancySegment, RoomChargeBreakdown, RoomSegmentCharge,
};
pub use invoice::{Invoice, InvoiceStatus};
pub use line_item::{LineItem, LineItemType};
