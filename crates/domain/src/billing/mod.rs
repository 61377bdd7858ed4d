/// Dispensed line items
pub mod line_item;

/// Subtotal/total and payment status rules
pub mod totals;

/// Human-readable bill identifiers
pub mod bill_number;

pub use bill_number::{BillNumber, BillSuffix};
pub use line_item::LineItem;
pub use totals::{PaymentStatus, Totals};
