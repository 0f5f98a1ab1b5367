pub mod customer;
pub mod dashboard;
pub mod invoice;
pub mod invoice_item;
pub mod item;
pub mod reminder;
pub mod user;

pub use customer::{Customer, CustomerPayload, CustomerWithStats, RepaymentOutcome, RepaymentPayload};
pub use dashboard::DashboardStats;
pub use invoice::{
    CreatedInvoice, Invoice, InvoiceDetail, InvoicePayload, InvoiceType, InvoiceWithCustomer,
    PaymentStatus, UpdatedInvoice,
};
pub use invoice_item::{CreateInvoiceItem, InvoiceItem};
pub use item::{Item, ItemGroup, ItemGroupPayload, ItemPayload, ItemWithGroup};
pub use reminder::{CreateReminder, Reminder, ReminderWithContext};
pub use user::{SanitizedUser, User};
