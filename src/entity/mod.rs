pub mod audit_logs;
pub mod books;
pub mod images;
pub mod orders;

pub use audit_logs::Entity as AuditLogs;
pub use books::Entity as Books;
pub use images::Entity as Images;
pub use orders::Entity as Orders;
