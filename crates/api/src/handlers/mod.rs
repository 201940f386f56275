pub mod invoices;
pub mod jobs;
pub mod organization;
