//! Application services orchestrating policies and repository ports.

pub mod accounts;
pub mod catalog;
pub mod import;
pub mod reviews;
pub mod unit_of_work;

pub use accounts::AccountService;
pub use catalog::CatalogService;
pub use import::{CsvImporter, ImportReport, TableStats};
pub use reviews::ReviewService;
pub use unit_of_work::{AppUnitOfWork, AppUnitOfWorkBuilder};
