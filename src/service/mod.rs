pub mod directory;
pub mod ledger;

pub use directory::EmployeeDirectory;
pub use ledger::AttendanceLedger;
