pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{AccountType, CustomerType};
pub use error::CoreError;
pub use structs::{
    AccountRow, AccountView, ContactRow, ContactView, CreatedAccount, CreatedCustomer,
    CustomerRecord, CustomerRow, CustomerView,
};
