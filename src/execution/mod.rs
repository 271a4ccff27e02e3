pub mod executor;
pub mod venue;

pub use executor::{ExecutionReport, SubmittedTrade, TradeExecutor};
pub use venue::{TradeVenue, TxReceipt, check_receipt};
