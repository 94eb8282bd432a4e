mod category;
mod expense;
mod ledger;
mod money;
mod report;

pub use category::*;
pub use expense::*;
pub use ledger::*;
pub use money::*;
pub use report::*;
