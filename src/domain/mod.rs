mod charge;
mod history;
mod ledger;
mod money;
mod offer;
mod provider;
mod transfer;
mod wallet;

pub use charge::*;
pub use history::*;
pub use ledger::*;
pub use money::*;
pub use offer::*;
pub use provider::*;
pub use transfer::*;
pub use wallet::*;
