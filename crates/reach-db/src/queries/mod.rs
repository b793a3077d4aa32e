mod contracts;
mod goals;
pub(crate) mod jobs;
mod messaging;
mod proposals;
mod transactions;
mod users;

pub use contracts::ContractResolution;
pub use messaging::MessagePage;
pub use proposals::ProposalResolution;

use anyhow::Result;

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
