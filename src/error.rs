use thiserror::Error;

use crate::bracket::Stage;
use crate::standings::Conference;

/// Source data could not be turned into a table. The section that needed it
/// shows a "data unavailable" state; the rest of the dashboard keeps working.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("table `{id}` not found on page (layout changed?)")]
    TableMissing { id: String },

    #[error("{what} table has no usable rows")]
    Empty { what: &'static str },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BracketError {
    #[error("{conference} has only {found} ranked teams; 8 are needed to seed a bracket")]
    InsufficientTeams { conference: Conference, found: usize },

    #[error("{stage}: waiting for a pick between {top} and {bottom}")]
    Pending {
        stage: Stage,
        top: String,
        bottom: String,
    },

    #[error("bracket already has a champion")]
    AlreadyComplete,
}
