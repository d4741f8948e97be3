use thiserror::Error;

use crate::placement::ObjectId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("no placed objects to destroy")]
    NothingToDestroy,
    #[error("unknown placed object {0}")]
    UnknownObject(ObjectId),
}
