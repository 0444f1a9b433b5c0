use thiserror::Error;

/// Errors returned by [`ZipTree`](crate::ZipTree) operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum Error {
    /// The requested key is not present in the tree.
    #[error("key not found")]
    KeyNotFound,

    /// The key being inserted is already present in the tree.
    #[error("key already present")]
    DuplicateKey,
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
