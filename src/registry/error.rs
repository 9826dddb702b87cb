#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Missing user id")]
    Missing,
    #[error("Unsupported user id type: {0}")]
    Unsupported(&'static str),
}
