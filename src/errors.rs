use thiserror::Error;

/// Why a candidate workout was refused by the validator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("model output is not parseable JSON: {0}")] Unparsable(String),
    #[error("workout must be a JSON object")] NotAnObject,
    #[error("missing required field '{0}'")] MissingField(&'static str),
    #[error("field '{field}' must be {expected}")] WrongType { field: &'static str, expected: &'static str },
    #[error("invalid value for '{field}': {reason}")] InvalidField { field: &'static str, reason: String },
    #[error("workout contains no exercises")] NoExercises,
    #[error("workout shape rejected: {0}")] Shape(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    UpstreamUnavailable,
    UpstreamMalformed,
    ValidationFailed,
    Store,
    Delivery,
}

#[derive(Error, Debug)]
pub enum CoachError {
    #[error("configuration error: {0}")] Config(String),
    #[error("generation upstream unavailable: {0}")] Upstream(String),
    #[error("generation upstream returned unusable content: {0}")] Malformed(String),
    #[error("generated workout rejected: {0}")] Validation(#[from] ValidationError),
    #[error("store error: {0}")] Store(String),
    #[error("mail delivery failed: {0}")] Mail(String),
    #[error("no email address for user {0}")] MissingEmail(String),
    #[error("unknown user {0}")] UnknownUser(String),
}

impl CoachError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoachError::Config(_) => ErrorKind::Configuration,
            CoachError::Upstream(_) => ErrorKind::UpstreamUnavailable,
            CoachError::Malformed(_) => ErrorKind::UpstreamMalformed,
            CoachError::Validation(ValidationError::Unparsable(_)) => ErrorKind::UpstreamMalformed,
            CoachError::Validation(_) => ErrorKind::ValidationFailed,
            CoachError::Store(_) | CoachError::UnknownUser(_) => ErrorKind::Store,
            CoachError::Mail(_) | CoachError::MissingEmail(_) => ErrorKind::Delivery,
        }
    }
}

impl From<reqwest::Error> for CoachError {
    fn from(err: reqwest::Error) -> Self {
        CoachError::Upstream(err.to_string())
    }
}
