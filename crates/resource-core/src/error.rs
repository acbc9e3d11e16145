use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Profile file not found: {0}")]
    ProfileFileNotFound(String),

    #[error("Failed to parse profile file: {0}")]
    ProfileParseError(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Call decode error: {0}")]
    CallDecode(String),

    #[error("Call failed: group={group}, call={call}: {reason}")]
    CallFailed {
        group: String,
        call: String,
        reason: String,
    },

    #[error("Missing call result: group={0}, call={1}")]
    MissingCallResult(String, String),

    #[error("Missing account address for balance query")]
    MissingAccount,
}

pub type Result<T> = std::result::Result<T, ResourceError>;
