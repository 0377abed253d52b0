//! Static configuration shared by the library and the binary.

use std::path::PathBuf;

/// Default location of the early-access list, relative to the working directory.
pub const DEFAULT_STORAGE_PATH: &str = "data/early-access.json";

pub const INVALID_PAYLOAD_MESSAGE: &str = "Invalid email";
pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address.";
pub const DUPLICATE_MESSAGE: &str = "That email is already on the list.";
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";
pub const SERVER_ERROR_MESSAGE: &str = "Server error";

/// Runtime settings resolved from the command line and environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub storage_path: PathBuf,
    pub session_secret: Option<String>,
    pub seed: Option<u64>,
}
