//! Schema loading from various sources.
//!
//! Handles loading hyper-schema documents from files, strings, and HTTP URLs.

use std::path::Path;

use serde_json::Value;

use crate::error::LoadError;
use crate::schema::Schema;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a schema document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't a valid schema document.
pub fn load_schema(path: &Path) -> Result<Schema, LoadError> {
    load_schema_str(&read_file(path)?)
}

/// Load a schema document from a JSON string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't a valid schema document.
pub fn load_schema_str(content: &str) -> Result<Schema, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Load a schema document from an already-parsed JSON value.
pub fn load_schema_value(value: Value) -> Result<Schema, LoadError> {
    Schema::from_value(value).map_err(|source| LoadError::InvalidJson { source })
}

/// Load a schema document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails,
/// or `LoadError::InvalidJson` if the body isn't a valid schema document.
#[cfg(feature = "remote")]
pub fn load_schema_url(url: &str) -> Result<Schema, LoadError> {
    let network_error = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    // Check for HTTP errors before parsing
    let body = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(network_error)?;

    load_schema_str(&body)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a schema document from a file path or URL.
///
/// Automatically detects whether the source is a URL or file path.
/// URL loading requires the `remote` feature.
///
/// # Errors
///
/// Returns appropriate errors based on the source type.
pub fn load_schema_auto(source: &str) -> Result<Schema, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_schema_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_schema(Path::new(source))
    }
}

/// Load a symbol list file (one name per line) produced by a source scanner.
pub fn load_symbol_list(path: &Path) -> Result<Vec<String>, LoadError> {
    Ok(crate::symbols::parse_symbol_list(&read_file(path)?))
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}
