// Input validation utilities

use anyhow::Result;
use regex::Regex;
use url::Url;

/// Validate a catalog folder name.
///
/// The folder lands directly under the catalog root; keep the character set
/// conservative (letters/numbers/underscore, no path separators) so the name
/// can be embedded verbatim in catalog paths and SOAP payloads.
pub fn validate_folder_name(name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow::anyhow!("Folder name is required"));
    }
    if name.len() > 128 {
        return Err(anyhow::anyhow!("Folder name cannot exceed 128 characters"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(anyhow::anyhow!("Folder name cannot contain path separators"));
    }

    let ident_re = Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_ -]*$").map_err(|e| {
        anyhow::anyhow!("Internal error: failed to compile folder name regex: {}", e)
    })?;
    if !ident_re.is_match(name) {
        return Err(anyhow::anyhow!(
            "Folder name contains invalid characters: '{}'",
            name
        ));
    }

    Ok(())
}

/// Validate connection string format (basic)
pub fn validate_connection_string(conn_str: &str) -> Result<()> {
    if conn_str.trim().is_empty() {
        return Err(anyhow::anyhow!("Connection string cannot be empty"));
    }

    // Basic validation - the report server rejects malformed connect strings
    // with a structured fault at data source creation time.
    Ok(())
}

/// Validate a report server base URL (http/https, absolute).
pub fn validate_server_url(raw: &str) -> Result<Url> {
    let parsed = Url::parse(raw.trim())
        .map_err(|e| anyhow::anyhow!("Invalid report server URL '{}': {}", raw, e))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(anyhow::anyhow!(
                "Report server URL must be http(s), got '{}'",
                other
            ))
        }
    }
    if parsed.host_str().is_none() {
        return Err(anyhow::anyhow!("Report server URL is missing a host: '{}'", raw));
    }

    Ok(parsed)
}
