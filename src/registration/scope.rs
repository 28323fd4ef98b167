//! Scope resolution for worker scripts.
//!
//! A worker may control at most the directory its script lives in. An
//! explicit scope has to sit inside that directory.

use super::RegistrationError;

/// Path component of a script URL, without query or fragment
pub fn script_path(script_url: &str) -> Result<&str, RegistrationError> {
    let trimmed = script_url.trim();
    if trimmed.is_empty() {
        return Err(RegistrationError::InvalidScriptUrl {
            script_url: script_url.to_string(),
            reason: "script URL is empty".to_string(),
        });
    }

    let without_origin = match trimmed.find("://") {
        Some(idx) => {
            let rest = &trimmed[idx + 3..];
            match rest.find('/') {
                Some(slash) => &rest[slash..],
                None => "/",
            }
        }
        None => trimmed,
    };

    let path = without_origin
        .split(['?', '#'])
        .next()
        .unwrap_or(without_origin);

    if !path.starts_with('/') {
        return Err(RegistrationError::InvalidScriptUrl {
            script_url: script_url.to_string(),
            reason: "script path must be absolute".to_string(),
        });
    }
    if path.ends_with('/') {
        return Err(RegistrationError::InvalidScriptUrl {
            script_url: script_url.to_string(),
            reason: "script path names a directory".to_string(),
        });
    }

    Ok(path)
}

/// Collapse `.` and `..` segments and repeated slashes in an absolute path.
///
/// Returns `None` when a `..` would climb above the root. A trailing slash
/// (or trailing dot segment) is kept as a trailing slash.
pub fn normalize_path(path: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    let mut directory = false;

    for segment in path.split('/') {
        directory = matches!(segment, "" | "." | "..");
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            name => segments.push(name),
        }
    }

    let mut normalized = String::with_capacity(path.len());
    for segment in &segments {
        normalized.push('/');
        normalized.push_str(segment);
    }
    if directory || segments.is_empty() {
        normalized.push('/');
    }
    Some(normalized)
}

/// Widest scope a script is allowed to control: its own directory
pub fn max_scope(script_url: &str) -> Result<String, RegistrationError> {
    let path = script_path(script_url)?;
    // script_path guarantees a leading '/'
    let dir_end = path.rfind('/').map(|idx| idx + 1).unwrap_or(1);
    normalize_path(&path[..dir_end]).ok_or_else(|| RegistrationError::InvalidScriptUrl {
        script_url: script_url.to_string(),
        reason: "script path climbs above the root".to_string(),
    })
}

/// Resolve the effective scope for a registration
pub fn resolve_scope(script_url: &str, requested: Option<&str>) -> Result<String, RegistrationError> {
    let allowed = max_scope(script_url)?;

    let Some(requested) = requested else {
        return Ok(allowed);
    };

    let scope = requested.trim();
    if scope.is_empty() {
        return Err(RegistrationError::InvalidScope {
            scope: requested.to_string(),
            reason: "scope is empty".to_string(),
        });
    }
    if !scope.starts_with('/') {
        return Err(RegistrationError::InvalidScope {
            scope: requested.to_string(),
            reason: "scope must be an absolute path".to_string(),
        });
    }
    let Some(scope) = normalize_path(scope) else {
        return Err(RegistrationError::InvalidScope {
            scope: requested.to_string(),
            reason: "scope climbs above the root".to_string(),
        });
    };
    if !scope.starts_with(&allowed) {
        return Err(RegistrationError::InvalidScope {
            scope: requested.to_string(),
            reason: format!("scope is outside the permitted path {allowed}"),
        });
    }

    Ok(scope)
}
