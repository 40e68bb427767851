use std::path::Path;

/// Resolve the `ADB_PATH` override into the program to invoke. Shell profiles
/// and env files often leave the value quoted; one wrapping layer is
/// stripped. Empty or whitespace-only means "use whatever `adb` is on PATH".
pub fn resolve_adb_program(configured: &str) -> String {
    let mut value = configured.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|candidate| candidate.strip_suffix(quote))
        {
            value = inner.trim();
        }
    }
    if value.is_empty() {
        "adb".to_string()
    } else {
        value.to_string()
    }
}

/// Startup sanity check for an explicit path override. A bare `adb` is left
/// to PATH lookup at spawn time; a broken override is reported up front
/// instead of on the first device action.
pub fn validate_adb_program(program: &str) -> Result<(), String> {
    if program == "adb" {
        return Ok(());
    }
    let path = Path::new(program);
    if path.is_dir() {
        return Err(format!("{program} is a directory, not the adb executable"));
    }
    if !path.exists() {
        return Err(format!("adb not found at {program}"));
    }
    Ok(())
}
