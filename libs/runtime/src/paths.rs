use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// Platform user home: `%APPDATA%` on Windows, `$HOME` elsewhere.
fn platform_home() -> Result<PathBuf> {
    #[cfg(target_os = "windows")]
    let var = "APPDATA";
    #[cfg(not(target_os = "windows"))]
    let var = "HOME";

    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("{var} is not set; cannot resolve home directory"))
}

/// Expand a leading `~` against the platform home.
fn expand_tilde(raw: &str) -> Result<PathBuf> {
    if raw == "~" {
        return platform_home();
    }
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        return Ok(platform_home()?.join(rest));
    }
    Ok(PathBuf::from(raw))
}

/// Resolve the server home directory into an absolute path.
///
/// - `None` → `<platform home>/<default_subdir>`
/// - `Some("~/x")` → `<platform home>/x`
/// - relative paths are anchored at the current working directory
///
/// When `create` is set the directory is created if missing.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let mut path = match configured {
        Some(raw) => expand_tilde(raw.trim())?,
        None => platform_home()?.join(default_subdir),
    };

    if path.is_relative() {
        let cwd = std::env::current_dir().context("cannot read current directory")?;
        path = cwd.join(path);
    }

    if create {
        std::fs::create_dir_all(&path)
            .with_context(|| format!("cannot create home dir {}", path.display()))?;
    }

    Ok(path)
}

/// Resolve `file` against `base_dir` unless it is already absolute.
pub fn resolve_under(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absolute_path_is_kept_and_created() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("nested/home");

        let resolved =
            resolve_home_dir(Some(target.to_string_lossy().to_string()), ".x", true).unwrap();

        assert_eq!(resolved, target);
        assert!(resolved.is_dir());
    }

    #[test]
    fn resolve_under_joins_relative_only() {
        let base = Path::new("/srv/app");
        assert_eq!(resolve_under("logs/a.log", base), base.join("logs/a.log"));

        let abs = std::env::temp_dir().join("b.log");
        let abs_str = abs.to_string_lossy().to_string();
        assert_eq!(resolve_under(&abs_str, base), abs);
    }
}
