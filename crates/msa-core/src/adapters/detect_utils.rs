use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Locates `binary_name`: explicit paths are checked as-is, bare names are
/// searched in `extra_paths`, then `PATH`, then common install roots.
pub(crate) fn which_executable(binary_name: &str, extra_paths: &[PathBuf]) -> Option<PathBuf> {
    if binary_name.trim().is_empty() {
        return None;
    }

    if binary_name.contains('/') {
        let explicit = PathBuf::from(binary_name);
        return is_executable_file(&explicit).then_some(explicit);
    }

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for extra in extra_paths {
        push_candidate_path(extra.join(binary_name), &mut candidates, &mut seen);
    }

    if let Some(path_var) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&path_var) {
            push_candidate_path(dir.join(binary_name), &mut candidates, &mut seen);
        }
    }

    for dir in additional_bin_roots() {
        push_candidate_path(dir.join(binary_name), &mut candidates, &mut seen);
    }

    candidates
        .into_iter()
        .find(|candidate| is_executable_file(candidate))
}

fn push_candidate_path(
    candidate: PathBuf,
    candidates: &mut Vec<PathBuf>,
    seen: &mut HashSet<String>,
) {
    let rendered = candidate.to_string_lossy().to_string();
    if rendered.is_empty() {
        return;
    }

    if seen.insert(rendered) {
        candidates.push(candidate);
    }
}

fn additional_bin_roots() -> Vec<PathBuf> {
    let mut roots = vec![
        PathBuf::from("/usr/local/bin"),
        PathBuf::from("/usr/bin"),
        PathBuf::from("/bin"),
        PathBuf::from("/opt/homebrew/bin"),
        PathBuf::from("/opt/conda/bin"),
    ];

    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        roots.push(home.join(".local/bin"));
        roots.push(home.join("miniconda3/bin"));
        roots.push(home.join("bin"));
    }

    roots
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}
