/// POSIX to Win32 path-list conversion
///
/// POSIX lists are `:`-separated and `/`-rooted. Win32 lists are
/// `;`-separated with drive-letter roots. Conversion is purely lexical and
/// driven by the configured mount table; the filesystem is never consulted.
use crate::config::types::ConversionError;
use crate::config::BridgeConfig;

const POSIX_LIST_SEPARATOR: char = ':';
const NATIVE_LIST_SEPARATOR: &str = ";";
const NATIVE_SEPARATOR: &str = "\\";

/// Split an absolute or relative POSIX path into normalized components.
/// `.` and empty components are dropped; `..` pops lexically and stops at `/`.
fn components(path: &str) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn join_native(base: &str, rest: &[&str]) -> String {
    let base = base.replace('/', NATIVE_SEPARATOR);
    let base = base.trim_end_matches('\\');
    let rest_len: usize = rest.iter().map(|c| c.len() + 1).sum();
    let mut out = String::with_capacity(base.len() + rest_len + 1);
    out.push_str(base);
    if rest.is_empty() {
        // bare drive designator needs its root separator
        if out.ends_with(':') {
            out.push_str(NATIVE_SEPARATOR);
        }
        return out;
    }
    for component in rest {
        out.push_str(NATIVE_SEPARATOR);
        out.push_str(component);
    }
    out
}

struct Mount {
    components: Vec<String>,
    native: String,
}

/// Converts path lists from the launching environment's convention to the target's.
pub struct PathConverter {
    root: Option<String>,
    cygdrive: Vec<String>,
    /// Longest mount point first.
    mounts: Vec<Mount>,
}

impl PathConverter {
    pub fn new(config: &BridgeConfig) -> Self {
        let mut mounts: Vec<Mount> = config
            .mounts
            .iter()
            .map(|m| Mount {
                components: components(&m.posix).into_iter().map(str::to_string).collect(),
                native: m.native.clone(),
            })
            .collect();
        mounts.sort_by(|a, b| b.components.len().cmp(&a.components.len()));

        PathConverter {
            root: config.root.clone(),
            cygdrive: components(&config.cygdrive_prefix)
                .into_iter()
                .map(str::to_string)
                .collect(),
            mounts,
        }
    }

    /// Convert a `:`-separated list. Entry count and order are preserved,
    /// including empty entries.
    pub fn convert_list(&self, variable: &str, value: &str) -> Result<String, ConversionError> {
        let converted = value
            .split(POSIX_LIST_SEPARATOR)
            .map(|entry| self.convert_path(variable, entry))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(converted.join(NATIVE_LIST_SEPARATOR))
    }

    /// Convert a single path.
    pub fn convert_path(&self, variable: &str, path: &str) -> Result<String, ConversionError> {
        if path.is_empty() {
            return Ok(String::new());
        }
        if !path.starts_with('/') {
            return Ok(path.replace('/', NATIVE_SEPARATOR));
        }

        let parts = components(path);

        if let Some(drive) = self.drive_letter(&parts) {
            let drive_root = format!("{}:", drive.to_ascii_uppercase());
            return Ok(join_native(&drive_root, &parts[self.cygdrive.len() + 1..]));
        }

        if let Some(mount) = self
            .mounts
            .iter()
            .find(|m| starts_with(&parts, &m.components))
        {
            return Ok(join_native(&mount.native, &parts[mount.components.len()..]));
        }

        match &self.root {
            Some(root) => Ok(join_native(root, &parts)),
            None => Err(ConversionError::Unmapped {
                variable: variable.to_string(),
                path: path.to_string(),
            }),
        }
    }

    fn drive_letter(&self, parts: &[&str]) -> Option<char> {
        if !starts_with(parts, &self.cygdrive) {
            return None;
        }
        let candidate = parts.get(self.cygdrive.len())?;
        let mut chars = candidate.chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) if letter.is_ascii_alphabetic() => Some(letter),
            _ => None,
        }
    }
}

fn starts_with(parts: &[&str], prefix: &[String]) -> bool {
    parts.len() >= prefix.len() && parts.iter().zip(prefix).all(|(a, b)| *a == b.as_str())
}
