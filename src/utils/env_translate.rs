/// Environment translation for the child process
///
/// Rewrites the path-valued variables of the inherited environment into the
/// target path-list convention and serializes everything into a
/// double-NUL-terminated block, the layout the target process-creation
/// primitive consumes.
use crate::config::types::ConversionError;
use crate::utils::path_convert::PathConverter;
use std::borrow::Cow;
use std::ffi::OsString;

/// Variables whose values are path lists. Matched case-sensitively at the
/// start of the entry, `=` included.
pub const TRANSLATED_VARIABLES: [&str; 5] = ["HOME=", "LD_LIBRARY_PATH=", "PATH=", "TMP=", "TEMP="];

/// Serialized environment: `NAME=VALUE\0...NAME=VALUE\0\0`.
///
/// `std::process::Command` builds the block it hands to process creation
/// itself, so the supervisor decodes this one with [`EnvBlock::pairs`]. The
/// bytes here are the translated environment, not the buffer the OS reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvBlock {
    bytes: Vec<u8>,
}

impl EnvBlock {
    /// Exact size of a block holding `entries`.
    fn required_len(entries: &[Cow<'_, [u8]>]) -> usize {
        let body: usize = entries.iter().map(|e| e.len() + 1).sum();
        // an empty block still needs both terminators
        body + if entries.is_empty() { 2 } else { 1 }
    }

    fn from_entries(entries: &[Cow<'_, [u8]>]) -> Self {
        let len = Self::required_len(entries);
        let mut bytes = Vec::with_capacity(len);
        for entry in entries {
            bytes.extend_from_slice(entry);
            bytes.push(0);
        }
        if entries.is_empty() {
            bytes.push(0);
        }
        bytes.push(0);
        debug_assert_eq!(bytes.len(), len);
        EnvBlock { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the block holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// The `NAME=VALUE` entries, without terminators.
    pub fn entries(&self) -> impl Iterator<Item = &[u8]> {
        let body = &self.bytes[..self.bytes.len() - 1];
        body.split(|b| *b == 0).filter(|e| !e.is_empty())
    }

    /// Decode entries into name/value pairs for `Command::envs`.
    ///
    /// A leading `=` belongs to the name (Win32 drive-cwd variables such as
    /// `=C:`). Entries without a separator have no name/value form and are
    /// skipped.
    pub fn pairs(&self) -> Vec<(OsString, OsString)> {
        let mut pairs = Vec::new();
        for entry in self.entries() {
            let split = entry
                .iter()
                .skip(1)
                .position(|b| *b == b'=')
                .map(|pos| pos + 1);
            match split {
                Some(pos) => pairs.push((bytes_to_os(&entry[..pos]), bytes_to_os(&entry[pos + 1..]))),
                None => log::debug!(
                    "Skipping environment entry without '=': {}",
                    String::from_utf8_lossy(entry)
                ),
            }
        }
        pairs
    }
}

#[cfg(unix)]
fn bytes_to_os(bytes: &[u8]) -> OsString {
    use std::os::unix::ffi::OsStringExt;
    OsString::from_vec(bytes.to_vec())
}

#[cfg(not(unix))]
fn bytes_to_os(bytes: &[u8]) -> OsString {
    OsString::from(String::from_utf8_lossy(bytes).into_owned())
}

/// Snapshot the launcher's environment as raw `NAME=VALUE` entries, in order.
pub fn inherited_environment() -> Vec<Vec<u8>> {
    std::env::vars_os()
        .map(|(name, value)| {
            let mut entry = os_to_bytes(name);
            entry.push(b'=');
            entry.extend(os_to_bytes(value));
            entry
        })
        .collect()
}

#[cfg(unix)]
fn os_to_bytes(value: OsString) -> Vec<u8> {
    use std::os::unix::ffi::OsStringExt;
    value.into_vec()
}

#[cfg(not(unix))]
fn os_to_bytes(value: OsString) -> Vec<u8> {
    value.to_string_lossy().into_owned().into_bytes()
}

fn recognized_prefix(entry: &[u8]) -> Option<&'static str> {
    TRANSLATED_VARIABLES
        .iter()
        .copied()
        .find(|prefix| entry.starts_with(prefix.as_bytes()))
}

/// Translate `entries` into a block for the child.
///
/// Unrecognized entries are copied byte for byte. Any conversion failure
/// aborts the whole translation.
pub fn translate_environment(
    entries: &[Vec<u8>],
    converter: &PathConverter,
) -> Result<EnvBlock, ConversionError> {
    let mut translated: Vec<Cow<'_, [u8]>> = Vec::with_capacity(entries.len());

    for entry in entries {
        let Some(prefix) = recognized_prefix(entry) else {
            translated.push(Cow::Borrowed(entry.as_slice()));
            continue;
        };

        let name = &prefix[..prefix.len() - 1];
        let value = std::str::from_utf8(&entry[prefix.len()..]).map_err(|_| {
            ConversionError::NotUnicode {
                variable: name.to_string(),
            }
        })?;

        let converted = converter.convert_list(name, value)?;
        log::debug!("Translated {}: '{}' -> '{}'", name, value, converted);

        let mut rewritten = Vec::with_capacity(prefix.len() + converted.len());
        rewritten.extend_from_slice(prefix.as_bytes());
        rewritten.extend_from_slice(converted.as_bytes());
        translated.push(Cow::Owned(rewritten));
    }

    Ok(EnvBlock::from_entries(&translated))
}
