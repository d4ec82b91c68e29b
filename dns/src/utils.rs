use crate::constants::{MAX_LABEL_LENGTH, MAX_NAME_LENGTH};
use crate::error::{Error, Result};

fn is_legal(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '.'
}

// 去掉结尾的 '.'，"test.com." 和 "test.com" 是同一个域名
pub fn normalize_name(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// Checks the charset, label lengths and total length of a dotted name.
///
/// The empty name is the root and is always valid.
pub fn validate_name(name: &str) -> Result<()> {
    if !name.chars().all(is_legal) {
        return Err(Error::IllegalCharacters(name.escape_default().to_string()));
    }

    let name = normalize_name(name);
    if name.len() > MAX_NAME_LENGTH {
        return Err(Error::NameTooLong);
    }
    if name.is_empty() {
        return Ok(());
    }

    for label in name.split('.') {
        if label.is_empty() || label.len() > MAX_LABEL_LENGTH {
            return Err(Error::BadLabelLength);
        }
    }

    Ok(())
}
