//! SSH2 public key file format.
//!
//! ref: https://www.rfc-editor.org/rfc/rfc4716

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::error::{Error, Result};
use crate::wire::PublicKeyBlob;

pub const BEGIN: &str = "---- BEGIN SSH2 PUBLIC KEY ----";
pub const END: &str = "---- END SSH2 PUBLIC KEY ----";

pub const HEADER_WIDTH: usize = 71;
pub const CONTENT_WIDTH: usize = 72;

const COMMENT_TAG: &str = "Comment";

/// Splits on characters, never inside a multi-byte one.
pub(crate) fn chunks(text: &str, width: usize) -> Vec<String> {
    text.chars()
        .collect::<Vec<_>>()
        .chunks(width)
        .map(String::from_iter)
        .collect()
}

/// Header text in `HEADER_WIDTH` chunks; all but the last chunk end with a
/// backslash continuation.
pub fn wrap_header(header: &str) -> String {
    chunks(header, HEADER_WIDTH).join("\\\n")
}

/// Base64 body in `CONTENT_WIDTH` lines.
pub fn wrap_content(content: &str) -> String {
    chunks(content, CONTENT_WIDTH).join("\n")
}

pub fn is_ssh2(text: &str) -> bool {
    text.lines().any(|line| line.trim() == BEGIN)
}

pub fn encode(blob: &PublicKeyBlob, comment: &str) -> String {
    let header = format!("{COMMENT_TAG}: \"{comment}\"");
    format!(
        "{BEGIN}\n{}\n{}\n{END}\n",
        wrap_header(&header),
        wrap_content(&STANDARD.encode(blob.to_bytes()))
    )
}

pub fn decode(text: &str) -> Result<(PublicKeyBlob, String)> {
    let mut lines = text
        .lines()
        .map(str::trim_end)
        .skip_while(|line| line.trim() != BEGIN);
    if lines.next().is_none() {
        return Err(Error::InvalidSsh2("missing begin marker".to_string()));
    }

    let mut comment = String::new();
    let mut body = String::new();
    let mut pending_header: Option<String> = None;
    let mut terminated = false;
    for line in lines {
        if line.trim() == END {
            terminated = true;
            break;
        }
        if let Some(mut header) = pending_header.take() {
            match line.strip_suffix('\\') {
                Some(part) => {
                    header.push_str(part);
                    pending_header = Some(header);
                }
                None => {
                    header.push_str(line);
                    take_comment(&header, &mut comment);
                }
            }
            continue;
        }
        if body.is_empty() && line.contains(':') {
            match line.strip_suffix('\\') {
                Some(part) => pending_header = Some(part.to_string()),
                None => take_comment(line, &mut comment),
            }
            continue;
        }
        body.push_str(line.trim());
    }

    if !terminated {
        return Err(Error::InvalidSsh2("missing end marker".to_string()));
    }
    if body.is_empty() {
        return Err(Error::InvalidSsh2("missing key data".to_string()));
    }
    let raw = STANDARD.decode(&body).map_err(Error::Base64Decode)?;
    Ok((PublicKeyBlob::from_bytes(&raw)?, comment))
}

fn take_comment(header: &str, comment: &mut String) {
    if let Some((tag, value)) = header.split_once(':') {
        if tag.trim().eq_ignore_ascii_case(COMMENT_TAG) {
            let value = value.trim();
            *comment = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value)
                .to_string();
        }
    }
}
