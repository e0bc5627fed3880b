/// Returns the index of the first occurrence of `needle` in `haystack`.
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits `haystack` on every occurrence of `needle`.
fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut result = Vec::new();
    let mut start = 0;
    while let Some(pos) = find_subsequence(&haystack[start..], needle) {
        result.push(&haystack[start..start + pos]);
        start += pos + needle.len();
    }
    result.push(&haystack[start..]);
    result
}

/// Extracts the boundary token from a Content-Type header value like
/// `multipart/form-data; boundary=----WebKitFormBoundaryXXX`.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .map(|s| s.trim())
        .find_map(|s| s.strip_prefix("boundary="))
        .map(|s| s.trim_matches('"').to_owned())
        .filter(|s| !s.is_empty())
}

/// One part of a multipart body: its raw header block and payload.
struct Part<'a> {
    headers: String,
    data: &'a [u8],
}

fn parts<'a>(body: &'a [u8], boundary: &str) -> Vec<Part<'a>> {
    let delimiter = format!("--{}", boundary);
    split_on(body, delimiter.as_bytes())
        .into_iter()
        .filter_map(|part| {
            let sep = b"\r\n\r\n";
            let sep_pos = find_subsequence(part, sep)?;
            let raw = &part[sep_pos + sep.len()..];
            Some(Part {
                headers: String::from_utf8_lossy(&part[..sep_pos]).into_owned(),
                data: raw.strip_suffix(b"\r\n").unwrap_or(raw),
            })
        })
        .collect()
}

/// Raw bytes of the uploaded file in a multipart/form-data body.
///
/// A file part named `field_name` wins; otherwise the first file part is
/// returned. Empty uploads count as missing.
pub fn extract_file(body: &[u8], boundary: &str, field_name: &str) -> Option<Vec<u8>> {
    let files: Vec<Part> = parts(body, boundary)
        .into_iter()
        .filter(|p| p.headers.contains("filename=") && !p.data.is_empty())
        .collect();
    let named = format!("name=\"{}\"", field_name);
    files.iter()
        .find(|p| p.headers.contains(&named))
        .or_else(|| files.first())
        .map(|p| p.data.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut out = Vec::new();
        for (name, filename, data) in parts {
            out.extend_from_slice(b"--XyZ\r\n");
            let disposition = match filename {
                Some(f) => format!("Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n", name, f),
                None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", name),
            };
            out.extend_from_slice(disposition.as_bytes());
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(data);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"--XyZ--\r\n");
        out
    }

    #[test]
    fn boundary_is_parsed() {
        assert_eq!(extract_boundary("multipart/form-data; boundary=XyZ").as_deref(), Some("XyZ"));
        assert_eq!(extract_boundary("multipart/form-data; boundary=\"a b\"").as_deref(), Some("a b"));
        assert_eq!(extract_boundary("multipart/form-data"), None);
    }

    #[test]
    fn named_file_wins_over_first() {
        let b = body(&[
            ("note", None, b"hello"),
            ("other", Some("a.png"), b"\x89PNGother"),
            ("image", Some("qr.png"), b"\x89PNG\r\n\x1a\nqr"),
        ]);
        assert_eq!(extract_file(&b, "XyZ", "image").unwrap(), b"\x89PNG\r\n\x1a\nqr".to_vec());
    }

    #[test]
    fn falls_back_to_first_file() {
        let b = body(&[("upload", Some("qr.png"), b"bytes")]);
        assert_eq!(extract_file(&b, "XyZ", "image").unwrap(), b"bytes".to_vec());
    }

    #[test]
    fn text_fields_and_empty_files_are_not_uploads() {
        let b = body(&[("image", None, b"text"), ("image", Some("x.png"), b"")]);
        assert_eq!(extract_file(&b, "XyZ", "image"), None);
    }
}
