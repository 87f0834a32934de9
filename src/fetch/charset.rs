use encoding_rs::GBK;

/// How far into the decoded document the meta-charset sniff looks.
const META_SNIFF_WINDOW: usize = 1024;

/// Decode a raw HTML body to a `String`.
///
/// 1. A `gb*` charset label in the Content-Type header wins outright (GBK
///    supersets GB2312, so one decoder covers both labels).
/// 2. Otherwise try strict UTF-8; when it succeeds but the document head
///    declares a `gb*` charset in a meta tag, redecode as GBK. CJK sites
///    routinely serve legacy bytes without a charset header.
/// 3. Strict UTF-8 failure falls back to GBK.
pub fn decode_html(bytes: &[u8], content_type: Option<&str>) -> String {
    if let Some(label) = header_charset(content_type) {
        if label.starts_with("gb") {
            return decode_gbk(bytes);
        }
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => {
            if head_declares_gb_charset(text) {
                decode_gbk(bytes)
            } else {
                text.to_string()
            }
        }
        Err(_) => decode_gbk(bytes),
    }
}

fn decode_gbk(bytes: &[u8]) -> String {
    let (decoded, _, _) = GBK.decode(bytes);
    decoded.into_owned()
}

/// Lower-cased charset label from a Content-Type header, if any.
fn header_charset(content_type: Option<&str>) -> Option<String> {
    let header = content_type?.to_ascii_lowercase();
    let idx = header.find("charset=")?;
    let label = header[idx + "charset=".len()..]
        .trim_start_matches(['"', '\''])
        .split([';', '"', '\'', ' '])
        .next()?
        .trim();
    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}

/// Meta-tag sniff over the first KiB of already-decoded text. Matches
/// `charset=gb...` quoted or bare, which covers both the HTML5 form
/// (`<meta charset="gb2312">`) and the legacy http-equiv form.
fn head_declares_gb_charset(text: &str) -> bool {
    let mut end = META_SNIFF_WINDOW.min(text.len());
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    let head = text[..end].to_ascii_lowercase();
    head.contains("charset=gb") || head.contains("charset=\"gb") || head.contains("charset='gb")
}
