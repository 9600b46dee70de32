//! Session description codec filtering
//!
//! A narrow, purely syntactic rewrite of SDP text: restrict one media
//! kind's negotiable codec list to a single named codec and augment that
//! codec's format parameters. No general SDP parsing or negotiation
//! happens here; unrelated lines pass through untouched and the transform
//! is idempotent.

/// Codec restriction for one media kind
///
/// An empty `codec_name` disables filtering for that kind. `params` is an
/// ordered mapping of extra format parameters applied to the kept codec:
/// same-named existing keys are overwritten, others are left untouched,
/// new keys are appended in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecFilter {
    /// Codec name as it appears in `a=rtpmap`, matched case-insensitively
    pub codec_name: String,
    /// Extra format parameters for the kept codec
    pub params: Vec<(String, String)>,
}

impl CodecFilter {
    /// Filter keeping only `codec_name`
    pub fn new(codec_name: &str) -> Self {
        Self {
            codec_name: codec_name.to_string(),
            ..Self::default()
        }
    }

    /// Builder-style extra parameter
    #[must_use]
    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    /// Build from the boundary's string form
    ///
    /// `params` is a `"key=value;key2=value2"` list; it is ignored when
    /// `codec_name` is empty.
    pub fn from_params_str(codec_name: &str, params: &str) -> Self {
        let mut filter = Self::new(codec_name);
        if filter.is_active() {
            for segment in params.split(';') {
                let segment = segment.trim();
                if segment.is_empty() {
                    continue;
                }
                match segment.split_once('=') {
                    Some((key, value)) => filter
                        .params
                        .push((key.trim().to_string(), value.trim().to_string())),
                    None => filter.params.push((segment.to_string(), String::new())),
                }
            }
        }
        filter
    }

    /// Whether this filter modifies its media kind
    pub fn is_active(&self) -> bool {
        !self.codec_name.is_empty()
    }
}

/// Restrict `message` to the filtered codecs per media kind
///
/// For each media section whose kind has an active filter offering the
/// named codec, every other payload type is removed from the section's
/// format list together with its `a=rtpmap` / `a=fmtp` / `a=rtcp-fb`
/// lines, and the kept codec's format parameters are augmented with the
/// filter's extra parameters. Sections of other kinds, sections whose
/// filter is inactive, and sections that do not offer the named codec are
/// left unchanged. Line endings (CRLF or LF) are preserved.
pub fn force_codecs(message: &str, audio: &CodecFilter, video: &CodecFilter) -> String {
    let eol = if message.contains("\r\n") { "\r\n" } else { "\n" };
    let had_trailing_eol = message.ends_with('\n');
    let lines: Vec<&str> = message.lines().collect();

    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut index = 0;
    while index < lines.len() {
        let line = lines[index];
        if !line.starts_with("m=") {
            out.push(line.to_string());
            index += 1;
            continue;
        }

        let end = lines[index + 1..]
            .iter()
            .position(|candidate| candidate.starts_with("m="))
            .map_or(lines.len(), |offset| index + 1 + offset);
        let section = &lines[index..end];

        let kind = line[2..].split(' ').next().unwrap_or_default();
        match filter_for(kind, audio, video) {
            Some(filter) if filter.is_active() => rewrite_section(section, filter, &mut out),
            _ => out.extend(section.iter().map(|s| s.to_string())),
        }
        index = end;
    }

    let mut result = out.join(eol);
    if had_trailing_eol {
        result.push_str(eol);
    }
    result
}

fn filter_for<'a>(
    kind: &str,
    audio: &'a CodecFilter,
    video: &'a CodecFilter,
) -> Option<&'a CodecFilter> {
    match kind {
        "audio" => Some(audio),
        "video" => Some(video),
        _ => None,
    }
}

fn rewrite_section(section: &[&str], filter: &CodecFilter, out: &mut Vec<String>) {
    // Payload types whose rtpmap names the kept codec, in rtpmap order
    let mut kept: Vec<&str> = Vec::new();
    // Payload types that already carry an fmtp line
    let mut with_fmtp: Vec<&str> = Vec::new();
    for line in section {
        if let Some(rest) = line.strip_prefix("a=rtpmap:") {
            if let Some((payload_type, codec)) = parse_rtpmap(rest) {
                if codec.eq_ignore_ascii_case(&filter.codec_name) {
                    kept.push(payload_type);
                }
            }
        } else if let Some(rest) = line.strip_prefix("a=fmtp:") {
            if let Some((payload_type, _)) = rest.split_once(' ') {
                with_fmtp.push(payload_type);
            }
        }
    }

    // The section does not offer the named codec: leave it unchanged
    if kept.is_empty() {
        tracing::debug!(codec = %filter.codec_name, "codec not offered, section unchanged");
        out.extend(section.iter().map(|s| s.to_string()));
        return;
    }

    for line in section {
        if line.starts_with("m=") {
            out.push(rewrite_media_line(line, &kept));
            continue;
        }
        match attribute_payload_type(line) {
            Some(payload_type) if !kept.contains(&payload_type) => {
                // Attribute of a removed payload type
            }
            Some(payload_type) => {
                if let Some(rest) = line.strip_prefix("a=fmtp:") {
                    out.push(merge_fmtp(rest, &filter.params));
                } else {
                    out.push(line.to_string());
                    // A kept codec without any fmtp line gains one right
                    // after its rtpmap when extra parameters were supplied
                    if line.starts_with("a=rtpmap:")
                        && !filter.params.is_empty()
                        && !with_fmtp.contains(&payload_type)
                    {
                        out.push(format!(
                            "a=fmtp:{payload_type} {}",
                            render_params(
                                filter
                                    .params
                                    .iter()
                                    .map(|(k, v)| (k.clone(), Some(v.clone())))
                                    .collect()
                            )
                        ));
                    }
                }
            }
            None => out.push(line.to_string()),
        }
    }
}

// "96 opus/48000/2" -> ("96", "opus")
fn parse_rtpmap(rest: &str) -> Option<(&str, &str)> {
    let (payload_type, tail) = rest.split_once(' ')?;
    let codec = tail.split('/').next()?;
    Some((payload_type, codec))
}

// Payload type referenced by an rtpmap/fmtp/rtcp-fb attribute line; the
// "*" wildcard and unrelated lines return None and pass through.
fn attribute_payload_type(line: &str) -> Option<&str> {
    let rest = line
        .strip_prefix("a=rtpmap:")
        .or_else(|| line.strip_prefix("a=fmtp:"))
        .or_else(|| line.strip_prefix("a=rtcp-fb:"))?;
    let payload_type = rest.split(' ').next()?;
    (payload_type != "*").then_some(payload_type)
}

fn rewrite_media_line(line: &str, kept: &[&str]) -> String {
    // m=<media> <port> <proto> <fmt> <fmt> ...
    let mut tokens = line.split(' ');
    let mut rebuilt: Vec<&str> = Vec::new();
    for _ in 0..3 {
        if let Some(token) = tokens.next() {
            rebuilt.push(token);
        }
    }
    for token in tokens {
        if kept.contains(&token) {
            rebuilt.push(token);
        }
    }
    rebuilt.join(" ")
}

fn merge_fmtp(rest: &str, extra: &[(String, String)]) -> String {
    let (payload_type, existing) = match rest.split_once(' ') {
        Some((payload_type, existing)) => (payload_type, existing),
        None => (rest, ""),
    };

    let mut params: Vec<(String, Option<String>)> = existing
        .split(';')
        .filter(|segment| !segment.trim().is_empty())
        .map(|segment| {
            let segment = segment.trim();
            match segment.split_once('=') {
                Some((key, value)) => (key.to_string(), Some(value.to_string())),
                None => (segment.to_string(), None),
            }
        })
        .collect();

    for (key, value) in extra {
        match params.iter_mut().find(|(existing_key, _)| existing_key == key) {
            Some(entry) => entry.1 = Some(value.clone()),
            None => params.push((key.clone(), Some(value.clone()))),
        }
    }

    format!("a=fmtp:{payload_type} {}", render_params(params))
}

fn render_params(params: Vec<(String, Option<String>)>) -> String {
    params
        .into_iter()
        .map(|(key, value)| match value {
            Some(value) => format!("{key}={value}"),
            None => key,
        })
        .collect::<Vec<_>>()
        .join(";")
}
