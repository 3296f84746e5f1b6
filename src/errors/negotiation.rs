//! Accept header negotiation for error bodies.

/// Media type the client ranks highest.
///
/// Ties on the q-value keep the order the client listed them in. A media
/// range with `q=0` is never preferred.
pub fn preferred_media_type(accept: &str) -> Option<String> {
    let mut best: Option<(f32, &str)> = None;

    for part in accept.split(',') {
        let mut pieces = part.split(';');
        let media = pieces.next().unwrap_or("").trim();
        if media.is_empty() {
            continue;
        }
        let quality = pieces
            .filter_map(|p| p.trim().strip_prefix("q="))
            .find_map(|q| q.trim().parse::<f32>().ok())
            .unwrap_or(1.0);

        match best {
            Some((current, _)) if current >= quality => {}
            _ => best = Some((quality, media)),
        }
    }

    best.filter(|(quality, _)| *quality > 0.0)
        .map(|(_, media)| media.to_ascii_lowercase())
}

/// True when the client would rather read HTML or plain text than JSON.
pub fn prefers_markup(accept: Option<&str>) -> bool {
    accept
        .and_then(preferred_media_type)
        .map(|media| {
            matches!(
                media.as_str(),
                "text/html" | "text/plain" | "application/xhtml+xml" | "text/*"
            )
        })
        .unwrap_or(false)
}
