use eyre::{Result, eyre};

use crate::ari::Ari;
use crate::models::VerseDataSnapshot;
use crate::settings::Settings;

/// Strip inline formatting codes from a verse text.
///
/// Formatted verses start with "@@" and carry '@'-prefixed codes: '@0'..'@4'
/// and '@^' paragraph starts, '@6'/'@5' red text, '@9'/'@7' italic, '@8'
/// blank line, '@<'/'@>'/'@/' inline markers. Unformatted text passes
/// through unchanged.
pub fn remove_special_codes(text: &str) -> String {
    let Some(body) = text.strip_prefix("@@") else {
        return text.to_string();
    };

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '@' {
            out.push(c);
            continue;
        }
        match chars.next() {
            // paragraph starts collapse to a single separating space
            Some('0'..='4') | Some('^') => {
                if !out.is_empty() && !out.ends_with([' ', '\n']) {
                    out.push(' ');
                }
            }
            Some('8') => out.push('\n'),
            // formatting toggles and inline markers carry no text
            Some('5') | Some('6') | Some('7') | Some('9') | Some('<') | Some('>') | Some('/') => {}
            Some(other) => out.push(other),
            None => {}
        }
    }
    out.trim().to_string()
}

/// Build the plain text for copying or sharing a verse selection.
///
/// Returns the clipboard text and the bare verse text submitted to the
/// share-URL service.
pub fn prepare_text_for_copy_share(
    reference: &str,
    version_short_name: Option<&str>,
    snapshot: &VerseDataSnapshot,
    selected_verses_1: &[i32],
    settings: &Settings,
) -> (String, String) {
    let mut res0 = String::new();
    let mut res1 = String::new();

    res0.push_str(reference);

    if settings.copy_with_version_name {
        if let Some(short_name) = version_short_name {
            res0.push_str(" (");
            res0.push_str(short_name);
            res0.push(')');
        }
    }

    if settings.copy_with_verse_numbers && selected_verses_1.len() > 1 {
        res0.push('\n');
        for &verse_1 in selected_verses_1 {
            if let Some(text) = snapshot.verse_text(verse_1) {
                let plain = remove_special_codes(text);
                res0.push_str(&format!("{} {}\n", verse_1, plain));
                res1.push_str(&format!("{} {}\n", verse_1, plain));
            }
        }
    } else {
        let joined = selected_verses_1
            .iter()
            .filter_map(|&verse_1| snapshot.verse_text(verse_1))
            .map(remove_special_codes)
            .collect::<Vec<_>>()
            .join(" ");
        res0.push(' ');
        res0.push_str(&joined);
        res1 = joined;
    }

    (res0, res1)
}

/// Append the split version's rendition of the same selection to an
/// already-assembled copy text.
pub fn append_split_text_for_copy_share(
    copy_text: &mut String,
    reference: &str,
    version_short_name: Option<&str>,
    split_snapshot: &VerseDataSnapshot,
    selected_verses_1: &[i32],
    settings: &Settings,
) {
    let (split_text, _) = prepare_text_for_copy_share(
        reference,
        version_short_name,
        split_snapshot,
        selected_verses_1,
        settings,
    );
    copy_text.push_str("\n\n");
    copy_text.push_str(&split_text);
}

pub struct ShareUrlRequest<'a> {
    pub verse_text: &'a str,
    pub ari_bc: Ari,
    pub selected_verses_1: &'a [i32],
    pub reference: &'a str,
    pub version_short_name: Option<&'a str>,
    pub version_long_name: Option<&'a str>,
}

/// Comma-joined full aris of the selection, the wire form the share service
/// expects.
pub fn joined_aris(ari_bc: Ari, selected_verses_1: &[i32]) -> String {
    selected_verses_1
        .iter()
        .map(|&verse_1| Ari::encode_with_bc(ari_bc, verse_1 as u8).0.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// POST the selection to the share-URL service and return the short URL.
/// Failures here are reported to the user but never affect reading state.
pub fn make_share_url(endpoint: &str, request: &ShareUrlRequest) -> Result<String> {
    let aris = joined_aris(request.ari_bc, request.selected_verses_1);

    let mut form: Vec<(&str, String)> = vec![
        ("verseText", request.verse_text.to_string()),
        ("aris", aris),
        ("verseReferences", request.reference.to_string()),
    ];
    if let Some(long_name) = request.version_long_name {
        form.push(("versionLongName", long_name.to_string()));
    }
    if let Some(short_name) = request.version_short_name {
        form.push(("versionShortName", short_name.to_string()));
    }

    let response = reqwest::blocking::Client::new()
        .post(endpoint)
        .form(&form)
        .send()?
        .error_for_status()?;

    let body: serde_json::Value = response.json()?;
    body.get("share_url")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| eyre!("share url missing from service response"))
}
