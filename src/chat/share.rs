//! Share links for a response.

use std::fmt::Write as _;

/// A named share target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub name: &'static str,
    pub url: String,
}

/// Build share links for `text` found at `page_url`.
pub fn share_links(text: &str, page_url: &str) -> Vec<ShareLink> {
    let text = urlencoding::encode(text);
    let url = urlencoding::encode(page_url);

    vec![
        ShareLink {
            name: "Twitter",
            url: format!("https://twitter.com/intent/tweet?text={text}&url={url}"),
        },
        ShareLink {
            name: "Facebook",
            url: format!("https://www.facebook.com/sharer/sharer.php?u={url}"),
        },
        ShareLink {
            name: "LinkedIn",
            url: format!("https://www.linkedin.com/shareArticle?mini=true&url={url}&title={text}"),
        },
        ShareLink {
            name: "WhatsApp",
            url: format!("https://api.whatsapp.com/send?text={text}%20{url}"),
        },
        ShareLink {
            name: "Telegram",
            url: format!("https://t.me/share/url?url={url}&text={text}"),
        },
        ShareLink {
            name: "Email",
            url: format!("mailto:?subject=Shared%20Message&body={text}%20{url}"),
        },
    ]
}

/// Render links as a plain text block.
pub fn format_share_links(links: &[ShareLink]) -> String {
    let mut out = String::from("Share this message on:\n\n");
    for link in links {
        let _ = writeln!(out, "{}: {}", link.name, link.url);
    }
    out
}
