use crate::wire::SiteArtifact;

const HEAD: &str = "<!DOCTYPE html>\n<html lang=\"en\">\n  <head>\n    <meta charset=\"utf-8\">\n    <style>";
const STYLE_END: &str = "</style>\n  </head>\n  <body>\n";
const SCRIPT_START: &str = "\n    <script>";
const TAIL: &str = "</script>\n  </body>\n</html>\n";

/// Inline the stylesheet and script around the body markup, producing one
/// self-contained document for the preview frame and for export.
pub fn compose(artifact: &SiteArtifact) -> String {
    let mut doc = String::with_capacity(
        HEAD.len() + STYLE_END.len() + SCRIPT_START.len() + TAIL.len()
            + artifact.html.len() + artifact.css.len() + artifact.js.len(),
    );
    doc.push_str(HEAD);
    doc.push_str(&artifact.css);
    doc.push_str(STYLE_END);
    doc.push_str(&artifact.html);
    doc.push_str(SCRIPT_START);
    doc.push_str(&artifact.js);
    doc.push_str(TAIL);
    doc
}

/// Recover the three segments of a document produced by [`compose`].
///
/// Returns `None` when the wrapper markers are missing. The segments come back
/// exactly as composed when the css does not contain the style terminator
/// (`</style>` followed by the `</head>` and `<body>` lines) and the js does not
/// contain the script opener (a newline, four spaces, `<script>`). Otherwise
/// the split lands in the wrong place, though composing the result still
/// reproduces `document`.
pub fn extract(document: &str) -> Option<SiteArtifact> {
    let rest = document.strip_prefix(HEAD)?;
    let (css, rest) = rest.split_once(STYLE_END)?;
    let rest = rest.strip_suffix(TAIL)?;
    let (html, js) = rest.rsplit_once(SCRIPT_START)?;
    Some(SiteArtifact { html: html.to_string(), css: css.to_string(), js: js.to_string() })
}

/// Error panel shown in place of the preview when generation fails.
pub fn error_panel(message: &str) -> SiteArtifact {
    SiteArtifact {
        html: format!(
            "<div class=\"error-container\"><h2>An error occurred</h2><p>{}</p></div>",
            escape_html(message)
        ),
        css: ".error-container{font-family:sans-serif;color:#b91c1c;padding:2rem;text-align:center}"
            .to_string(),
        js: String::new(),
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
