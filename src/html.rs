//! HTML serialisation of the on-screen invoice.
//!
//! The interactive tree becomes plain markup: boxes as `div`/`span` with
//! their class tokens, fields as `<input>` named after their binding. The
//! page carries its own stylesheet generated from the style table, so the
//! output is a single self-contained file.

use std::fmt;

use crate::primitives::{TextInput, UiNode};

/// Page-level rules the style table does not cover.
const BASE_STYLES: &str = "body{margin:0;padding:24px;background:#f2f2f2;font-family:Helvetica,Arial,sans-serif;}\
h1{font-size:20px;color:#222222;margin:0 0 16px;}\
.page{background:#ffffff;max-width:700px;padding:40px;margin:0 auto;box-shadow:0 0 12px rgba(0,0,0,0.08);}\
input{font:inherit;color:inherit;background:transparent;border:1px dashed transparent;box-sizing:border-box;}\
input:hover,input:focus{border-color:#cccccc;outline:none;}\
input[readonly]{border-color:transparent;}\
.download-pdf{display:inline-block;margin:16px 0;color:#222222;}\
.download-pdf.loading{color:#999999;}";

/// The download control beneath the form.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadControl {
    /// A link carrying the generated PDF.
    Link { file_name: String, href: String },
    /// Placeholder while the trigger is suppressed.
    Loading,
}

/// Markup for an interactive subtree.
pub struct UiHtml<'a>(pub &'a UiNode);

impl fmt::Display for UiHtml<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            UiNode::Element {
                tag,
                classes,
                children,
            } => {
                write!(f, "<{} class=\"{}\">", tag.as_str(), escape_html(classes))?;
                for child in children {
                    write!(f, "{}", UiHtml(child))?;
                }
                write!(f, "</{}>", tag.as_str())
            }
            UiNode::Input(input) => write_input(f, input),
            UiNode::Image {
                classes,
                src,
                width,
            } => write!(
                f,
                "<img class=\"{}\" src=\"{}\" style=\"width:{width}px\" alt=\"logo\">",
                escape_html(classes),
                escape_html(src)
            ),
            UiNode::Text(text) => f.write_str(&escape_html(text)),
        }
    }
}

fn write_input(f: &mut fmt::Formatter<'_>, input: &TextInput) -> fmt::Result {
    write!(
        f,
        "<input type=\"text\" class=\"{}\" value=\"{}\"",
        escape_html(&input.classes),
        escape_html(&input.value)
    )?;
    if !input.placeholder.is_empty() {
        write!(f, " placeholder=\"{}\"", escape_html(&input.placeholder))?;
    }
    match input.on_change {
        Some(binding) => write!(f, " name=\"{binding}\">"),
        None => f.write_str(" readonly>"),
    }
}

/// A complete HTML document: heading, form and download control.
pub struct HtmlPage<'a> {
    pub heading: &'a str,
    /// Rules generated from the style table.
    pub css: &'a str,
    pub view: &'a UiNode,
    pub control: DownloadControl,
}

impl fmt::Display for HtmlPage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heading = escape_html(self.heading);
        writeln!(f, "<!DOCTYPE html>")?;
        writeln!(f, "<html lang=\"en\">")?;
        writeln!(f, "<head>")?;
        writeln!(f, "<meta charset=\"utf-8\">")?;
        writeln!(f, "<title>{heading}</title>")?;
        writeln!(f, "<style>{BASE_STYLES}\n{}</style>", self.css)?;
        writeln!(f, "</head>")?;
        writeln!(f, "<body>")?;
        writeln!(f, "<h1>{heading}</h1>")?;
        writeln!(f, "{}", UiHtml(self.view))?;
        match &self.control {
            DownloadControl::Link { file_name, href } => writeln!(
                f,
                "<div class=\"download-pdf\" title=\"Save PDF\"><a href=\"{}\" download=\"{}\" aria-label=\"Save PDF\">Download PDF</a></div>",
                escape_html(href),
                escape_html(file_name)
            )?,
            DownloadControl::Loading => {
                writeln!(f, "<div class=\"download-pdf loading\" title=\"Save PDF\"></div>")?
            }
        }
        writeln!(f, "</body>")?;
        write!(f, "</html>")
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
