//! Integration tests for the invoice pipeline.
//!
//! These tests validate:
//! - The template invoice exports as a valid PDF
//! - Layout config survives JSON and renders from its parsed form
//! - Everything in the document view reaches the page
//! - Long invoices paginate and stay inside the page
//! - The interactive page carries the editable fields

use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use invoice_forge::binding::{Binding, Change, Edit, LineColumn, TextField};
use invoice_forge::composition::{render, Rendered};
use invoice_forge::layout_config::{LayoutBox, LayoutConfig};
use invoice_forge::pipeline::{compute_layout_config, generate_pdf, PipelineConfig};
use invoice_forge::render::render_pdf;
use invoice_forge::stylesheet::StyleComposer;
use invoice_forge::trigger::DEFAULT_DELAY;
use invoice_forge::{Invoice, ProductLine, RenderMode, Session};

// =====================================================================
// Helper
// =====================================================================

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

fn session(data: Option<Invoice>, t0: Instant) -> Session {
    Session::new(
        data,
        StyleComposer::default(),
        DEFAULT_DELAY,
        PipelineConfig::default(),
        t0,
    )
}

fn sample_invoice() -> Invoice {
    let mut inv = Invoice::template();
    inv.company_name = "Forge Works".into();
    inv.name = "Ada Smith".into();
    inv.client_name = "Acme Ltd".into();
    inv.invoice_title = "INV-0042".into();
    inv.invoice_date = "Oct 18, 2026".into();
    inv.product_lines = vec![
        ProductLine::new("Consulting", 2.0, 150.0),
        ProductLine::new("Travel", 1.0, 80.0),
    ];
    inv
}

fn layout_of(inv: &Invoice) -> LayoutConfig {
    let composer = StyleComposer::default();
    let Rendered::Document(doc) = render(RenderMode::Document, inv, &composer) else {
        panic!("expected a document rendering");
    };
    compute_layout_config(&doc, &PipelineConfig::default()).unwrap()
}

fn all_boxes(config: &LayoutConfig) -> Vec<&LayoutBox> {
    fn walk<'a>(b: &'a LayoutBox, out: &mut Vec<&'a LayoutBox>) {
        out.push(b);
        for c in &b.children {
            walk(c, out);
        }
    }
    let mut out = Vec::new();
    for page in &config.pages {
        for b in &page.boxes {
            walk(b, &mut out);
        }
    }
    out
}

fn png_data_uri(width: u32, height: u32) -> String {
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    let mut png = Vec::new();
    image::RgbImage::new(width, height)
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    format!("data:image/png;base64,{}", STANDARD.encode(&png))
}

// =====================================================================
// PDF output
// =====================================================================

#[test]
fn template_invoice_exports_single_page_pdf() {
    let t0 = Instant::now();
    let s = session(None, t0);
    let (download, layout) = s.render_document().unwrap();
    assert_valid_pdf(&download.bytes);
    assert_eq!(download.file_name, "invoice.pdf");
    assert_eq!(layout.pages.len(), 1);
    assert_eq!(layout.title, "invoice");
}

#[test]
fn export_uses_lowercased_invoice_title() {
    let t0 = Instant::now();
    let s = session(Some(sample_invoice()), t0);
    let (download, layout) = s.render_document().unwrap();
    assert_eq!(download.file_name, "inv-0042.pdf");
    assert_eq!(layout.title, "inv-0042");
    assert_valid_pdf(&download.bytes);
}

#[test]
fn layout_json_round_trips_and_renders() {
    let layout = layout_of(&sample_invoice());
    let parsed = LayoutConfig::from_json(&layout.to_json().unwrap()).unwrap();
    assert_eq!(parsed, layout);
    assert_valid_pdf(&render_pdf(&parsed).unwrap());
}

#[test]
fn layout_is_deterministic() {
    let digest = |inv: &Invoice| Sha256::digest(layout_of(inv).to_json().unwrap().as_bytes());
    let inv = sample_invoice();
    assert_eq!(digest(&inv), digest(&inv));
}

// =====================================================================
// Content
// =====================================================================

#[test]
fn every_document_text_reaches_the_page() {
    let inv = sample_invoice();
    let composer = StyleComposer::default();
    let Rendered::Document(doc) = render(RenderMode::Document, &inv, &composer) else {
        panic!("expected a document rendering");
    };
    let layout = compute_layout_config(&doc, &PipelineConfig::default()).unwrap();
    let printed = layout.text_lines().join(" ");

    for text in doc.texts() {
        for word in text.split_whitespace() {
            assert!(printed.contains(word), "{word:?} missing from the page");
        }
    }
    for expected in ["Forge Works", "Acme Ltd", "INV-0042", "300.00", "380.00"] {
        assert!(printed.contains(expected), "{expected:?} missing");
    }
}

#[test]
fn logo_becomes_an_image_box() {
    let mut inv = sample_invoice();
    inv.logo = png_data_uri(8, 4);
    inv.logo_width = 120.0;
    let layout = layout_of(&inv);

    let image = all_boxes(&layout)
        .into_iter()
        .find_map(|b| b.image.as_ref().map(|img| (b, img)));
    let (b, img) = image.expect("logo box");
    assert!((b.width - 120.0).abs() < 0.5);
    assert!((b.height - 60.0).abs() < 0.5);
    assert_eq!(img.src, inv.logo);

    let (bytes, _) = generate_pdf(
        &invoice_forge::session::Session::new(
            Some(inv),
            StyleComposer::default(),
            DEFAULT_DELAY,
            PipelineConfig::default(),
            Instant::now(),
        )
        .document_view(),
        &PipelineConfig::default(),
    )
    .unwrap();
    assert_valid_pdf(&bytes);
}

// =====================================================================
// Pagination
// =====================================================================

#[test]
fn long_invoice_spans_several_pages() {
    let mut inv = sample_invoice();
    inv.product_lines = (0..60)
        .map(|i| ProductLine::new(format!("Item {i}"), 1.0, 10.0))
        .collect();
    let layout = layout_of(&inv);
    assert!(layout.pages.len() > 1, "got {} page(s)", layout.pages.len());

    let printed = layout.text_lines();
    assert!(printed.contains(&"Item 0"));
    assert!(printed.contains(&"Item 59"));
    assert!(printed.contains(&"600.00"));
}

#[test]
fn boxes_stay_inside_the_page() {
    let mut inv = sample_invoice();
    inv.product_lines = (0..40)
        .map(|i| ProductLine::new(format!("Line {i}"), 3.0, 2.5))
        .collect();
    let layout = layout_of(&inv);
    let (w, h) = (layout.page_width_pt, layout.page_height_pt);
    for b in all_boxes(&layout) {
        assert!(b.x >= -0.5 && b.x + b.width <= w + 0.5, "box overflows width: {b:?}");
        assert!(b.y >= -0.5 && b.y + b.height <= h + 0.5, "box overflows height: {b:?}");
    }
}

// =====================================================================
// Interactive page
// =====================================================================

#[test]
fn html_page_carries_bound_inputs() {
    let t0 = Instant::now();
    let mut s = session(Some(sample_invoice()), t0);
    let html = s.render_html(t0).unwrap();
    assert!(html.contains("<h1>Invoice Generator</h1>"));
    for key in ["companyName", "clientName", "invoiceTitle", "notes"] {
        assert!(html.contains(&format!(r#"name="{key}""#)), "{key} not bound");
    }
    assert!(html.contains("value=\"Acme Ltd\""));
    assert!(html.contains("download-pdf loading"));
}

#[test]
fn edits_then_settle_into_a_download() {
    let t0 = Instant::now();
    let mut s = session(None, t0);
    s.apply(Change::AddLine, t0 + Duration::from_millis(10)).unwrap();
    s.apply(
        Edit::new(Binding::line(1, LineColumn::Description), "Support").into(),
        t0 + Duration::from_millis(20),
    )
    .unwrap();
    assert!(s
        .type_into(TextField::ClientName.into(), "Globex", t0 + Duration::from_millis(30))
        .unwrap());

    assert!(s.download(t0 + Duration::from_millis(529)).unwrap().is_none());
    let download = s.download(t0 + Duration::from_millis(530)).unwrap().unwrap();
    assert_valid_pdf(&download.bytes);

    let texts = s.document_view();
    let texts = texts.texts();
    assert!(texts.contains(&"Support"));
    assert!(texts.contains(&"Globex"));
}
