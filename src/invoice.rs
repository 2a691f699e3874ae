//! Invoice data model.
//!
//! Everything is optional-with-defaults: a missing JSON key deserialises to
//! an empty string (or zero), and renders as such. Line amounts are never
//! stored; they are recomputed from quantity and rate on every read.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Export name used when the invoice title is empty.
pub const DEFAULT_FILE_STEM: &str = "invoice";

/// One billable row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductLine {
    pub description: String,
    pub quantity: f64,
    pub rate: f64,
}

impl ProductLine {
    pub fn new(description: impl Into<String>, quantity: f64, rate: f64) -> Self {
        Self {
            description: description.into(),
            quantity,
            rate,
        }
    }

    /// `quantity × rate`, recomputed on every call.
    pub fn amount(&self) -> f64 {
        self.quantity * self.rate
    }
}

/// The document-level entity behind the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Invoice {
    /// Logo as a `data:image/...;base64,` URI. Empty means no logo.
    pub logo: String,
    pub logo_width: f32,
    pub title: String,

    pub company_name: String,
    pub name: String,
    pub company_address: String,
    pub company_address2: String,
    pub company_country: String,
    #[serde(rename = "companyGST")]
    pub company_gst: String,

    pub bill_to: String,
    pub client_name: String,
    pub client_address: String,
    pub client_address2: String,
    pub client_country: String,
    #[serde(rename = "clientGST")]
    pub client_gst: String,

    pub invoice_title_label: String,
    pub invoice_title: String,
    pub invoice_date_label: String,
    pub invoice_date: String,
    pub invoice_due_date_label: String,
    pub invoice_due_date: String,

    pub product_line_description: String,
    pub product_line_quantity: String,
    pub product_line_quantity_rate: String,
    pub product_line_quantity_amount: String,

    pub product_lines: Vec<ProductLine>,

    pub sub_total_label: String,
    pub tax_label1: String,
    pub tax_label2: String,
    pub tax_percentage1: String,
    pub tax_percentage2: String,

    pub total_label: String,
    pub currency: String,

    pub notes_label: String,
    pub notes: String,
    pub term_label: String,
    pub term: String,
}

impl Default for Invoice {
    fn default() -> Self {
        Self {
            logo: String::new(),
            logo_width: 100.0,
            title: String::new(),
            company_name: String::new(),
            name: String::new(),
            company_address: String::new(),
            company_address2: String::new(),
            company_country: String::new(),
            company_gst: String::new(),
            bill_to: String::new(),
            client_name: String::new(),
            client_address: String::new(),
            client_address2: String::new(),
            client_country: String::new(),
            client_gst: String::new(),
            invoice_title_label: String::new(),
            invoice_title: String::new(),
            invoice_date_label: String::new(),
            invoice_date: String::new(),
            invoice_due_date_label: String::new(),
            invoice_due_date: String::new(),
            product_line_description: String::new(),
            product_line_quantity: String::new(),
            product_line_quantity_rate: String::new(),
            product_line_quantity_amount: String::new(),
            product_lines: Vec::new(),
            sub_total_label: String::new(),
            tax_label1: String::new(),
            tax_label2: String::new(),
            tax_percentage1: String::new(),
            tax_percentage2: String::new(),
            total_label: String::new(),
            currency: String::new(),
            notes_label: String::new(),
            notes: String::new(),
            term_label: String::new(),
            term: String::new(),
        }
    }
}

impl Invoice {
    /// The starter invoice shown before the user supplies any data: labels
    /// filled in, parties blank, one empty product line.
    pub fn template() -> Self {
        Self {
            title: "INVOICE".into(),
            bill_to: "Bill To:".into(),
            invoice_title_label: "Invoice#".into(),
            invoice_date_label: "Invoice Date".into(),
            invoice_due_date_label: "Due Date".into(),
            product_line_description: "Item Description".into(),
            product_line_quantity: "Qty".into(),
            product_line_quantity_rate: "Rate".into(),
            product_line_quantity_amount: "Amount".into(),
            product_lines: vec![ProductLine::default()],
            sub_total_label: "Sub Total".into(),
            tax_label1: "CGST".into(),
            tax_label2: "SGST".into(),
            tax_percentage1: "9".into(),
            tax_percentage2: "9".into(),
            total_label: "TOTAL".into(),
            currency: "$".into(),
            notes_label: "Notes".into(),
            notes: "It was great doing business with you.".into(),
            term_label: "Terms & Conditions".into(),
            term: "Please make the payment by the due date.".into(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// `<lower-cased invoice title>.pdf`, or `invoice.pdf` for an empty title.
    pub fn export_file_name(&self) -> String {
        let stem = if self.invoice_title.is_empty() {
            DEFAULT_FILE_STEM.to_string()
        } else {
            self.invoice_title.to_lowercase()
        };
        format!("{stem}.pdf")
    }

    pub fn subtotal(&self) -> f64 {
        self.product_lines.iter().map(ProductLine::amount).sum()
    }

    /// Tax amounts for the two tax rows, from their percentage fields.
    pub fn taxes(&self) -> [f64; 2] {
        let subtotal = self.subtotal();
        [
            subtotal * parse_number(&self.tax_percentage1) / 100.0,
            subtotal * parse_number(&self.tax_percentage2) / 100.0,
        ]
    }

    pub fn total(&self) -> f64 {
        let [t1, t2] = self.taxes();
        self.subtotal() + t1 + t2
    }

    /// Append a blank product line, returning its index.
    pub fn add_line(&mut self) -> usize {
        self.product_lines.push(ProductLine::default());
        self.product_lines.len() - 1
    }

    pub fn remove_line(&mut self, index: usize) -> Result<ProductLine> {
        if index >= self.product_lines.len() {
            return Err(Error::LineOutOfRange {
                index,
                len: self.product_lines.len(),
            });
        }
        Ok(self.product_lines.remove(index))
    }

    pub fn line_mut(&mut self, index: usize) -> Result<&mut ProductLine> {
        let len = self.product_lines.len();
        self.product_lines
            .get_mut(index)
            .ok_or(Error::LineOutOfRange { index, len })
    }
}

/// Lenient numeric read of user text: surrounding whitespace is ignored and
/// anything unparsable or non-finite (`NaN`, `inf`) counts as zero.
pub fn parse_number(text: &str) -> f64 {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Two-decimal money formatting; `-0.00` is shown as `0.00`.
pub fn format_money(value: f64) -> String {
    // Adding positive zero turns -0.0 into 0.0.
    format!("{:.2}", value + 0.0)
}
