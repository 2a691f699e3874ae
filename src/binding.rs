//! Field bindings: which invoice slot an editable field writes to.
//!
//! A binding's textual form is the slot's JSON key (`invoiceTitle`,
//! `logoWidth`, `productLines.2.rate`), so the same names work in invoice
//! files, on the command line and as `name` attributes in the HTML view.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::invoice::{parse_number, Invoice};

macro_rules! text_fields {
    ($($variant:ident => $field:ident, $key:literal;)*) => {
        /// Every free-text slot of an [`Invoice`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum TextField {
            $($variant,)*
        }

        impl TextField {
            pub const ALL: &'static [TextField] = &[$(TextField::$variant,)*];

            pub fn key(self) -> &'static str {
                match self {
                    $(TextField::$variant => $key,)*
                }
            }

            pub fn from_key(key: &str) -> Option<Self> {
                match key {
                    $($key => Some(TextField::$variant),)*
                    _ => None,
                }
            }

            pub fn get(self, invoice: &Invoice) -> &str {
                match self {
                    $(TextField::$variant => &invoice.$field,)*
                }
            }

            pub fn get_mut(self, invoice: &mut Invoice) -> &mut String {
                match self {
                    $(TextField::$variant => &mut invoice.$field,)*
                }
            }
        }
    };
}

text_fields! {
    Logo => logo, "logo";
    Title => title, "title";
    CompanyName => company_name, "companyName";
    Name => name, "name";
    CompanyAddress => company_address, "companyAddress";
    CompanyAddress2 => company_address2, "companyAddress2";
    CompanyCountry => company_country, "companyCountry";
    CompanyGst => company_gst, "companyGST";
    BillTo => bill_to, "billTo";
    ClientName => client_name, "clientName";
    ClientAddress => client_address, "clientAddress";
    ClientAddress2 => client_address2, "clientAddress2";
    ClientCountry => client_country, "clientCountry";
    ClientGst => client_gst, "clientGST";
    InvoiceTitleLabel => invoice_title_label, "invoiceTitleLabel";
    InvoiceTitle => invoice_title, "invoiceTitle";
    InvoiceDateLabel => invoice_date_label, "invoiceDateLabel";
    InvoiceDate => invoice_date, "invoiceDate";
    InvoiceDueDateLabel => invoice_due_date_label, "invoiceDueDateLabel";
    InvoiceDueDate => invoice_due_date, "invoiceDueDate";
    ProductLineDescription => product_line_description, "productLineDescription";
    ProductLineQuantity => product_line_quantity, "productLineQuantity";
    ProductLineQuantityRate => product_line_quantity_rate, "productLineQuantityRate";
    ProductLineQuantityAmount => product_line_quantity_amount, "productLineQuantityAmount";
    SubTotalLabel => sub_total_label, "subTotalLabel";
    TaxLabel1 => tax_label1, "taxLabel1";
    TaxLabel2 => tax_label2, "taxLabel2";
    TaxPercentage1 => tax_percentage1, "taxPercentage1";
    TaxPercentage2 => tax_percentage2, "taxPercentage2";
    TotalLabel => total_label, "totalLabel";
    Currency => currency, "currency";
    NotesLabel => notes_label, "notesLabel";
    Notes => notes, "notes";
    TermLabel => term_label, "termLabel";
    Term => term, "term";
}

/// Editable column of a product line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineColumn {
    Description,
    Quantity,
    Rate,
}

impl LineColumn {
    fn key(self) -> &'static str {
        match self {
            LineColumn::Description => "description",
            LineColumn::Quantity => "quantity",
            LineColumn::Rate => "rate",
        }
    }
}

/// A bindable invoice slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    Text(TextField),
    LogoWidth,
    Line { index: usize, column: LineColumn },
}

impl Binding {
    pub fn line(index: usize, column: LineColumn) -> Self {
        Binding::Line { index, column }
    }

    /// Write `text` into the slot. Numeric slots read it leniently.
    pub fn assign(self, invoice: &mut Invoice, text: &str) -> Result<()> {
        match self {
            Binding::Text(field) => *field.get_mut(invoice) = text.to_string(),
            Binding::LogoWidth => invoice.logo_width = parse_number(text) as f32,
            Binding::Line { index, column } => {
                let line = invoice.line_mut(index)?;
                match column {
                    LineColumn::Description => line.description = text.to_string(),
                    LineColumn::Quantity => line.quantity = parse_number(text),
                    LineColumn::Rate => line.rate = parse_number(text),
                }
            }
        }
        Ok(())
    }
}

impl From<TextField> for Binding {
    fn from(field: TextField) -> Self {
        Binding::Text(field)
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Text(field) => f.write_str(field.key()),
            Binding::LogoWidth => f.write_str("logoWidth"),
            Binding::Line { index, column } => {
                write!(f, "productLines.{index}.{}", column.key())
            }
        }
    }
}

impl FromStr for Binding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "logoWidth" {
            return Ok(Binding::LogoWidth);
        }
        if let Some(field) = TextField::from_key(s) {
            return Ok(Binding::Text(field));
        }
        let unknown = || Error::UnknownBinding(s.to_string());
        let rest = s.strip_prefix("productLines.").ok_or_else(unknown)?;
        let (index, column) = rest.split_once('.').ok_or_else(unknown)?;
        let index: usize = index.parse().map_err(|_| unknown())?;
        let column = match column {
            "description" => LineColumn::Description,
            "quantity" => LineColumn::Quantity,
            "rate" => LineColumn::Rate,
            _ => return Err(unknown()),
        };
        Ok(Binding::Line { index, column })
    }
}

/// New text for one bound slot, as produced by an interactive field.
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub binding: Binding,
    pub value: String,
}

impl Edit {
    pub fn new(binding: impl Into<Binding>, value: impl Into<String>) -> Self {
        Self {
            binding: binding.into(),
            value: value.into(),
        }
    }

    /// Parse a `KEY=VALUE` assignment.
    pub fn parse_assignment(s: &str) -> Result<Self> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| Error::Assignment(s.to_string()))?;
        Ok(Self {
            binding: key.trim().parse()?,
            value: value.to_string(),
        })
    }

    pub fn apply(&self, invoice: &mut Invoice) -> Result<()> {
        self.binding.assign(invoice, &self.value)
    }
}

/// Any mutation of the root invoice.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Set(Edit),
    AddLine,
    RemoveLine(usize),
    Replace(Invoice),
}

impl Change {
    pub fn apply(self, invoice: &mut Invoice) -> Result<()> {
        match self {
            Change::Set(edit) => edit.apply(invoice),
            Change::AddLine => {
                invoice.add_line();
                Ok(())
            }
            Change::RemoveLine(index) => invoice.remove_line(index).map(|_| ()),
            Change::Replace(next) => {
                *invoice = next;
                Ok(())
            }
        }
    }
}

impl From<Edit> for Change {
    fn from(edit: Edit) -> Self {
        Change::Set(edit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_text_key_round_trips() {
        for &field in TextField::ALL {
            let b = Binding::Text(field);
            assert_eq!(b.to_string().parse::<Binding>().unwrap(), b);
        }
    }

    #[test]
    fn text_keys_match_invoice_json() {
        let json = serde_json::to_value(Invoice::default()).unwrap();
        for &field in TextField::ALL {
            assert!(json.get(field.key()).is_some(), "{} not a JSON key", field.key());
        }
    }

    #[test]
    fn line_bindings_parse() {
        let b: Binding = "productLines.3.rate".parse().unwrap();
        assert_eq!(b, Binding::line(3, LineColumn::Rate));
        assert_eq!(b.to_string(), "productLines.3.rate");
        assert!("productLines.x.rate".parse::<Binding>().is_err());
        assert!("productLines.1.amount".parse::<Binding>().is_err());
        assert!("nope".parse::<Binding>().is_err());
    }

    #[test]
    fn assignments_write_slots() {
        let mut inv = Invoice::template();
        Edit::parse_assignment("invoiceTitle=Acme Services")
            .unwrap()
            .apply(&mut inv)
            .unwrap();
        Edit::parse_assignment("productLines.0.quantity= 3")
            .unwrap()
            .apply(&mut inv)
            .unwrap();
        Edit::parse_assignment("productLines.0.rate=x")
            .unwrap()
            .apply(&mut inv)
            .unwrap();
        assert_eq!(inv.invoice_title, "Acme Services");
        assert_eq!(inv.product_lines[0].quantity, 3.0);
        assert_eq!(inv.product_lines[0].rate, 0.0);
        assert!(matches!(
            Edit::parse_assignment("title"),
            Err(Error::Assignment(_))
        ));
    }

    #[test]
    fn edits_to_missing_lines_fail() {
        let mut inv = Invoice::default();
        let err = Edit::new(Binding::line(0, LineColumn::Description), "x")
            .apply(&mut inv)
            .unwrap_err();
        assert!(matches!(err, Error::LineOutOfRange { index: 0, len: 0 }));
    }

    #[test]
    fn changes_splice_lines() {
        let mut inv = Invoice::default();
        Change::AddLine.apply(&mut inv).unwrap();
        Change::AddLine.apply(&mut inv).unwrap();
        Change::RemoveLine(0).apply(&mut inv).unwrap();
        assert_eq!(inv.product_lines.len(), 1);
        Change::Replace(Invoice::template()).apply(&mut inv).unwrap();
        assert_eq!(inv.title, "INVOICE");
    }
}
