//! The invoice page: every invoice field placed in a primitive and bound to
//! its slot. Generic over [`Surface`], so the same layout produces the
//! on-screen form and the exported document.

use crate::binding::{Binding, LineColumn, TextField};
use crate::invoice::{format_money, Invoice, ProductLine};
use crate::primitives::{
    DocNode, DocumentSurface, FieldProps, InteractiveSurface, RenderMode, Surface, UiNode,
};
use crate::stylesheet::StyleComposer;

/// Either rendering of the composition.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Document(DocNode),
    Interactive(UiNode),
}

/// Render `invoice` in the given mode.
pub fn render(mode: RenderMode, invoice: &Invoice, composer: &StyleComposer) -> Rendered {
    match mode {
        RenderMode::Document => {
            Rendered::Document(compose_invoice(&DocumentSurface::new(composer), invoice))
        }
        RenderMode::Interactive => {
            Rendered::Interactive(compose_invoice(&InteractiveSurface, invoice))
        }
    }
}

/// Lay out the whole invoice page on `s`.
pub fn compose_invoice<S: Surface>(s: &S, invoice: &Invoice) -> S::Node {
    let mut children = vec![
        header(s, invoice),
        parties(s, invoice),
        line_table_header(s, invoice),
    ];
    children.extend(
        invoice
            .product_lines
            .iter()
            .enumerate()
            .map(|(i, line)| line_row(s, i, line)),
    );
    children.push(totals(s, invoice));
    children.push(labelled_block(
        s,
        invoice,
        TextField::NotesLabel,
        TextField::Notes,
        "",
    ));
    children.push(labelled_block(
        s,
        invoice,
        TextField::TermLabel,
        TextField::Term,
        "",
    ));
    s.page("invoice-wrapper", children)
}

/// An editable field bound to a text slot.
fn bound<S: Surface>(
    s: &S,
    class: &str,
    invoice: &Invoice,
    field: TextField,
    placeholder: &str,
) -> S::Node {
    let mut props = FieldProps::new()
        .value(field.get(invoice))
        .on_change(field);
    if !placeholder.is_empty() {
        props = props.placeholder(placeholder);
    }
    s.field(class, props)
}

/// A display-only run of text.
fn computed<S: Surface>(s: &S, class: &str, text: String) -> S::Node {
    s.span(class, vec![s.text(&text)])
}

fn header<S: Surface>(s: &S, inv: &Invoice) -> S::Node {
    let mut company = Vec::new();
    if !inv.logo.is_empty() {
        company.push(s.image("logo", &inv.logo, inv.logo_width));
    }
    company.extend([
        bound(s, "fs-20 bold", inv, TextField::CompanyName, "Your Company"),
        bound(s, "", inv, TextField::Name, "Your Name"),
        bound(s, "", inv, TextField::CompanyAddress, "Company's Address"),
        bound(s, "", inv, TextField::CompanyAddress2, "City, State Zip"),
        bound(s, "", inv, TextField::CompanyCountry, "Country"),
        bound(s, "", inv, TextField::CompanyGst, "GSTIN"),
    ]);
    s.view(
        "flex",
        vec![
            s.view("w-50", company),
            s.view(
                "w-50",
                vec![bound(s, "fs-45 right bold", inv, TextField::Title, "Invoice")],
            ),
        ],
    )
}

fn parties<S: Surface>(s: &S, inv: &Invoice) -> S::Node {
    let client = vec![
        bound(s, "bold dark mb-5", inv, TextField::BillTo, ""),
        bound(s, "", inv, TextField::ClientName, "Your Client's Name"),
        bound(s, "", inv, TextField::ClientAddress, "Client's Address"),
        bound(s, "", inv, TextField::ClientAddress2, "City, State Zip"),
        bound(s, "", inv, TextField::ClientCountry, "Country"),
        bound(s, "", inv, TextField::ClientGst, "GSTIN"),
    ];
    let meta = vec![
        label_value_row(
            s,
            inv,
            (TextField::InvoiceTitleLabel, TextField::InvoiceTitle),
            "INV-12",
        ),
        label_value_row(
            s,
            inv,
            (TextField::InvoiceDateLabel, TextField::InvoiceDate),
            "Jan 01, 2024",
        ),
        label_value_row(
            s,
            inv,
            (TextField::InvoiceDueDateLabel, TextField::InvoiceDueDate),
            "Jan 31, 2024",
        ),
    ];
    s.view("flex mt-40", vec![s.view("w-55", client), s.view("w-45", meta)])
}

fn label_value_row<S: Surface>(
    s: &S,
    inv: &Invoice,
    (label, value): (TextField, TextField),
    placeholder: &str,
) -> S::Node {
    s.view(
        "flex mb-5",
        vec![
            s.view("w-40", vec![bound(s, "bold", inv, label, "")]),
            s.view("w-60", vec![bound(s, "", inv, value, placeholder)]),
        ],
    )
}

fn line_table_header<S: Surface>(s: &S, inv: &Invoice) -> S::Node {
    let cell = |width: &str, class: &str, field: TextField| {
        s.view(
            &format!("{width} p-4-8"),
            vec![bound(s, class, inv, field, "")],
        )
    };
    s.view(
        "mt-30 bg-dark flex",
        vec![
            cell("w-48", "white bold", TextField::ProductLineDescription),
            cell("w-17", "white bold right", TextField::ProductLineQuantity),
            cell("w-17", "white bold right", TextField::ProductLineQuantityRate),
            cell("w-18", "white bold right", TextField::ProductLineQuantityAmount),
        ],
    )
}

fn line_row<S: Surface>(s: &S, index: usize, line: &ProductLine) -> S::Node {
    let numeric = |column: LineColumn, value: f64| {
        s.field(
            "dark right",
            FieldProps::new()
                .value(value)
                .on_change(Binding::line(index, column)),
        )
    };
    s.view(
        "row flex",
        vec![
            s.view(
                "w-48 p-4-8 pb-10",
                vec![s.field(
                    "dark",
                    FieldProps::new()
                        .value(line.description.as_str())
                        .placeholder("Enter item name/description")
                        .on_change(Binding::line(index, LineColumn::Description)),
                )],
            ),
            s.view(
                "w-17 p-4-8 pb-10",
                vec![numeric(LineColumn::Quantity, line.quantity)],
            ),
            s.view("w-17 p-4-8 pb-10", vec![numeric(LineColumn::Rate, line.rate)]),
            s.view(
                "w-18 p-4-8 pb-10",
                vec![computed(s, "dark right", format_money(line.amount()))],
            ),
        ],
    )
}

fn totals<S: Surface>(s: &S, inv: &Invoice) -> S::Node {
    let [tax1, tax2] = inv.taxes();
    let tax_row = |label: TextField, percent: TextField, amount: f64| {
        s.view(
            "flex",
            vec![
                s.view(
                    "w-50 p-5 flex",
                    vec![
                        bound(s, "w-auto", inv, label, ""),
                        bound(s, "w-auto right", inv, percent, "0"),
                        computed(s, "", "%".to_string()),
                    ],
                ),
                s.view(
                    "w-50 p-5",
                    vec![computed(s, "right bold dark", format_money(amount))],
                ),
            ],
        )
    };

    let summary = vec![
        s.view(
            "flex",
            vec![
                s.view(
                    "w-50 p-5",
                    vec![bound(s, "", inv, TextField::SubTotalLabel, "")],
                ),
                s.view(
                    "w-50 p-5",
                    vec![computed(s, "right bold dark", format_money(inv.subtotal()))],
                ),
            ],
        ),
        tax_row(TextField::TaxLabel1, TextField::TaxPercentage1, tax1),
        tax_row(TextField::TaxLabel2, TextField::TaxPercentage2, tax2),
        s.view(
            "flex bg-gray p-5",
            vec![
                s.view(
                    "w-50 p-5",
                    vec![bound(s, "bold dark", inv, TextField::TotalLabel, "")],
                ),
                s.view(
                    "w-50 p-5 flex",
                    vec![
                        bound(s, "dark bold right ml-30", inv, TextField::Currency, ""),
                        computed(s, "right bold dark w-auto", format_money(inv.total())),
                    ],
                ),
            ],
        ),
    ];

    s.view(
        "flex",
        vec![s.view("w-50 mt-10", vec![]), s.view("w-50 mt-20", summary)],
    )
}

fn labelled_block<S: Surface>(
    s: &S,
    inv: &Invoice,
    label: TextField,
    body: TextField,
    placeholder: &str,
) -> S::Node {
    s.view(
        "mt-20",
        vec![
            bound(s, "bold dark w-100", inv, label, ""),
            bound(s, "w-100", inv, body, placeholder),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Edit;
    use crate::primitives::TextInput;

    /// Mode-independent outline: (kind, depth) per node, pre-order.
    fn doc_shape(node: &DocNode, depth: usize, out: &mut Vec<(&'static str, usize)>) {
        let kind = match node {
            DocNode::Page { .. } => "page",
            DocNode::View { .. } => "view",
            DocNode::Inline { .. } => "span",
            DocNode::Text { .. } => "field",
            DocNode::Image { .. } => "image",
        };
        out.push((kind, depth));
        for child in node.children() {
            doc_shape(child, depth + 1, out);
        }
    }

    fn ui_shape(node: &UiNode, depth: usize, out: &mut Vec<(&'static str, usize)>) {
        let kind = match node {
            UiNode::Element { classes, .. } if classes.starts_with("page") => "page",
            UiNode::Element { classes, .. } if classes.starts_with("span") => "span",
            UiNode::Element { .. } => "view",
            UiNode::Input(_) | UiNode::Text(_) => "field",
            UiNode::Image { .. } => "image",
        };
        out.push((kind, depth));
        for child in node.children() {
            ui_shape(child, depth + 1, out);
        }
    }

    fn sample() -> Invoice {
        let mut inv = Invoice::template();
        inv.invoice_title = "INV-9".into();
        inv.logo = "data:image/png;base64,AAAA".into();
        inv.tax_percentage1 = "10".into();
        inv.tax_percentage2 = "10".into();
        inv.product_lines = vec![
            ProductLine::new("Design", 3.0, 2.5),
            ProductLine::new("Refund", -2.0, 3.0),
            ProductLine::new("Free", 0.0, 40.0),
        ];
        inv
    }

    #[test]
    fn both_modes_share_one_structure() {
        let c = StyleComposer::default();
        let inv = sample();
        let doc = compose_invoice(&DocumentSurface::new(&c), &inv);
        let ui = compose_invoice(&InteractiveSurface, &inv);
        let (mut a, mut b) = (Vec::new(), Vec::new());
        doc_shape(&doc, 0, &mut a);
        ui_shape(&ui, 0, &mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn amounts_are_quantity_times_rate() {
        let c = StyleComposer::default();
        let doc = compose_invoice(&DocumentSurface::new(&c), &sample());
        let texts = doc.texts();
        for expected in ["7.50", "-6.00", "0.00"] {
            assert!(texts.contains(&expected), "missing amount {expected}: {texts:?}");
        }
        // subtotal 1.50, two 10% taxes
        assert!(texts.contains(&"1.50"));
        assert!(texts.contains(&"0.15"));
        assert!(texts.contains(&"1.80"));
    }

    #[test]
    fn every_line_column_is_bound() {
        let ui = compose_invoice(&InteractiveSurface, &sample());
        for index in 0..3 {
            for column in [LineColumn::Description, LineColumn::Quantity, LineColumn::Rate] {
                assert!(ui.find_input(Binding::line(index, column)).is_some());
            }
        }
        let qty: &TextInput = ui.find_input(Binding::line(0, LineColumn::Quantity)).unwrap();
        assert_eq!(qty.value, "3");
        assert_eq!(
            qty.edit("4"),
            Some(Edit::new(Binding::line(0, LineColumn::Quantity), "4"))
        );
    }

    #[test]
    fn every_visible_text_field_has_an_input() {
        let ui = compose_invoice(&InteractiveSurface, &sample());
        for &field in TextField::ALL {
            if field == TextField::Logo {
                continue;
            }
            assert!(ui.find_input(field.into()).is_some(), "{field:?} not on screen");
        }
    }

    #[test]
    fn render_dispatches_on_mode() {
        let c = StyleComposer::default();
        let inv = Invoice::default();
        assert!(matches!(
            render(RenderMode::Document, &inv, &c),
            Rendered::Document(DocNode::Page { .. })
        ));
        assert!(matches!(
            render(RenderMode::Interactive, &inv, &c),
            Rendered::Interactive(UiNode::Element { .. })
        ));
    }

    #[test]
    fn logo_only_when_present() {
        let ui = compose_invoice(&InteractiveSurface, &Invoice::template());
        fn has_image(n: &UiNode) -> bool {
            matches!(n, UiNode::Image { .. }) || n.children().iter().any(has_image)
        }
        assert!(!has_image(&ui));
        assert!(has_image(&compose_invoice(&InteractiveSurface, &sample())));
    }
}
