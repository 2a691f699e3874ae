//! Dual-mode rendering primitives.
//!
//! The invoice composition is written once against [`Surface`]. Two
//! surfaces implement it:
//!
//! - [`DocumentSurface`] builds a static [`DocNode`] tree whose styles come
//!   from the [`StyleComposer`]; this is what gets laid out and exported.
//! - [`InteractiveSurface`] builds a [`UiNode`] tree of class-tagged boxes
//!   and text inputs; this is what the HTML view shows.
//!
//! [`RenderMode`] picks one of the two at the composition boundary, so the
//! tree below it never branches on the mode.

use std::fmt;

use crate::binding::{Binding, Edit};
use crate::stylesheet::{StyleBundle, StyleComposer};

/// Which variant of the primitives to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Static, exportable document tree.
    Document,
    /// Editable on-screen tree.
    #[default]
    Interactive,
}

/// A field value before display coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

/// Inputs of the field primitive. All optional.
#[derive(Debug, Clone, Default)]
pub struct FieldProps {
    pub placeholder: Option<String>,
    pub value: Option<FieldValue>,
    /// Where edits go. `None` makes the field display-only.
    pub on_change: Option<Binding>,
}

impl FieldProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn value(mut self, value: impl Into<FieldValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn on_change(mut self, binding: impl Into<Binding>) -> Self {
        self.on_change = Some(binding.into());
        self
    }

    /// The value coerced to display text; absent means empty.
    pub fn display_value(&self) -> String {
        self.value.as_ref().map(ToString::to_string).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Document variant
// ---------------------------------------------------------------------------

/// A node of the exportable document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum DocNode {
    /// One physical page.
    Page {
        style: StyleBundle,
        children: Vec<DocNode>,
    },
    /// Block container.
    View {
        style: StyleBundle,
        children: Vec<DocNode>,
    },
    /// Inline container; its text children flow as one run.
    Inline {
        style: StyleBundle,
        children: Vec<DocNode>,
    },
    /// Static text, as rendered by a document-mode field.
    Text { style: StyleBundle, content: String },
    Image { style: StyleBundle, src: String },
}

impl DocNode {
    pub fn style(&self) -> &StyleBundle {
        match self {
            DocNode::Page { style, .. }
            | DocNode::View { style, .. }
            | DocNode::Inline { style, .. }
            | DocNode::Text { style, .. }
            | DocNode::Image { style, .. } => style,
        }
    }

    pub fn children(&self) -> &[DocNode] {
        match self {
            DocNode::Page { children, .. }
            | DocNode::View { children, .. }
            | DocNode::Inline { children, .. } => children,
            DocNode::Text { .. } | DocNode::Image { .. } => &[],
        }
    }

    /// All text content in document order.
    pub fn texts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_texts(&mut out);
        out
    }

    fn collect_texts<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let DocNode::Text { content, .. } = self {
            out.push(content);
        }
        for child in self.children() {
            child.collect_texts(out);
        }
    }
}

// ---------------------------------------------------------------------------
// Interactive variant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiTag {
    Div,
    Span,
}

impl UiTag {
    pub fn as_str(self) -> &'static str {
        match self {
            UiTag::Div => "div",
            UiTag::Span => "span",
        }
    }
}

/// An editable text control. The value shown is always the one passed in;
/// the control keeps no text of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct TextInput {
    pub classes: String,
    pub placeholder: String,
    pub value: String,
    pub on_change: Option<Binding>,
}

impl TextInput {
    pub fn is_read_only(&self) -> bool {
        self.on_change.is_none()
    }

    /// The edit a user typing `text` produces, if the field is editable.
    pub fn edit(&self, text: &str) -> Option<Edit> {
        self.on_change.map(|binding| Edit::new(binding, text))
    }
}

/// A node of the on-screen tree.
#[derive(Debug, Clone, PartialEq)]
pub enum UiNode {
    Element {
        tag: UiTag,
        classes: String,
        children: Vec<UiNode>,
    },
    Input(TextInput),
    Image { classes: String, src: String, width: f32 },
    Text(String),
}

impl UiNode {
    pub fn children(&self) -> &[UiNode] {
        match self {
            UiNode::Element { children, .. } => children,
            _ => &[],
        }
    }

    /// Every text input in document order.
    pub fn inputs(&self) -> Vec<&TextInput> {
        let mut out = Vec::new();
        self.collect_inputs(&mut out);
        out
    }

    fn collect_inputs<'a>(&'a self, out: &mut Vec<&'a TextInput>) {
        if let UiNode::Input(input) = self {
            out.push(input);
        }
        for child in self.children() {
            child.collect_inputs(out);
        }
    }

    /// The input bound to `binding`, if one is on screen.
    pub fn find_input(&self, binding: Binding) -> Option<&TextInput> {
        self.inputs()
            .into_iter()
            .find(|input| input.on_change == Some(binding))
    }
}

// ---------------------------------------------------------------------------
// Surfaces
// ---------------------------------------------------------------------------

/// The primitive set the composition is written against.
pub trait Surface {
    type Node;

    fn page(&self, class: &str, children: Vec<Self::Node>) -> Self::Node;
    fn view(&self, class: &str, children: Vec<Self::Node>) -> Self::Node;
    fn span(&self, class: &str, children: Vec<Self::Node>) -> Self::Node;
    fn field(&self, class: &str, props: FieldProps) -> Self::Node;
    fn image(&self, class: &str, src: &str, width: f32) -> Self::Node;
    fn text(&self, content: &str) -> Self::Node;
}

fn join_classes(role: &str, class: &str) -> String {
    if class.is_empty() {
        role.to_string()
    } else {
        format!("{role} {class}")
    }
}

/// Builds [`DocNode`]s styled through a borrowed composer.
pub struct DocumentSurface<'a> {
    composer: &'a StyleComposer,
}

impl<'a> DocumentSurface<'a> {
    pub fn new(composer: &'a StyleComposer) -> Self {
        Self { composer }
    }

    fn style(&self, role: &str, class: &str) -> StyleBundle {
        self.composer.compose(&join_classes(role, class))
    }
}

impl Surface for DocumentSurface<'_> {
    type Node = DocNode;

    fn page(&self, class: &str, children: Vec<DocNode>) -> DocNode {
        DocNode::Page {
            style: self.style("page", class),
            children,
        }
    }

    fn view(&self, class: &str, children: Vec<DocNode>) -> DocNode {
        DocNode::View {
            style: self.style("view", class),
            children,
        }
    }

    fn span(&self, class: &str, children: Vec<DocNode>) -> DocNode {
        DocNode::Inline {
            style: self.style("span", class),
            children,
        }
    }

    fn field(&self, class: &str, props: FieldProps) -> DocNode {
        DocNode::Text {
            style: self.style("span", class),
            content: props.display_value(),
        }
    }

    fn image(&self, class: &str, src: &str, width: f32) -> DocNode {
        DocNode::Image {
            style: self
                .style("image", class)
                .with("width", format!("{width}px")),
            src: src.to_string(),
        }
    }

    fn text(&self, content: &str) -> DocNode {
        DocNode::Text {
            style: StyleBundle::new(),
            content: content.to_string(),
        }
    }
}

/// Builds [`UiNode`]s carrying class tokens for the on-screen stylesheet.
#[derive(Debug, Clone, Copy, Default)]
pub struct InteractiveSurface;

impl Surface for InteractiveSurface {
    type Node = UiNode;

    fn page(&self, class: &str, children: Vec<UiNode>) -> UiNode {
        UiNode::Element {
            tag: UiTag::Div,
            classes: join_classes("page", class),
            children,
        }
    }

    fn view(&self, class: &str, children: Vec<UiNode>) -> UiNode {
        UiNode::Element {
            tag: UiTag::Div,
            classes: join_classes("view", class),
            children,
        }
    }

    fn span(&self, class: &str, children: Vec<UiNode>) -> UiNode {
        UiNode::Element {
            tag: UiTag::Span,
            classes: join_classes("span", class),
            children,
        }
    }

    fn field(&self, class: &str, props: FieldProps) -> UiNode {
        UiNode::Input(TextInput {
            classes: join_classes("input", class),
            value: props.display_value(),
            placeholder: props.placeholder.unwrap_or_default(),
            on_change: props.on_change,
        })
    }

    fn image(&self, class: &str, src: &str, width: f32) -> UiNode {
        UiNode::Image {
            classes: join_classes("image", class),
            src: src.to_string(),
            width,
        }
    }

    fn text(&self, content: &str) -> UiNode {
        UiNode::Text(content.to_string())
    }
}
