//! # invoice-forge – one invoice form, two renderings
//!
//! The invoice page is composed once ([`composition`]) against a small set
//! of dual-mode primitives ([`primitives`]). Rendered interactively it is an
//! editable form serialised to HTML ([`html`]); rendered as a document it is
//! a static tree styled from a shared style table ([`stylesheet`]) and run
//! through the PDF pipeline:
//!
//! 1. **Style** – style bundles → computed styles ([`style`])
//! 2. **Layout** – flexbox layout with Taffy ([`layout`])
//! 3. **Paginate** – split into pages ([`pagination`])
//! 4. **Render** – emit PDF bytes via printpdf ([`render`])
//!
//! [`session::Session`] ties the pieces together: it owns the invoice,
//! applies edits, and gates the PDF download behind a debounce
//! ([`trigger`]).

pub mod binding;
pub mod composition;
pub mod config;
pub mod error;
pub mod fonts;
pub mod html;
pub mod invoice;
pub mod layout;
pub mod layout_config;
pub mod pagination;
pub mod pipeline;
pub mod primitives;
pub mod render;
pub mod session;
pub mod style;
pub mod stylesheet;
pub mod trigger;
pub mod watch;

// Re-exports for convenience
pub use error::{Error, Result};
pub use invoice::{Invoice, ProductLine};
pub use pipeline::{generate_pdf, PageOrientation, PipelineConfig};
pub use primitives::RenderMode;
pub use session::Session;
