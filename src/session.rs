//! The root container: owns the invoice being edited, the style composer and
//! the download trigger, and renders the whole page.

use std::borrow::Cow;
use std::time::{Duration, Instant};

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};

use crate::binding::{Binding, Change};
use crate::composition::compose_invoice;
use crate::config::AppConfig;
use crate::error::Result;
use crate::html::{DownloadControl, HtmlPage};
use crate::invoice::Invoice;
use crate::layout_config::LayoutConfig;
use crate::pipeline::{generate_pdf, PipelineConfig};
use crate::primitives::{DocNode, DocumentSurface, InteractiveSurface, UiNode};
use crate::stylesheet::StyleComposer;
use crate::trigger::{Download, DownloadTrigger, TriggerState};

/// Heading above the form.
pub const HEADING: &str = "Invoice Generator";

pub struct Session {
    /// `None` until data is supplied or first edited; renders the template.
    data: Option<Invoice>,
    composer: StyleComposer,
    trigger: DownloadTrigger,
    pipeline: PipelineConfig,
}

impl Session {
    pub fn new(
        data: Option<Invoice>,
        composer: StyleComposer,
        delay: Duration,
        pipeline: PipelineConfig,
        now: Instant,
    ) -> Self {
        Self {
            data,
            composer,
            trigger: DownloadTrigger::new(delay, now),
            pipeline,
        }
    }

    pub fn from_config(config: &AppConfig, data: Option<Invoice>, now: Instant) -> Result<Self> {
        Ok(Self::new(
            data,
            config.composer()?,
            config.debounce(),
            config.pipeline(crate::invoice::DEFAULT_FILE_STEM),
            now,
        ))
    }

    /// The invoice on screen: the supplied data, or the starter template.
    pub fn invoice(&self) -> Cow<'_, Invoice> {
        match &self.data {
            Some(invoice) => Cow::Borrowed(invoice),
            None => Cow::Owned(Invoice::template()),
        }
    }

    /// Apply a change to the invoice. A successful change re-suppresses the
    /// download; a failed one leaves the trigger alone.
    pub fn apply(&mut self, change: Change, now: Instant) -> Result<()> {
        let invoice = self.data.get_or_insert_with(Invoice::template);
        change.apply(invoice)?;
        self.trigger.data_changed(now);
        Ok(())
    }

    /// Type `text` into the on-screen field bound to `binding`.
    ///
    /// Returns `false` when no editable field carries that binding; the
    /// invoice and trigger are then untouched.
    pub fn type_into(&mut self, binding: Binding, text: &str, now: Instant) -> Result<bool> {
        let edit = self
            .interactive_view()
            .find_input(binding)
            .and_then(|input| input.edit(text));
        match edit {
            Some(edit) => self.apply(Change::Set(edit), now).map(|()| true),
            None => Ok(false),
        }
    }

    pub fn interactive_view(&self) -> UiNode {
        compose_invoice(&InteractiveSurface, &self.invoice())
    }

    pub fn document_view(&self) -> DocNode {
        compose_invoice(&DocumentSurface::new(&self.composer), &self.invoice())
    }

    pub fn poll(&mut self, now: Instant) -> TriggerState {
        self.trigger.poll(now)
    }

    pub fn trigger(&self) -> &DownloadTrigger {
        &self.trigger
    }

    pub fn composer(&self) -> &StyleComposer {
        &self.composer
    }

    /// Render the document view to PDF regardless of the trigger state.
    pub fn render_document(&self) -> Result<(Download, LayoutConfig)> {
        let invoice = self.invoice();
        let file_name = invoice.export_file_name();
        let title = file_name.trim_end_matches(".pdf").to_string();
        let (bytes, layout) = generate_pdf(&self.document_view(), &self.pipeline.clone().with_title(title))?;
        Ok((Download { file_name, bytes }, layout))
    }

    /// The PDF download, if the trigger is ready at `now`.
    pub fn download(&mut self, now: Instant) -> Result<Option<Download>> {
        if self.poll(now) != TriggerState::Ready {
            return Ok(None);
        }
        let (download, _) = self.render_document()?;
        Ok(Some(download))
    }

    /// The full HTML page as of `now`.
    pub fn render_html(&mut self, now: Instant) -> Result<String> {
        let control = match self.download(now)? {
            Some(Download { file_name, bytes }) => DownloadControl::Link {
                file_name,
                href: format!("data:application/pdf;base64,{}", BASE64_STD.encode(bytes)),
            },
            None => DownloadControl::Loading,
        };
        let css = self.composer.table().to_css();
        let view = self.interactive_view();
        Ok(HtmlPage {
            heading: HEADING,
            css: &css,
            view: &view,
            control,
        }
        .to_string())
    }
}
