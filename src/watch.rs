//! Re-export an invoice file whenever it changes.
//!
//! The loop polls the file's modification time. Each new time reloads the
//! invoice into the session, which counts as a data change; once the
//! download trigger settles, the PDF for that revision is written once.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use crate::binding::Change;
use crate::error::Result;
use crate::invoice::Invoice;
use crate::session::Session;
use crate::trigger::TriggerState;

pub struct WatchLoop {
    source: PathBuf,
    out_dir: PathBuf,
    session: Session,
    last_modified: Option<SystemTime>,
    exported_revision: Option<u64>,
}

impl WatchLoop {
    pub fn new(source: impl Into<PathBuf>, out_dir: impl Into<PathBuf>, session: Session) -> Self {
        Self {
            source: source.into(),
            out_dir: out_dir.into(),
            session,
            last_modified: None,
            exported_revision: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// One poll step. Returns the path of a PDF written during this step.
    pub fn tick(&mut self, now: Instant) -> Result<Option<PathBuf>> {
        self.reload_if_changed(now)?;

        if self.session.poll(now) != TriggerState::Ready {
            return Ok(None);
        }
        let revision = self.session.trigger().revision();
        if self.exported_revision == Some(revision) {
            return Ok(None);
        }
        let (download, _) = self.session.render_document()?;
        let path = download.save_to(&self.out_dir)?;
        self.exported_revision = Some(revision);
        Ok(Some(path))
    }

    /// [`tick`](Self::tick), with failures logged instead of returned. A file
    /// that is briefly missing during a rename-save is picked up again on a
    /// later step.
    pub fn step(&mut self, now: Instant) -> Option<PathBuf> {
        match self.tick(now) {
            Ok(written) => written,
            Err(e) => {
                log::warn!("watch step on {} failed: {e}", self.source.display());
                None
            }
        }
    }

    /// Poll forever, sleeping `interval` between steps.
    pub fn run(&mut self, interval: Duration) -> ! {
        log::info!("watching {}", self.source.display());
        loop {
            self.step(Instant::now());
            std::thread::sleep(interval);
        }
    }

    fn reload_if_changed(&mut self, now: Instant) -> Result<()> {
        let modified = std::fs::metadata(&self.source)?.modified()?;
        if self.last_modified == Some(modified) {
            return Ok(());
        }
        self.last_modified = Some(modified);

        // A half-written file fails to parse; the next write changes the
        // modification time again and is picked up then.
        match load_invoice(&self.source) {
            Ok(invoice) => {
                log::debug!("reloaded {}", self.source.display());
                self.session.apply(Change::Replace(invoice), now)
            }
            Err(e) => {
                log::warn!("ignoring {}: {e}", self.source.display());
                Ok(())
            }
        }
    }
}

pub fn load_invoice(path: &Path) -> Result<Invoice> {
    Invoice::from_json(&std::fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineConfig;
    use crate::stylesheet::StyleComposer;
    use crate::trigger::DEFAULT_DELAY;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("invoice-forge-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_with_mtime(path: &Path, json: &str, mtime: SystemTime) {
        std::fs::write(path, json).unwrap();
        std::fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    #[test]
    fn exports_once_per_settled_revision() {
        let dir = scratch_dir("watch");
        let source = dir.join("invoice.json");
        let out = dir.join("out");
        let base = SystemTime::now();
        write_with_mtime(&source, r#"{"invoiceTitle":"First"}"#, base);

        let t0 = Instant::now();
        let session = Session::new(
            None,
            StyleComposer::default(),
            DEFAULT_DELAY,
            PipelineConfig::default(),
            t0,
        );
        let mut watch = WatchLoop::new(&source, &out, session);

        assert_eq!(watch.tick(t0).unwrap(), None);
        assert_eq!(watch.session().invoice().invoice_title, "First");
        assert_eq!(watch.tick(t0 + ms(499)).unwrap(), None);

        let written = watch.tick(t0 + ms(500)).unwrap().unwrap();
        assert_eq!(written, out.join("first.pdf"));
        assert!(std::fs::read(&written).unwrap().starts_with(b"%PDF-"));
        assert_eq!(watch.tick(t0 + ms(900)).unwrap(), None);

        write_with_mtime(
            &source,
            r#"{"invoiceTitle":"Second"}"#,
            base + Duration::from_secs(5),
        );
        assert_eq!(watch.tick(t0 + ms(1_000)).unwrap(), None);
        let written = watch.tick(t0 + ms(1_500)).unwrap().unwrap();
        assert_eq!(written, out.join("second.pdf"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn unparsable_file_is_skipped() {
        let dir = scratch_dir("watch-bad");
        let source = dir.join("invoice.json");
        std::fs::write(&source, "{ not json").unwrap();

        let t0 = Instant::now();
        let session = Session::new(
            None,
            StyleComposer::default(),
            DEFAULT_DELAY,
            PipelineConfig::default(),
            t0,
        );
        let mut watch = WatchLoop::new(&source, dir.join("out"), session);
        assert_eq!(watch.tick(t0).unwrap(), None);
        assert_eq!(watch.session().trigger().revision(), 0);
        assert_eq!(*watch.session().invoice(), Invoice::template());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        let t0 = Instant::now();
        let session = Session::new(
            None,
            StyleComposer::default(),
            DEFAULT_DELAY,
            PipelineConfig::default(),
            t0,
        );
        let mut watch = WatchLoop::new("/nonexistent/invoice.json", "out", session);
        assert!(watch.tick(t0).is_err());
    }

    #[test]
    fn step_survives_a_missing_file_and_resumes() {
        let dir = scratch_dir("watch-gone");
        let source = dir.join("invoice.json");
        let out = dir.join("out");
        let base = SystemTime::now();
        write_with_mtime(&source, r#"{"invoiceTitle":"Before"}"#, base);

        let t0 = Instant::now();
        let session = Session::new(
            None,
            StyleComposer::default(),
            DEFAULT_DELAY,
            PipelineConfig::default(),
            t0,
        );
        let mut watch = WatchLoop::new(&source, &out, session);
        assert_eq!(watch.step(t0), None);

        std::fs::remove_file(&source).unwrap();
        assert_eq!(watch.step(t0 + ms(100)), None);
        assert_eq!(watch.session().invoice().invoice_title, "Before");

        write_with_mtime(
            &source,
            r#"{"invoiceTitle":"2024/7"}"#,
            base + Duration::from_secs(5),
        );
        assert_eq!(watch.step(t0 + ms(200)), None);
        assert_eq!(watch.session().invoice().invoice_title, "2024/7");
        let written = watch.step(t0 + ms(700)).unwrap();
        assert_eq!(written, out.join("2024_7.pdf"));
        assert!(std::fs::read(&written).unwrap().starts_with(b"%PDF-"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
