//! Debounced download control.
//!
//! The trigger withholds the download while the invoice is being edited and
//! offers it once the data has been quiet for the configured delay. Time is
//! always passed in, so the state machine is deterministic.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::Result;

/// Quiet period after the last change before a download is offered.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    /// Data changed recently; the control shows a loading placeholder.
    Suppressed,
    /// The control offers the download.
    Ready,
}

/// The one pending deadline a trigger owns. Re-arming replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Deadline(Instant);

/// Suppressed/Ready state machine behind the download control.
#[derive(Debug, Clone)]
pub struct DownloadTrigger {
    delay: Duration,
    state: TriggerState,
    pending: Option<Deadline>,
    /// Number of data changes seen, starting at zero.
    revision: u64,
}

impl DownloadTrigger {
    /// A fresh trigger starts suppressed, with its timer armed at `now`.
    pub fn new(delay: Duration, now: Instant) -> Self {
        Self {
            delay,
            state: TriggerState::Suppressed,
            pending: Some(Deadline(now + delay)),
            revision: 0,
        }
    }

    /// Record a data change: back to Suppressed, and the pending deadline
    /// (if any) is dropped in favour of `now + delay`.
    pub fn data_changed(&mut self, now: Instant) {
        if self.state == TriggerState::Ready {
            log::debug!("download trigger: ready -> suppressed");
        }
        self.state = TriggerState::Suppressed;
        self.pending = Some(Deadline(now + self.delay));
        self.revision += 1;
    }

    /// Advance to `now`, firing the pending deadline if it has passed.
    pub fn poll(&mut self, now: Instant) -> TriggerState {
        if let Some(Deadline(at)) = self.pending {
            if now >= at {
                self.pending = None;
                self.state = TriggerState::Ready;
                log::debug!("download trigger: suppressed -> ready (revision {})", self.revision);
            }
        }
        self.state
    }

    /// State as of the last poll or change.
    pub fn state(&self) -> TriggerState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == TriggerState::Ready
    }

    /// When the pending deadline fires, if one is armed.
    pub fn ready_at(&self) -> Option<Instant> {
        self.pending.map(|Deadline(at)| at)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// A generated PDF and the name it should be saved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Download {
    /// Write the PDF into `dir` under its file name. Path separators and
    /// leading dots in the name are replaced, so the file always lands
    /// directly inside `dir`.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(local_file_name(&self.file_name));
        std::fs::write(&path, &self.bytes)?;
        log::info!("wrote {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

fn local_file_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    let dots = out.len() - out.trim_start_matches('.').len();
    out.replace_range(..dots, &"_".repeat(dots));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn starts_suppressed_and_fires_after_delay() {
        let t0 = Instant::now();
        let mut trigger = DownloadTrigger::new(DEFAULT_DELAY, t0);
        assert_eq!(trigger.state(), TriggerState::Suppressed);
        assert_eq!(trigger.ready_at(), Some(t0 + ms(500)));
        assert_eq!(trigger.poll(t0 + ms(499)), TriggerState::Suppressed);
        assert_eq!(trigger.poll(t0 + ms(500)), TriggerState::Ready);
        assert_eq!(trigger.ready_at(), None);
    }

    #[test]
    fn single_change_is_ready_exactly_one_delay_later_and_stays() {
        let t0 = Instant::now();
        let mut trigger = DownloadTrigger::new(DEFAULT_DELAY, t0);
        trigger.poll(t0 + ms(600));
        let change = t0 + ms(1_000);
        trigger.data_changed(change);
        assert!(!trigger.is_ready());
        assert_eq!(trigger.poll(change + ms(499)), TriggerState::Suppressed);
        assert_eq!(trigger.poll(change + ms(500)), TriggerState::Ready);
        assert_eq!(trigger.poll(change + ms(60_000)), TriggerState::Ready);
    }

    #[test]
    fn rapid_changes_keep_it_suppressed_until_quiet() {
        let t0 = Instant::now();
        let mut trigger = DownloadTrigger::new(DEFAULT_DELAY, t0);
        let mut last = t0;
        for gap in [100, 499, 250, 10, 400] {
            last += ms(gap);
            trigger.data_changed(last);
            assert_eq!(trigger.poll(last), TriggerState::Suppressed);
        }
        // More than 500 ms after the first change, but not after the last.
        assert_eq!(trigger.poll(last + ms(499)), TriggerState::Suppressed);
        assert_eq!(trigger.poll(last + ms(500)), TriggerState::Ready);
        assert_eq!(trigger.revision(), 5);
    }

    #[test]
    fn change_while_ready_resuppresses() {
        let t0 = Instant::now();
        let mut trigger = DownloadTrigger::new(ms(50), t0);
        trigger.poll(t0 + ms(50));
        assert!(trigger.is_ready());
        trigger.data_changed(t0 + ms(70));
        assert_eq!(trigger.state(), TriggerState::Suppressed);
        assert_eq!(trigger.ready_at(), Some(t0 + ms(120)));
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("invoice-forge-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn local_file_name_strips_separators_and_leading_dots() {
        assert_eq!(local_file_name("inv 2024/001.pdf"), "inv 2024_001.pdf");
        assert_eq!(local_file_name("/tmp/x.pdf"), "_tmp_x.pdf");
        assert_eq!(local_file_name("a\\b.pdf"), "a_b.pdf");
        assert_eq!(local_file_name("../up.pdf"), "___up.pdf");
        assert_eq!(local_file_name("...pdf"), "___pdf");
        assert_eq!(local_file_name("invoice.pdf"), "invoice.pdf");
    }

    #[test]
    fn save_stays_inside_the_output_dir() {
        let dir = scratch_dir("save");
        for name in ["inv 2024/001.pdf", "/tmp/outside.pdf", "../up.pdf"] {
            let download = Download {
                file_name: name.to_string(),
                bytes: b"%PDF-1.7".to_vec(),
            };
            let path = download.save_to(&dir).unwrap();
            assert_eq!(path.parent(), Some(dir.as_path()));
            assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7");
            assert_eq!(download.file_name, name);
        }
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
