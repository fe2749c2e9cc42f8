//! Interactive confirmation of a split before anything is written.
//!
//! The preview is shown through a [`PreviewSurface`], which hides whether the
//! overlay goes to the system image viewer or nowhere at all (tests and
//! `--yes` runs). [`confirm`] acquires the surface, waits for one key and
//! releases the surface on every path before returning.

use std::collections::{HashMap, VecDeque};
use std::io::{BufRead, BufWriter, Write};

use image::{ImageFormat, RgbImage};
use tempfile::NamedTempFile;

use crate::console::{Console, KeyReply};
use crate::error::{Result, SplitError};

/// Keys that drive the confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmKeys {
    /// Accepts the split.
    pub commit: char,
    /// Explicitly cancels. Any other key also rejects.
    pub cancel: char,
}

impl Default for ConfirmKeys {
    fn default() -> Self {
        Self {
            commit: 'c',
            cancel: 'q',
        }
    }
}

/// Why a preview was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The cancel key was pressed.
    Cancelled,
    /// Some other key was pressed.
    InvalidKey(char),
    /// A reply longer than one key.
    InvalidReply,
    /// Empty reply or end of input.
    NoInput,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled by operator"),
            Self::InvalidKey(key) => write!(f, "invalid key {key:?}"),
            Self::InvalidReply => write!(f, "reply was not a single key"),
            Self::NoInput => write!(f, "no key pressed"),
        }
    }
}

/// Confirmation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmState {
    AwaitingInput,
    Accepted,
    Rejected(RejectReason),
}

/// Terminal outcome of a confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accepted,
    Rejected(RejectReason),
}

/// Single-transition state machine from `AwaitingInput` to a terminal state.
#[derive(Debug, Clone)]
pub struct Confirmation {
    keys: ConfirmKeys,
    state: ConfirmState,
}

impl Confirmation {
    pub fn new(keys: ConfirmKeys) -> Self {
        Self {
            keys,
            state: ConfirmState::AwaitingInput,
        }
    }

    pub fn state(&self) -> ConfirmState {
        self.state
    }

    /// Feed one reply (`Some(key)`, `None`, or a [`KeyReply`]). Terminal
    /// states ignore input.
    pub fn press(&mut self, reply: impl Into<KeyReply>) -> ConfirmState {
        if self.state != ConfirmState::AwaitingInput {
            return self.state;
        }
        self.state = match reply.into() {
            KeyReply::Key(k) if k.eq_ignore_ascii_case(&self.keys.commit) => {
                ConfirmState::Accepted
            }
            KeyReply::Key(k) if k.eq_ignore_ascii_case(&self.keys.cancel) => {
                ConfirmState::Rejected(RejectReason::Cancelled)
            }
            KeyReply::Key(k) => ConfirmState::Rejected(RejectReason::InvalidKey(k)),
            KeyReply::Text(text) => {
                tracing::debug!(%text, "multi-character reply treated as rejection");
                ConfirmState::Rejected(RejectReason::InvalidReply)
            }
            KeyReply::Nothing => ConfirmState::Rejected(RejectReason::NoInput),
        };
        self.state
    }

    /// The decision, once a terminal state is reached.
    pub fn decision(&self) -> Option<Decision> {
        match self.state {
            ConfirmState::AwaitingInput => None,
            ConfirmState::Accepted => Some(Decision::Accepted),
            ConfirmState::Rejected(reason) => Some(Decision::Rejected(reason)),
        }
    }
}

/// Opaque handle to a displayed preview.
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewHandle {
    id: u64,
}

impl PreviewHandle {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Somewhere a preview overlay can be shown and a key read back.
pub trait PreviewSurface {
    /// Show `overlay` to the operator along with `instructions`.
    fn display(&mut self, overlay: &RgbImage, instructions: &str) -> Result<PreviewHandle>;

    /// Block until the operator answers.
    fn await_key(&mut self, handle: &PreviewHandle) -> Result<KeyReply>;

    /// Close the preview and free anything it holds.
    fn release(&mut self, handle: PreviewHandle);
}

/// Show `overlay`, wait for the operator, and release the preview.
///
/// The handle is released before returning, whether the key was the commit
/// key, any other key, or reading it failed.
pub fn confirm(
    surface: &mut dyn PreviewSurface,
    overlay: &RgbImage,
    keys: ConfirmKeys,
) -> Result<Decision> {
    let instructions = format!(
        "Press '{}' then Enter to save the tiles, '{}' to cancel.",
        keys.commit, keys.cancel
    );
    let handle = surface.display(overlay, &instructions)?;
    let key = surface.await_key(&handle);
    surface.release(handle);

    let mut confirmation = Confirmation::new(keys);
    confirmation.press(key?);
    let decision = confirmation
        .decision()
        .unwrap_or(Decision::Rejected(RejectReason::NoInput));
    tracing::info!(?decision, "preview confirmation finished");
    Ok(decision)
}

/// Preview surface backed by the system image viewer and the console.
///
/// The overlay is written to a temporary PNG that lives until the handle is
/// released.
pub struct ViewerSurface<R, W> {
    console: Console<R, W>,
    launch_viewer: bool,
    next_id: u64,
    open: HashMap<u64, NamedTempFile>,
}

impl<R: BufRead, W: Write> ViewerSurface<R, W> {
    pub fn new(console: Console<R, W>) -> Self {
        Self {
            console,
            launch_viewer: true,
            next_id: 0,
            open: HashMap::new(),
        }
    }

    /// Only print the preview path instead of launching a viewer.
    pub fn without_viewer(mut self) -> Self {
        self.launch_viewer = false;
        self
    }

    /// Number of previews currently held open.
    pub fn open_previews(&self) -> usize {
        self.open.len()
    }

    /// Give the console back.
    pub fn into_console(self) -> Console<R, W> {
        self.console
    }
}

impl<R: BufRead, W: Write> PreviewSurface for ViewerSurface<R, W> {
    fn display(&mut self, overlay: &RgbImage, instructions: &str) -> Result<PreviewHandle> {
        let file = tempfile::Builder::new()
            .prefix("gridsplit-preview-")
            .suffix(".png")
            .tempfile()?;
        {
            let mut writer = BufWriter::new(file.as_file());
            overlay
                .write_to(&mut writer, ImageFormat::Png)
                .map_err(|e| SplitError::Io(std::io::Error::other(e)))?;
            writer.flush()?;
        }
        let path = file.path().to_path_buf();

        if self.launch_viewer {
            if let Err(e) = open::that_detached(&path) {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "could not launch image viewer"
                );
                self.console.say(format!(
                    "Could not open a viewer; preview saved at {}",
                    path.display()
                ))?;
            } else {
                self.console.say(format!("Preview opened: {}", path.display()))?;
            }
        } else {
            self.console.say(format!("Preview saved at {}", path.display()))?;
        }
        self.console.say(instructions)?;

        let id = self.next_id;
        self.next_id += 1;
        self.open.insert(id, file);
        Ok(PreviewHandle::new(id))
    }

    fn await_key(&mut self, _handle: &PreviewHandle) -> Result<KeyReply> {
        self.console.read_key()
    }

    fn release(&mut self, handle: PreviewHandle) {
        if let Some(file) = self.open.remove(&handle.id()) {
            let path = file.path().to_path_buf();
            if let Err(e) = file.close() {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to remove preview file"
                );
            }
        }
    }
}

/// Preview surface that answers from a fixed script of keys.
///
/// Used for `--yes` runs and in tests; it records how often it was
/// displayed and released.
#[derive(Debug, Default)]
pub struct ScriptedSurface {
    keys: VecDeque<Option<char>>,
    fail_await: bool,
    next_id: u64,
    displayed: usize,
    released: usize,
    last_size: Option<(u32, u32)>,
}

impl ScriptedSurface {
    /// Surface that answers each preview with the next scripted key.
    pub fn new(keys: impl IntoIterator<Item = Option<char>>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Surface that always presses `commit`.
    pub fn accepting(commit: char) -> Self {
        Self::new([Some(commit)])
    }

    /// Make `await_key` fail with an I/O error.
    pub fn failing() -> Self {
        Self {
            fail_await: true,
            ..Self::default()
        }
    }

    pub fn displayed(&self) -> usize {
        self.displayed
    }

    pub fn released(&self) -> usize {
        self.released
    }

    /// Dimensions of the last overlay shown.
    pub fn last_size(&self) -> Option<(u32, u32)> {
        self.last_size
    }
}

impl PreviewSurface for ScriptedSurface {
    fn display(&mut self, overlay: &RgbImage, _instructions: &str) -> Result<PreviewHandle> {
        self.displayed += 1;
        self.last_size = Some(overlay.dimensions());
        let id = self.next_id;
        self.next_id += 1;
        Ok(PreviewHandle::new(id))
    }

    fn await_key(&mut self, _handle: &PreviewHandle) -> Result<KeyReply> {
        if self.fail_await {
            return Err(SplitError::Io(std::io::Error::other("input closed")));
        }
        // the last scripted key repeats
        let key = if self.keys.len() > 1 {
            self.keys.pop_front().flatten()
        } else {
            self.keys.front().copied().flatten()
        };
        Ok(key.into())
    }

    fn release(&mut self, _handle: PreviewHandle) {
        self.released += 1;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn overlay() -> RgbImage {
        RgbImage::new(16, 8)
    }

    #[test]
    fn starts_awaiting_input() {
        let c = Confirmation::new(ConfirmKeys::default());
        assert_eq!(c.state(), ConfirmState::AwaitingInput);
        assert_eq!(c.decision(), None);
    }

    #[test]
    fn commit_key_accepts_case_insensitively() {
        let mut c = Confirmation::new(ConfirmKeys::default());
        assert_eq!(c.press(Some('C')), ConfirmState::Accepted);
        assert_eq!(c.decision(), Some(Decision::Accepted));
    }

    #[test]
    fn cancel_and_other_keys_reject() {
        let mut c = Confirmation::new(ConfirmKeys::default());
        assert_eq!(
            c.press(Some('q')),
            ConfirmState::Rejected(RejectReason::Cancelled)
        );

        let mut c = Confirmation::new(ConfirmKeys::default());
        assert_eq!(
            c.press(Some('x')),
            ConfirmState::Rejected(RejectReason::InvalidKey('x'))
        );

        let mut c = Confirmation::new(ConfirmKeys::default());
        assert_eq!(c.press(None), ConfirmState::Rejected(RejectReason::NoInput));
    }

    #[test]
    fn terminal_state_ignores_further_keys() {
        let mut c = Confirmation::new(ConfirmKeys::default());
        c.press(Some('x'));
        assert_eq!(
            c.press(Some('c')),
            ConfirmState::Rejected(RejectReason::InvalidKey('x'))
        );
    }

    #[test]
    fn custom_keys() {
        let keys = ConfirmKeys {
            commit: 'y',
            cancel: 'n',
        };
        let mut c = Confirmation::new(keys);
        assert_eq!(
            c.press(Some('c')),
            ConfirmState::Rejected(RejectReason::InvalidKey('c'))
        );
        let mut c = Confirmation::new(keys);
        assert_eq!(c.press(Some('y')), ConfirmState::Accepted);
    }

    #[test]
    fn confirm_releases_on_accept_and_reject() {
        let mut surface = ScriptedSurface::accepting('c');
        let d = confirm(&mut surface, &overlay(), ConfirmKeys::default()).unwrap();
        assert_eq!(d, Decision::Accepted);
        assert_eq!((surface.displayed(), surface.released()), (1, 1));
        assert_eq!(surface.last_size(), Some((16, 8)));

        let mut surface = ScriptedSurface::new([Some('z')]);
        let d = confirm(&mut surface, &overlay(), ConfirmKeys::default()).unwrap();
        assert_eq!(d, Decision::Rejected(RejectReason::InvalidKey('z')));
        assert_eq!((surface.displayed(), surface.released()), (1, 1));
    }

    #[test]
    fn confirm_releases_when_await_fails() {
        let mut surface = ScriptedSurface::failing();
        assert!(confirm(&mut surface, &overlay(), ConfirmKeys::default()).is_err());
        assert_eq!((surface.displayed(), surface.released()), (1, 1));
    }

    #[test]
    fn scripted_keys_are_consumed_in_order() {
        let mut surface = ScriptedSurface::new([Some('x'), Some('c')]);
        let keys = ConfirmKeys::default();
        assert_eq!(
            confirm(&mut surface, &overlay(), keys).unwrap(),
            Decision::Rejected(RejectReason::InvalidKey('x'))
        );
        assert_eq!(confirm(&mut surface, &overlay(), keys).unwrap(), Decision::Accepted);
    }

    #[test]
    fn viewer_surface_removes_temp_file_on_release() {
        let console = Console::new("c\n".as_bytes(), Vec::new());
        let mut surface = ViewerSurface::new(console).without_viewer();
        let decision = confirm(&mut surface, &overlay(), ConfirmKeys::default()).unwrap();
        assert_eq!(decision, Decision::Accepted);
        assert_eq!(surface.open_previews(), 0);
    }

    #[test]
    fn viewer_surface_writes_readable_png_until_release() {
        let console = Console::new("q\n".as_bytes(), Vec::new());
        let mut surface = ViewerSurface::new(console).without_viewer();
        let handle = surface.display(&overlay(), "press a key").unwrap();

        let path = surface.open.get(&handle.id()).unwrap().path().to_path_buf();
        assert_eq!(image::image_dimensions(&path).unwrap(), (16, 8));
        assert_eq!(surface.await_key(&handle).unwrap(), KeyReply::Key('q'));

        surface.release(handle);
        assert!(!path.exists());

        let out = String::from_utf8(surface.into_console().into_output()).unwrap();
        assert!(out.contains("press a key"));
    }

    #[test]
    fn word_starting_with_commit_key_rejects() {
        for reply in ["cancel\n", "commit\n", "C C\n"] {
            let console = Console::new(reply.as_bytes(), Vec::new());
            let mut surface = ViewerSurface::new(console).without_viewer();
            let decision = confirm(&mut surface, &overlay(), ConfirmKeys::default()).unwrap();
            assert_eq!(decision, Decision::Rejected(RejectReason::InvalidReply), "{reply:?}");
            assert_eq!(surface.open_previews(), 0);
        }
    }

    #[test]
    fn press_text_reply_rejects() {
        let mut c = Confirmation::new(ConfirmKeys::default());
        assert_eq!(
            c.press(KeyReply::Text("cancel".into())),
            ConfirmState::Rejected(RejectReason::InvalidReply)
        );
    }
}
