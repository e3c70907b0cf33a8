//! Per-surface selection state passed explicitly into the dispatcher.

use aipanel_rs_config::PanelConfig;
use aipanel_rs_protocol::{BackendId, GenerationMode};
use parking_lot::RwLock;
use std::sync::Arc;

/// Text content attached for file-mode requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name without directories.
    pub name: String,
    pub content: Arc<str>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, content: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Size in characters, as reported to the user.
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// Shared attachment slot.
///
/// Only the upload action writes; in-flight requests read a snapshot taken
/// at dispatch time, so they always see a whole value.
#[derive(Debug, Clone, Default)]
pub struct AttachmentSlot {
    inner: Arc<RwLock<Option<Attachment>>>,
}

impl AttachmentSlot {
    pub fn get(&self) -> Option<Attachment> {
        self.inner.read().clone()
    }

    pub fn set(&self, attachment: Attachment) {
        *self.inner.write() = Some(attachment);
    }

    pub fn clear(&self) {
        self.inner.write().take();
    }

    pub fn is_set(&self) -> bool {
        self.inner.read().is_some()
    }
}

/// Backend and mode selection plus the feature toggles.
#[derive(Debug, Clone)]
pub struct Session {
    pub backend: BackendId,
    mode: GenerationMode,
    attachment: AttachmentSlot,
    /// Whether the usage chart is shown.
    pub graph_visible: bool,
    /// ModelTube toggle; forwarded to backends as `unrestricted`.
    pub unrestricted: bool,
}

impl Session {
    pub fn new(backend: BackendId, mode: GenerationMode) -> Self {
        Self {
            backend,
            mode,
            attachment: AttachmentSlot::default(),
            graph_visible: false,
            unrestricted: false,
        }
    }

    /// Session seeded from the configured defaults.
    pub fn from_config(config: &PanelConfig) -> Self {
        let mut session = Self::new(config.default_backend(), config.default_mode());
        session.graph_visible = config.ui.show_graph;
        session
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    /// Switch modes. Leaving file mode discards any attachment.
    pub fn set_mode(&mut self, mode: GenerationMode) {
        if self.mode.requires_attachment() && !mode.requires_attachment() {
            self.attachment.clear();
        }
        self.mode = mode;
    }

    pub fn attachment(&self) -> &AttachmentSlot {
        &self.attachment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn leaving_file_mode_clears_attachment() {
        let mut session = Session::new(BackendId::Gemini, GenerationMode::File);
        session.attachment().set(Attachment::new("notes.txt", "abc"));

        session.set_mode(GenerationMode::File);
        assert!(session.attachment().is_set());

        session.set_mode(GenerationMode::Image);
        assert!(!session.attachment().is_set());
    }

    #[test]
    fn snapshots_survive_replacement() {
        let session = Session::new(BackendId::Gemini, GenerationMode::File);
        session.attachment().set(Attachment::new("a.txt", "first"));
        let snapshot = session.attachment().get().expect("attached");
        session.attachment().set(Attachment::new("b.txt", "second"));

        assert_eq!(&*snapshot.content, "first");
        assert_eq!(session.attachment().get().map(|a| a.name), Some("b.txt".to_string()));
    }

    #[test]
    fn char_count_counts_characters_not_bytes() {
        assert_eq!(Attachment::new("u.txt", "héllo").char_count(), 5);
    }
}
