//! Ephemeral tab capability and the extraction routines injected into tabs.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;

use crate::bus::EventBus;
use crate::error::TabError;
use crate::item::ItemKind;
use crate::message::{ExtractionResultMessage, TabId, TabUpdate};

/// A browser able to host short-lived background tabs.
///
/// Load progress and extraction results are not returned from calls; they
/// arrive on the two shared buses, tagged with the tab they came from.
#[async_trait]
pub trait TabHost: Send + Sync {
    /// Open an inactive tab navigating to `url`.
    async fn open_tab(&self, url: &str) -> Result<TabId, TabError>;

    /// Run a script in the tab's page. Returns once the script was started.
    async fn inject_script(&self, tab: &TabId, source: &str) -> Result<(), TabError>;

    async fn close_tab(&self, tab: &TabId) -> Result<(), TabError>;

    /// Load state changes of every tab opened by this host.
    fn tab_updates(&self) -> Arc<EventBus<TabUpdate>>;

    /// Results posted by extraction scripts, stamped with their origin tab.
    fn inbound_messages(&self) -> Arc<EventBus<ExtractionResultMessage>>;
}

/// Extraction routine for one item kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorScript {
    pub kind: ItemKind,
    pub source: Cow<'static, str>,
}

impl ExtractorScript {
    pub fn new(kind: ItemKind, source: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }
}

/// One extraction routine per item kind.
#[derive(Debug, Clone)]
pub struct ExtractorSet {
    pub note: ExtractorScript,
    pub email: ExtractorScript,
}

impl ExtractorSet {
    pub fn new(note: impl Into<Cow<'static, str>>, email: impl Into<Cow<'static, str>>) -> Self {
        Self {
            note: ExtractorScript::new(ItemKind::Note, note),
            email: ExtractorScript::new(ItemKind::Email, email),
        }
    }

    pub fn for_kind(&self, kind: ItemKind) -> &ExtractorScript {
        match kind {
            ItemKind::Note => &self.note,
            ItemKind::Email => &self.email,
        }
    }
}
