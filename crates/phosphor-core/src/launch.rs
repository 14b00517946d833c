//! Launch control: hand the game client a deep link, or copy the address.
//!
//! Launching is optimistic fire-and-forget. The platform URL handler either
//! opens the client or it doesn't; nothing reports back. The "connecting"
//! state is purely cosmetic and clears itself after [`CONNECTING_RESET_MS`].

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How long the launch control stays in its "connecting" state.
pub const CONNECTING_RESET_MS: u64 = 5_000;

/// URL scheme the game client registers.
pub const DEEP_LINK_SCHEME: &str = "minecraft";

/// The server the launch control points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerTarget {
    pub name: String,
    pub host: String,
    pub port: u16,
}

impl Default for ServerTarget {
    fn default() -> Self {
        Self {
            name: "Project Rivals".to_string(),
            host: "projectrivalsbedrock.exaroton.me".to_string(),
            port: 24565,
        }
    }
}

impl ServerTarget {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
        }
    }

    /// `minecraft://?addExternalServer=<name>|<host>:<port>`, with the name
    /// percent-encoded like a URI component.
    pub fn deep_link(&self) -> String {
        format!(
            "{DEEP_LINK_SCHEME}://?addExternalServer={}|{}",
            encode_component(&self.name),
            self.address()
        )
    }

    /// Text for the manual fallback.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Percent-encode everything but `A-Za-z0-9-_.!~*'()`.
fn encode_component(s: &str) -> String {
    // urlencoding also escapes the five sub-delims URI components keep.
    urlencoding::encode(s)
        .replace("%21", "!")
        .replace("%2A", "*")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
}

/// Something that can open a URL.
pub trait UrlOpener {
    fn open_url(&mut self, url: &str) -> Result<()>;
}

/// Opens URLs through the platform handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl UrlOpener for SystemOpener {
    fn open_url(&mut self, url: &str) -> Result<()> {
        open::that(url).map_err(|e| Error::Launch(e.to_string()))
    }
}

/// Something that can hold text for the user to paste.
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The system clipboard.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| Error::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| Error::Clipboard(e.to_string()))
    }
}

/// Launch control state.
#[derive(Debug, Clone)]
pub struct Launcher {
    target: ServerTarget,
    reset_at: Option<u64>,
    launches: u32,
}

impl Launcher {
    pub fn new(target: ServerTarget) -> Self {
        Self {
            target,
            reset_at: None,
            launches: 0,
        }
    }

    pub fn target(&self) -> &ServerTarget {
        &self.target
    }

    /// Hand the deep link to `opener`.
    ///
    /// Returns `false` and does nothing while a previous launch is still
    /// "connecting". Opener failures are logged; the fallback address stays
    /// available either way.
    pub fn launch(&mut self, now_ms: u64, opener: &mut dyn UrlOpener) -> bool {
        if self.is_connecting() {
            return false;
        }
        self.reset_at = Some(now_ms + CONNECTING_RESET_MS);
        self.launches += 1;
        let url = self.target.deep_link();
        match opener.open_url(&url) {
            Ok(()) => log::info!("handed off {url}"),
            Err(e) => log::warn!("launch failed, use {} manually: {e}", self.target.address()),
        }
        true
    }

    /// Clear the connecting flag once its reset is due.
    pub fn tick(&mut self, now_ms: u64) {
        if self.reset_at.is_some_and(|at| now_ms >= at) {
            self.reset_at = None;
        }
    }

    pub fn is_connecting(&self) -> bool {
        self.reset_at.is_some()
    }

    /// Times a launch actually went out.
    pub fn launches(&self) -> u32 {
        self.launches
    }

    /// Push the fallback address to `clipboard`.
    pub fn copy_address(&self, clipboard: &mut dyn ClipboardSink) -> Result<()> {
        let address = self.target.address();
        clipboard.set_text(&address).inspect_err(|e| {
            log::warn!("could not copy {address}: {e}");
        })
    }
}
