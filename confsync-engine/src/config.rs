//! Engine configuration and per-call sync options.

/// Requested or stored client-side encryption preference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncryptionMode {
    /// Follow whatever state the remote copy is currently in. With no
    /// remote copy at all, seeds plaintext.
    Auto,
    /// Plaintext on the wire; the server's at-rest protection applies.
    Sse,
    /// End-to-end encryption under a PIN-derived key.
    E2ee,
}

impl EncryptionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Sse => "sse",
            Self::E2ee => "e2ee",
        }
    }

    /// Parses a stored preference value. Returns `None` for anything
    /// outside the known set; the caller fails the sync on that.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "auto" => Some(Self::Auto),
            "sse" => Some(Self::Sse),
            "e2ee" => Some(Self::E2ee),
            _ => None,
        }
    }
}

/// Per-call options for `sync` / `apply_resolved_config`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SyncOptions {
    /// Explicit encryption intent. When set on a `sync` call, the
    /// preference is also persisted into the local document before the
    /// cycle runs, so later reads agree with it.
    pub encryption: Option<EncryptionMode>,
}

/// Static engine configuration.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Dotted paths whose values are owned unilaterally by the local
    /// replica. They never participate in conflict detection and are
    /// never transmitted in place of what the remote holds.
    pub owned_paths: Vec<String>,

    /// Dotted path of the stored encryption preference inside the local
    /// document. Normally also listed in `owned_paths`.
    pub encryption_mode_path: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            owned_paths: vec![
                "auth.accessToken".to_string(),
                "sync.encryptionMode".to_string(),
            ],
            encryption_mode_path: "sync.encryptionMode".to_string(),
        }
    }
}
