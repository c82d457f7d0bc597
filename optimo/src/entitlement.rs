//! Entitlement view.
//!
//! The tier is owned by whatever stores the subscription. The session only
//! reads the current value and wakes up when it changes.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Landing page for upgrades.
pub const UPGRADE_URL: &str = "https://optimo-prompt-ai.com";

/// Subscription tier.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Free tier.
    #[default]
    #[serde(rename = "freemium")]
    Standard,
    /// Paid tier.
    #[serde(rename = "premium")]
    Elevated,
}

impl Tier {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "freemium",
            Self::Elevated => "premium",
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = crate::error::OptimoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "freemium" | "standard" | "free" => Ok(Self::Standard),
            "premium" | "elevated" | "pro" => Ok(Self::Elevated),
            other => Err(crate::error::OptimoError::InvalidConfig(format!(
                "unknown tier: {}",
                other
            ))),
        }
    }
}

/// Stored subscription state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Entitlement {
    /// Current tier.
    #[serde(rename = "subscriptionStatus")]
    pub tier: Tier,
    /// Account id, when signed in.
    pub user_id: Option<String>,
}

impl Entitlement {
    /// Entitlement for a tier without a user id.
    pub fn new(tier: Tier) -> Self {
        Self {
            tier,
            user_id: None,
        }
    }

    /// Set the user id.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Upgrade link, carrying the user id when known.
pub fn upgrade_url(user_id: Option<&str>) -> String {
    match user_id.filter(|id| !id.is_empty()) {
        Some(id) => format!("{}?user_id={}", UPGRADE_URL, id),
        None => UPGRADE_URL.to_string(),
    }
}

/// Writer side of the entitlement channel.
#[derive(Debug)]
pub struct EntitlementSource {
    tx: watch::Sender<Entitlement>,
}

impl EntitlementSource {
    /// A source publishing `initial`.
    pub fn new(initial: Entitlement) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Publish a new entitlement.
    pub fn set(&self, entitlement: Entitlement) {
        self.tx.send_replace(entitlement);
    }

    /// Publish a tier change, keeping the user id.
    pub fn set_tier(&self, tier: Tier) {
        self.tx.send_modify(|e| e.tier = tier);
    }

    /// A new reader.
    pub fn subscribe(&self) -> EntitlementView {
        EntitlementView {
            rx: self.tx.subscribe(),
        }
    }
}

/// Reader side of the entitlement channel.
#[derive(Debug, Clone)]
pub struct EntitlementView {
    rx: watch::Receiver<Entitlement>,
}

impl EntitlementView {
    /// A view that never changes.
    pub fn fixed(entitlement: Entitlement) -> Self {
        let (_, rx) = watch::channel(entitlement);
        Self { rx }
    }

    /// Current tier.
    pub fn tier(&self) -> Tier {
        self.rx.borrow().tier
    }

    /// Current user id.
    pub fn user_id(&self) -> Option<String> {
        self.rx.borrow().user_id.clone()
    }

    /// Current entitlement.
    pub fn current(&self) -> Entitlement {
        self.rx.borrow().clone()
    }

    /// Wait for the next change. Returns `false` once the source is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
