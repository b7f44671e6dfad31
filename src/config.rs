//! Client configuration: which Task Service environment to talk to and with
//! which credentials.

use std::fmt;

/// Region hosting both the production and sandbox Task Service endpoints.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default cap on the number of raw items pulled by a single listing.
pub const DEFAULT_MAX_ITEMS: usize = 1000;

/// Task Service environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Production marketplace; HITs cost real money.
    #[default]
    Live,
    /// Requester sandbox for testing HIT layouts.
    Sandbox,
}

impl Environment {
    /// API endpoint for requester operations.
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Live => "https://mturk-requester.us-east-1.amazonaws.com",
            Self::Sandbox => "https://mturk-requester-sandbox.us-east-1.amazonaws.com",
        }
    }

    /// Base URL of the worker-facing HIT preview page.
    pub fn preview(self) -> &'static str {
        match self {
            Self::Live => "https://www.mturk.com/mturk/preview",
            Self::Sandbox => "https://workersandbox.mturk.com/mturk/preview",
        }
    }

    /// Requester console page for managing HITs.
    pub fn manage(self) -> &'static str {
        match self {
            Self::Live => "https://requester.mturk.com/mturk/manageHITs",
            Self::Sandbox => "https://requestersandbox.mturk.com/mturk/manageHITs",
        }
    }

    /// Preview link for a HIT group.
    pub fn preview_url(self, hit_group_id: &str) -> String {
        format!("{}?groupId={}", self.preview(), hit_group_id)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::Sandbox => write!(f, "sandbox"),
        }
    }
}

/// Everything needed to construct a Task Service client, resolved once at
/// startup and passed down explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Named AWS profile; `None` uses the default credential chain.
    pub profile: Option<String>,
    pub environment: Environment,
    pub region: String,
    /// Upper bound on raw items fetched by any one listing.
    pub max_items: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            profile: None,
            environment: Environment::default(),
            region: DEFAULT_REGION.to_string(),
            max_items: DEFAULT_MAX_ITEMS,
        }
    }
}

impl ClientConfig {
    pub fn new(profile: Option<String>, sandbox: bool, max_items: usize) -> Self {
        Self {
            profile,
            environment: if sandbox {
                Environment::Sandbox
            } else {
                Environment::Live
            },
            max_items,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_urls_differ() {
        assert_ne!(Environment::Live.endpoint(), Environment::Sandbox.endpoint());
        assert!(Environment::Sandbox.endpoint().contains("sandbox"));
        assert!(Environment::Sandbox.manage().contains("requestersandbox"));
    }

    #[test]
    fn test_preview_url() {
        assert_eq!(
            Environment::Sandbox.preview_url("3ABC"),
            "https://workersandbox.mturk.com/mturk/preview?groupId=3ABC"
        );
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(Environment::Live.to_string(), "live");
        assert_eq!(Environment::Sandbox.to_string(), "sandbox");
    }

    #[test]
    fn test_client_config_new() {
        let config = ClientConfig::new(Some("work".to_string()), true, 50);
        assert_eq!(config.environment, Environment::Sandbox);
        assert_eq!(config.region, DEFAULT_REGION);
        assert_eq!(config.max_items, 50);
        assert_eq!(ClientConfig::default().max_items, DEFAULT_MAX_ITEMS);
    }
}
