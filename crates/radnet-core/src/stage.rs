//! The fixed, ordered set of pipeline stages the bridge can serve.

use std::fmt;

/// A stage of the host server's request pipeline, plus the two module
/// lifecycle points (`instantiate` and `detach`) that managed code may
/// also hook.
///
/// [`Stage::ALL`] is the canonical order: configuration is resolved,
/// slots are laid out, and delegates are bound in this order. Adding a
/// stage is a one-line change to the enum and the table below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Instantiate,
    Authorize,
    Authenticate,
    Preacct,
    Accounting,
    Checksimul,
    PreProxy,
    PostProxy,
    PostAuth,
    #[cfg(feature = "coa")]
    RecvCoa,
    #[cfg(feature = "coa")]
    SendCoa,
    Detach,
}

impl Stage {
    /// Every stage, in pipeline order.
    pub const ALL: &'static [Stage] = &[
        Stage::Instantiate,
        Stage::Authorize,
        Stage::Authenticate,
        Stage::Preacct,
        Stage::Accounting,
        Stage::Checksimul,
        Stage::PreProxy,
        Stage::PostProxy,
        Stage::PostAuth,
        #[cfg(feature = "coa")]
        Stage::RecvCoa,
        #[cfg(feature = "coa")]
        Stage::SendCoa,
        Stage::Detach,
    ];

    /// The stable key used in configuration (`func_<key>` and friends),
    /// in TOML stage tables, and in the dispatch payload.
    pub fn key(self) -> &'static str {
        match self {
            Stage::Instantiate => "instantiate",
            Stage::Authorize => "authorize",
            Stage::Authenticate => "authenticate",
            Stage::Preacct => "preacct",
            Stage::Accounting => "accounting",
            Stage::Checksimul => "checksimul",
            Stage::PreProxy => "pre_proxy",
            Stage::PostProxy => "post_proxy",
            Stage::PostAuth => "post_auth",
            #[cfg(feature = "coa")]
            Stage::RecvCoa => "recv_coa",
            #[cfg(feature = "coa")]
            Stage::SendCoa => "send_coa",
            Stage::Detach => "detach",
        }
    }

    /// Looks a stage up by its configuration key.
    pub fn from_key(key: &str) -> Option<Stage> {
        Stage::ALL.iter().copied().find(|stage| stage.key() == key)
    }

    /// Lifecycle slots are bound like any other but run once at the
    /// corresponding lifecycle point instead of once per request.
    pub fn is_lifecycle(self) -> bool {
        matches!(self, Stage::Instantiate | Stage::Detach)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_covers_every_stage_exactly_once() {
        let expected = if cfg!(feature = "coa") { 12 } else { 10 };
        assert_eq!(Stage::ALL.len(), expected);

        let unique: HashSet<&str> = Stage::ALL.iter().map(|s| s.key()).collect();
        assert_eq!(unique.len(), Stage::ALL.len());
    }

    #[test]
    fn test_pipeline_order() {
        let authorize = Stage::ALL.iter().position(|&s| s == Stage::Authorize);
        let authenticate = Stage::ALL.iter().position(|&s| s == Stage::Authenticate);
        assert!(authorize < authenticate);
        assert_eq!(Stage::ALL.first(), Some(&Stage::Instantiate));
        assert_eq!(Stage::ALL.last(), Some(&Stage::Detach));
    }

    #[test]
    fn test_key_round_trip() {
        for &stage in Stage::ALL {
            assert_eq!(Stage::from_key(stage.key()), Some(stage));
        }
        assert_eq!(Stage::from_key("no_such_stage"), None);
    }

    #[test]
    fn test_lifecycle_stages() {
        assert!(Stage::Instantiate.is_lifecycle());
        assert!(Stage::Detach.is_lifecycle());
        assert!(!Stage::Authorize.is_lifecycle());
    }

    #[test]
    fn test_display_matches_key() {
        assert_eq!(Stage::PreProxy.to_string(), "pre_proxy");
        assert_eq!(Stage::Checksimul.to_string(), "checksimul");
    }
}
