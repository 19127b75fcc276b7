//! Module result codes handed back to the host server.

use std::fmt;

/// What a module invocation tells the server to do with the request.
///
/// Mirrors the server's module return codes in their canonical order.
/// [`Verdict::Noop`] is the contract for stages without a bound
/// delegate: the bridge passes the request through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Immediately reject the request.
    Reject,
    /// The module failed.
    Fail,
    /// The module succeeded, continue processing.
    Ok,
    /// The module handled the request itself, stop processing.
    Handled,
    /// The module considers the request invalid.
    Invalid,
    /// Reject the request, the user is locked out.
    Userlock,
    /// The user was not found.
    NotFound,
    /// The module did nothing with the request.
    Noop,
    /// The module succeeded and updated the request.
    Updated,
}

impl Verdict {
    /// The server-style lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Reject => "reject",
            Verdict::Fail => "fail",
            Verdict::Ok => "ok",
            Verdict::Handled => "handled",
            Verdict::Invalid => "invalid",
            Verdict::Userlock => "userlock",
            Verdict::NotFound => "notfound",
            Verdict::Noop => "noop",
            Verdict::Updated => "updated",
        }
    }

    /// True for the pass-through result of an unconfigured or unbound
    /// stage.
    pub fn is_noop(self) -> bool {
        self == Verdict::Noop
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(Verdict::Noop.to_string(), "noop");
        assert_eq!(Verdict::NotFound.to_string(), "notfound");
        assert_eq!(Verdict::Updated.to_string(), "updated");
    }

    #[test]
    fn test_is_noop() {
        assert!(Verdict::Noop.is_noop());
        assert!(!Verdict::Ok.is_noop());
    }
}
