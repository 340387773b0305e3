//! Session gate: decides whether a route may be entered.

use super::CookieJar;

pub const LOGIN_ROUTE: &str = "/login";
pub const REGISTER_ROUTE: &str = "/register";
pub const DASHBOARD_ROUTE: &str = "/dashboard";

/// Outcome of running the gate on a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(&'static str),
}

/// Allow `/login*` and `/register*` unconditionally; anything else needs the
/// session cookie to be present. The cookie is not validated.
pub fn check(path: &str, cookies: &CookieJar) -> GateDecision {
    if path.starts_with(LOGIN_ROUTE) || path.starts_with(REGISTER_ROUTE) {
        return GateDecision::Allow;
    }
    if cookies.has_session() {
        GateDecision::Allow
    } else {
        tracing::debug!("No session cookie for {}, redirecting to {}", path, LOGIN_ROUTE);
        GateDecision::Redirect(LOGIN_ROUTE)
    }
}

/// Gate a CLI command that targets `path`, failing with a login hint.
pub fn require(path: &str, cookies: &CookieJar) -> anyhow::Result<()> {
    match check(path, cookies) {
        GateDecision::Allow => Ok(()),
        GateDecision::Redirect(_) => {
            anyhow::bail!("Not logged in. Run 'cheechat login' first.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jar_with_session() -> CookieJar {
        let mut jar = CookieJar::default();
        jar.absorb_set_cookie("id=s3ss10n");
        jar
    }

    #[test]
    fn test_public_routes_always_allowed() {
        let empty = CookieJar::default();
        for path in ["/login", "/login?next=/dashboard", "/register", "/register/done"] {
            assert_eq!(check(path, &empty), GateDecision::Allow, "{}", path);
        }
    }

    #[test]
    fn test_missing_cookie_redirects() {
        let empty = CookieJar::default();
        for path in ["/", "/dashboard", "/dashboard/chats", "/settings"] {
            assert_eq!(check(path, &empty), GateDecision::Redirect("/login"), "{}", path);
        }
    }

    #[test]
    fn test_present_cookie_passes() {
        let jar = jar_with_session();
        assert_eq!(check("/dashboard", &jar), GateDecision::Allow);
        assert_eq!(check("/", &jar), GateDecision::Allow);
    }

    #[test]
    fn test_other_cookies_do_not_count() {
        let mut jar = CookieJar::default();
        jar.absorb_set_cookie("theme=dark");
        assert_eq!(check("/dashboard", &jar), GateDecision::Redirect("/login"));
    }

    #[test]
    fn test_require_reports_login_hint() {
        let err = tokio_test::assert_err!(require("/dashboard", &CookieJar::default()));
        assert!(err.to_string().contains("cheechat login"));
        tokio_test::assert_ok!(require("/dashboard", &jar_with_session()));
    }
}
