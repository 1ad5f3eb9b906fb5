//! The [`SessionReader`] trait and the readers shipped with roomcast.

use roomcast_transport::Handshake;

use crate::Identity;

/// Reads the identity of a peer from its upgrade request.
///
/// Called once per connection, before the connection actor is created.
/// Returning `None` means "anonymous": the connection carries an empty
/// privilege tag.
///
/// # Example
///
/// ```rust
/// use roomcast_session::{Identity, SessionReader};
/// use roomcast_transport::Handshake;
///
/// /// Trusts a header set by an authenticating reverse proxy.
/// struct ProxyHeader;
///
/// impl SessionReader for ProxyHeader {
///     fn read_identity(&self, handshake: &Handshake) -> Option<Identity> {
///         let user = handshake.header("x-user")?;
///         let privilege = handshake.header("x-privilege").unwrap_or("user");
///         Some(Identity::new(user, privilege))
///     }
/// }
/// ```
pub trait SessionReader: Send + Sync + 'static {
    /// Returns the peer's identity, or `None` if it has none.
    fn read_identity(&self, handshake: &Handshake) -> Option<Identity>;
}

/// Treats every peer as anonymous.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSession;

impl SessionReader for NoSession {
    fn read_identity(&self, _handshake: &Handshake) -> Option<Identity> {
        None
    }
}

/// Treats every peer as [`Identity::guest`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GuestSession;

impl SessionReader for GuestSession {
    fn read_identity(&self, _handshake: &Handshake) -> Option<Identity> {
        Some(Identity::guest())
    }
}

/// Reads a named cookie and hands its raw value to a decoder.
///
/// Cookie signing and encryption belong to the hosting application; the
/// decoder is where that happens.
pub struct CookieSession<F> {
    name: String,
    decode: F,
}

impl<F> CookieSession<F>
where
    F: Fn(&str) -> Option<Identity> + Send + Sync + 'static,
{
    /// Creates a reader for the cookie called `name`.
    pub fn new(name: impl Into<String>, decode: F) -> Self {
        Self {
            name: name.into(),
            decode,
        }
    }
}

impl<F> SessionReader for CookieSession<F>
where
    F: Fn(&str) -> Option<Identity> + Send + Sync + 'static,
{
    fn read_identity(&self, handshake: &Handshake) -> Option<Identity> {
        let Some(raw) = cookie(handshake, &self.name) else {
            tracing::debug!(cookie = %self.name, "session cookie absent");
            return None;
        };
        (self.decode)(raw)
    }
}

/// Returns the value of cookie `name` from the handshake's `Cookie`
/// headers, if present.
pub fn cookie<'a>(handshake: &'a Handshake, name: &str) -> Option<&'a str> {
    handshake
        .headers
        .iter()
        .filter(|(k, _)| k.eq_ignore_ascii_case("cookie"))
        .flat_map(|(_, v)| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handshake(cookies: &[&str]) -> Handshake {
        Handshake {
            path: "/ws".into(),
            headers: cookies
                .iter()
                .map(|c| ("Cookie".to_string(), c.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_cookie_finds_value_among_pairs() {
        let hs = handshake(&["theme=dark; session=abc; lang=en"]);
        assert_eq!(cookie(&hs, "session"), Some("abc"));
        assert_eq!(cookie(&hs, "lang"), Some("en"));
        assert_eq!(cookie(&hs, "missing"), None);
    }

    #[test]
    fn test_cookie_searches_every_cookie_header() {
        let hs = handshake(&["a=1", "b=2"]);
        assert_eq!(cookie(&hs, "b"), Some("2"));
    }

    #[test]
    fn test_no_session_is_anonymous() {
        assert_eq!(NoSession.read_identity(&handshake(&[])), None);
    }

    #[test]
    fn test_guest_session_is_guest_user() {
        let id = GuestSession.read_identity(&handshake(&[])).unwrap();
        assert_eq!(id.username, "guest");
        assert_eq!(id.privilege.as_str(), "user");
    }

    #[test]
    fn test_cookie_session_decodes_named_cookie() {
        let reader = CookieSession::new("session", |raw: &str| {
            let (user, privilege) = raw.split_once(':')?;
            Some(Identity::new(user, privilege))
        });

        let id = reader
            .read_identity(&handshake(&["session=ana:admin"]))
            .unwrap();
        assert_eq!(id.username, "ana");
        assert_eq!(id.privilege.as_str(), "admin");

        assert_eq!(reader.read_identity(&handshake(&[])), None);
        assert_eq!(
            reader.read_identity(&handshake(&["session=garbage"])),
            None
        );
    }
}
