//! Turns a command-line server identifier into a ready-to-use profile.
//!
//! An identifier is either a 1-based position in the server list or a literal
//! `user@host`. Anything that parses as an integer is a position, even when
//! the operator meant a host name; `"7"` never falls back to a literal.

use crate::error::ServerError;
use crate::models::profile::{validate_host, validate_user};
use crate::models::{DEFAULT_PORT, Profile, parse_position};
use crate::storage::RegistryStorage;

/// What the operator selected on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Position(i64),
    Literal { user: String, host: String },
}

impl Identifier {
    /// Classify an identifier, integer parse first
    ///
    /// A literal must split into a user and host that could be stored as a
    /// record: no second `@`, no `#` and no whitespace on either side.
    pub fn parse(identifier: &str) -> Result<Self, ServerError> {
        if let Some(position) = parse_position(identifier) {
            return Ok(Identifier::Position(position));
        }

        let invalid = || ServerError::InvalidIdentifier(identifier.to_string());
        let (user, host) = identifier.split_once('@').ok_or_else(invalid)?;
        validate_user(user).map_err(|_| invalid())?;
        validate_host(host).map_err(|_| invalid())?;

        Ok(Identifier::Literal {
            user: user.to_string(),
            host: host.to_string(),
        })
    }
}

/// Resolve an identifier into a profile, applying overrides
///
/// The registry is only read for positional identifiers and is never written.
/// `port_override` replaces the stored port; a non-empty `options_override`
/// replaces the stored options.
pub fn resolve(
    storage: &dyn RegistryStorage,
    identifier: &str,
    port_override: Option<&str>,
    options_override: &[String],
) -> Result<Profile, ServerError> {
    let mut profile = match Identifier::parse(identifier)? {
        Identifier::Position(position) => {
            let registry = storage.load()?;
            registry.profile(position)?
        }
        Identifier::Literal { user, host } => Profile::new(user, host),
    };

    if let Some(port) = port_override {
        profile.port = port.to_string();
    }
    if !options_override.is_empty() {
        profile.options = options_override.join(" ");
    }
    if profile.port.is_empty() {
        profile.port = DEFAULT_PORT.to_string();
    }

    log::debug!(
        "Resolved '{}' to {} (port {}, options '{}')",
        identifier,
        profile.server_name(),
        profile.port,
        profile.options
    );
    Ok(profile)
}

/// Normalize raw option tokens from the command line
///
/// A leading bare `-` is glued to the token after it, so `- v` becomes `-v`.
pub fn clean_options(tokens: Vec<String>) -> Vec<String> {
    let mut tokens = tokens.into_iter();
    let mut cleaned = Vec::new();

    match tokens.next() {
        Some(first) if first == "-" => match tokens.next() {
            Some(second) => cleaned.push(format!("-{}", second)),
            None => cleaned.push(first),
        },
        Some(first) => cleaned.push(first),
        None => {}
    }

    cleaned.extend(tokens);
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::TextRegistryStorage;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const SERVERS: &str = "alice@one 22 -A #first\n\
                           bob@two 2200  #second\n\
                           carol@three 22 -v -X #third\n";

    fn storage_with(contents: &str) -> (TempDir, TextRegistryStorage) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("servers");
        fs::write(&path, contents).unwrap();
        (dir, TextRegistryStorage::new(path))
    }

    #[test]
    fn test_identifier_parse() {
        assert_eq!(Identifier::parse("3").unwrap(), Identifier::Position(3));
        assert_eq!(Identifier::parse("-1").unwrap(), Identifier::Position(-1));
        assert_eq!(
            Identifier::parse("root@10.0.0.1").unwrap(),
            Identifier::Literal {
                user: "root".to_string(),
                host: "10.0.0.1".to_string()
            }
        );

        assert_eq!(
            Identifier::parse("99999999999999999999").unwrap(),
            Identifier::Position(i64::MAX)
        );

        for bad in ["host.example.com", "@host", "user@", ""] {
            assert!(matches!(
                Identifier::parse(bad),
                Err(ServerError::InvalidIdentifier(_))
            ));
        }
    }

    #[test]
    fn test_resolve_position() {
        let (_dir, storage) = storage_with(SERVERS);

        let profile = resolve(&storage, "3", None, &[]).unwrap();
        assert_eq!(profile.server_name(), "carol@three");
        assert_eq!(profile.port, "22");
        assert_eq!(profile.options, "-v -X");
        assert_eq!(profile.comment, "third");
    }

    #[test]
    fn test_resolve_overrides_leave_file_untouched() {
        let (_dir, storage) = storage_with(SERVERS);

        let profile = resolve(&storage, "1", Some("2200"), &["-v".to_string()]).unwrap();
        assert_eq!(profile.port, "2200");
        assert_eq!(profile.options, "-v");
        assert_eq!(profile.server_name(), "alice@one");

        assert_eq!(fs::read_to_string(storage.path()).unwrap(), SERVERS);
    }

    #[test]
    fn test_resolve_multiple_options_joined() {
        let (_dir, storage) = storage_with(SERVERS);
        let options = vec!["-4".to_string(), "-C".to_string()];

        let profile = resolve(&storage, "2", None, &options).unwrap();
        assert_eq!(profile.options, "-4 -C");
        assert_eq!(profile.port, "2200");
    }

    #[test]
    fn test_resolve_literal() {
        let (_dir, storage) = storage_with(SERVERS);

        let profile = resolve(&storage, "alice@example.com", None, &[]).unwrap();
        assert_eq!(profile.user, "alice");
        assert_eq!(profile.host, "example.com");
        assert_eq!(profile.port, "22");
        assert_eq!(profile.options, "");
        assert_eq!(profile.comment, "");

        assert_eq!(fs::read_to_string(storage.path()).unwrap(), SERVERS);
    }

    #[test]
    fn test_resolve_literal_without_registry_file() {
        let dir = tempdir().unwrap();
        let storage = TextRegistryStorage::new(dir.path().join("missing"));

        let profile = resolve(&storage, "root@box", Some("8022"), &["-v".to_string()]).unwrap();
        assert_eq!(profile.port, "8022");
        assert_eq!(profile.options, "-v");
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_resolve_position_bounds() {
        let (_dir, storage) = storage_with(SERVERS);

        for bad in ["0", "4", "-2"] {
            assert!(matches!(
                resolve(&storage, bad, None, &[]),
                Err(ServerError::InvalidPosition { count: 3, .. })
            ));
        }

        assert!(matches!(
            resolve(&storage, "not-a-number-or-at-sign", None, &[]),
            Err(ServerError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_resolve_huge_position() {
        let (_dir, storage) = storage_with(SERVERS);

        for huge in ["99999999999999999999", "-99999999999999999999"] {
            assert!(matches!(
                resolve(&storage, huge, None, &[]),
                Err(ServerError::InvalidPosition { count: 3, .. })
            ));
        }
    }

    #[test]
    fn test_resolve_literal_rejects_unstorable_names() {
        let (_dir, storage) = storage_with(SERVERS);

        for bad in ["a b@host", "a@b@c", "a#x@h", "user@host name", "user@h#x"] {
            assert!(matches!(
                resolve(&storage, bad, None, &[]),
                Err(ServerError::InvalidIdentifier(ref given)) if given == bad
            ));
        }
    }

    #[test]
    fn test_resolve_position_needs_registry() {
        let dir = tempdir().unwrap();
        let storage = TextRegistryStorage::new(dir.path().join("missing"));

        assert!(matches!(
            resolve(&storage, "1", None, &[]),
            Err(ServerError::NotFound(_))
        ));
    }

    #[test]
    fn test_resolve_only_decodes_selected_line() {
        let (_dir, storage) = storage_with("alice@one 22  #ok\nbroken\n");

        assert!(resolve(&storage, "1", None, &[]).is_ok());
        assert!(matches!(
            resolve(&storage, "2", None, &[]),
            Err(ServerError::MalformedRecord { line: 2, .. })
        ));
    }

    #[test]
    fn test_clean_options() {
        let owned = |tokens: &[&str]| tokens.iter().map(|t| t.to_string()).collect::<Vec<_>>();

        assert_eq!(clean_options(owned(&["-", "v"])), owned(&["-v"]));
        assert_eq!(clean_options(owned(&["-", "o", "Foo=bar"])), owned(&["-o", "Foo=bar"]));
        assert_eq!(clean_options(owned(&["-A", "-v"])), owned(&["-A", "-v"]));
        assert_eq!(clean_options(owned(&["-"])), owned(&["-"]));
        assert!(clean_options(Vec::new()).is_empty());
    }
}
