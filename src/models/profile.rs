use crate::error::{RecordError, ServerError};

/// Port used when the operator does not provide one
pub const DEFAULT_PORT: &str = "22";

/// One remote server connection definition
///
/// Stored on disk as a single line:
/// `<user>@<host> <port> <options> #<comment>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub user: String,
    pub host: String,
    /// Port kept as text, validated by [`Profile::port_number`] before use
    pub port: String,
    /// Extra client flags joined by single spaces, possibly empty
    pub options: String,
    pub comment: String,
}

impl Profile {
    /// Create a profile with the default port and no options or comment
    pub fn new(user: impl Into<String>, host: impl Into<String>) -> Self {
        Profile {
            user: user.into(),
            host: host.into(),
            port: DEFAULT_PORT.to_string(),
            options: String::new(),
            comment: String::new(),
        }
    }

    /// `user@host`, always derived from the current user and host
    pub fn server_name(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Parse the port for use by a transport
    pub fn port_number(&self) -> Result<u16, ServerError> {
        match self.port.parse::<u16>() {
            Ok(port) if port > 0 => Ok(port),
            _ => Err(ServerError::InvalidPort(self.port.clone())),
        }
    }

    /// Options split into individual client arguments
    pub fn option_args(&self) -> Vec<String> {
        self.options.split_whitespace().map(str::to_string).collect()
    }

    /// Decode one stored record
    ///
    /// The comment is everything after the first `#`. The head is split on
    /// single spaces into at most three parts, so an options string that
    /// itself contains spaces survives intact.
    pub fn decode(record: &str) -> Result<Self, RecordError> {
        let (head, comment) = record
            .split_once('#')
            .ok_or(RecordError::MissingCommentSeparator)?;

        let mut fields = head.splitn(3, ' ');
        let server_name = fields.next().unwrap_or_default();
        let (port, rest) = match (fields.next(), fields.next()) {
            (Some(port), Some(rest)) => (port, rest),
            (Some(_), None) => return Err(RecordError::MissingFields { found: 2 }),
            _ => return Err(RecordError::MissingFields { found: 1 }),
        };
        // The encoder always writes one space between options and '#'
        let options = rest.strip_suffix(' ').unwrap_or(rest);

        let (user, host) = server_name
            .split_once('@')
            .ok_or_else(|| RecordError::MissingUserHostSeparator(server_name.to_string()))?;

        if user.is_empty() {
            return Err(RecordError::EmptyField("user"));
        }
        if host.is_empty() {
            return Err(RecordError::EmptyField("host"));
        }
        if port.is_empty() {
            return Err(RecordError::EmptyField("port"));
        }

        Ok(Profile {
            user: user.to_string(),
            host: host.to_string(),
            port: port.to_string(),
            options: options.to_string(),
            comment: comment.to_string(),
        })
    }

    /// Encode into the stored record form, without a line terminator
    pub fn encode(&self) -> String {
        format!(
            "{}@{} {} {} #{}",
            self.user, self.host, self.port, self.options, self.comment
        )
    }
}

/// Field changes collected from the operator for `modify`
/// `None` leaves the stored value unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileEdit {
    pub user: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub options: Option<String>,
    pub comment: Option<String>,
}

impl ProfileEdit {
    /// True when no field was given
    pub fn is_empty(&self) -> bool {
        self.user.is_none()
            && self.host.is_none()
            && self.port.is_none()
            && self.options.is_none()
            && self.comment.is_none()
    }

    /// Return a copy of `profile` with every given field replaced
    pub fn apply(&self, profile: &Profile) -> Profile {
        let pick = |edit: &Option<String>, current: &String| {
            edit.clone().unwrap_or_else(|| current.clone())
        };

        Profile {
            user: pick(&self.user, &profile.user),
            host: pick(&self.host, &profile.host),
            port: pick(&self.port, &profile.port),
            options: pick(&self.options, &profile.options),
            comment: pick(&self.comment, &profile.comment),
        }
    }
}

/// Validate a user name: non-empty, no '@', '#' or whitespace
pub fn validate_user(user: &str) -> Result<(), String> {
    if user.is_empty() {
        return Err("a user must be provided".to_string());
    }
    if user.contains(['@', '#']) || user.chars().any(char::is_whitespace) {
        return Err("a user cannot contain '@', '#' or spaces".to_string());
    }
    Ok(())
}

/// Validate a host name: non-empty, no '@', '#' or whitespace
pub fn validate_host(host: &str) -> Result<(), String> {
    if host.is_empty() {
        return Err("a host must be provided".to_string());
    }
    if host.contains(['@', '#']) || host.chars().any(char::is_whitespace) {
        return Err("a host cannot contain '@', '#' or spaces".to_string());
    }
    Ok(())
}

/// Validate a port: a number between 1 and 65535
pub fn validate_port(port: &str) -> Result<(), String> {
    match port.parse::<u16>() {
        Ok(value) if value > 0 => Ok(()),
        _ => Err(format!("'{}' is not a valid port (1-65535)", port)),
    }
}

/// Validate options and normalize them to single-space separated form
pub fn normalize_options(options: &str) -> Result<String, String> {
    if options.contains('#') {
        return Err("options cannot contain '#'".to_string());
    }
    Ok(options.split_whitespace().collect::<Vec<_>>().join(" "))
}
