//! Interactive input for `add`, `remove` and `modify`.
//!
//! The prompter only collects what the operator wants to change. It never
//! touches the server list, so quitting at any prompt leaves the file as it was.

use std::io::{BufRead, Write};

use crate::error::ServerError;
use crate::models::profile::{normalize_options, validate_host, validate_port, validate_user};
use crate::models::{DEFAULT_PORT, Profile, ProfileEdit, parse_position};

/// Answer that aborts the current operation
pub const QUIT: &str = "q";

/// Line-based prompter over any input and output
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompter { input, output }
    }

    /// Consume the prompter, returning the output sink
    pub fn into_output(self) -> W {
        self.output
    }

    /// Print a line to the output
    pub fn say(&mut self, message: &str) -> Result<(), ServerError> {
        writeln!(self.output, "{}", message).map_err(stdout_error)
    }

    /// Ask once and return the trimmed answer
    /// End of input and the quit keyword both cancel
    pub fn ask(&mut self, label: &str) -> Result<String, ServerError> {
        Ok(self.ask_raw(label)?.trim().to_string())
    }

    /// Ask once and return the answer with only its line terminator removed
    pub fn ask_raw(&mut self, label: &str) -> Result<String, ServerError> {
        write!(self.output, "{}: ", label).map_err(stdout_error)?;
        self.output.flush().map_err(stdout_error)?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| ServerError::io("<stdin>", e))?;

        if read == 0 {
            writeln!(self.output).map_err(stdout_error)?;
            return Err(ServerError::Cancelled);
        }

        let answer = line
            .strip_suffix('\n')
            .map(|rest| rest.strip_suffix('\r').unwrap_or(rest))
            .unwrap_or(&line);
        if answer.trim() == QUIT {
            return Err(ServerError::Cancelled);
        }
        Ok(answer.to_string())
    }

    /// Ask until `check` accepts the answer
    /// `check` returns the value to keep or a message explaining the rejection
    fn ask_until<T>(
        &mut self,
        label: &str,
        check: impl Fn(&str) -> Result<T, String>,
    ) -> Result<T, ServerError> {
        loop {
            let answer = self.ask(label)?;
            match check(&answer) {
                Ok(value) => return Ok(value),
                Err(reason) => self.say(&format!("{}.\n", capitalize(&reason)))?,
            }
        }
    }

    /// Collect every field of a new profile
    ///
    /// User and host are required. Port defaults to 22; options and
    /// comment default to empty.
    pub fn collect_new_profile(&mut self) -> Result<Profile, ServerError> {
        let user = self.ask_until("User", |answer| validate_user(answer).map(|_| answer.to_string()))?;
        let host = self.ask_until("Host", |answer| validate_host(answer).map(|_| answer.to_string()))?;
        let port = self.ask_until("Port", |answer| {
            if answer.is_empty() {
                return Ok(DEFAULT_PORT.to_string());
            }
            validate_port(answer).map(|_| answer.to_string())
        })?;
        let options = self.ask_until("Options", normalize_options)?;
        let comment = self.ask_raw("Comment")?;

        Ok(Profile {
            user,
            host,
            port,
            options,
            comment,
        })
    }

    /// Collect a comma-separated list of positions to remove
    pub fn collect_positions(&mut self) -> Result<Vec<i64>, ServerError> {
        let answer = self.ask_until("Select servers", |answer| {
            if answer.is_empty() {
                return Err("select at least one server".to_string());
            }
            Ok(answer.to_string())
        })?;

        parse_positions(&answer)
    }

    /// Collect a single position to modify
    pub fn collect_position(&mut self) -> Result<i64, ServerError> {
        let answer = self.ask_until("Select server", |answer| {
            if answer.is_empty() {
                return Err("select one server".to_string());
            }
            Ok(answer.to_string())
        })?;

        parse_position(&answer)
            .ok_or_else(|| ServerError::InvalidInput(format!("'{}' is not a server number", answer)))
    }

    /// Collect field changes; a blank answer leaves the field unchanged
    pub fn collect_edit(&mut self) -> Result<ProfileEdit, ServerError> {
        let given = |answer: &str| (!answer.is_empty()).then(|| answer.to_string());

        let user = self.ask_until("User", |answer| match given(answer) {
            Some(user) => validate_user(&user).map(|_| Some(user)),
            None => Ok(None),
        })?;
        let host = self.ask_until("Host", |answer| match given(answer) {
            Some(host) => validate_host(&host).map(|_| Some(host)),
            None => Ok(None),
        })?;
        let port = self.ask_until("Port", |answer| match given(answer) {
            Some(port) => validate_port(&port).map(|_| Some(port)),
            None => Ok(None),
        })?;
        let options = self.ask_until("Options", |answer| match given(answer) {
            Some(options) => normalize_options(&options).map(Some),
            None => Ok(None),
        })?;
        let comment = self.ask_raw("Comment")?;
        let comment = (!comment.trim().is_empty()).then_some(comment);

        Ok(ProfileEdit {
            user,
            host,
            port,
            options,
            comment,
        })
    }
}

/// Parse `1,3,4` into positions
pub fn parse_positions(answer: &str) -> Result<Vec<i64>, ServerError> {
    answer
        .split(',')
        .map(|part| {
            let part = part.trim();
            parse_position(part)
                .ok_or_else(|| ServerError::InvalidInput(format!("'{}' is not a server number", part)))
        })
        .collect()
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn stdout_error(e: std::io::Error) -> ServerError {
    ServerError::io("<stdout>", e)
}
