use colored::*;
use greeter_core::tonic::Status;
use greeter_core::tonic_types::StatusExt;
use greeter_core::{ClientConnectError, ServeError};

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", self.0)?;
        Ok(())
    }
}

impl From<Status> for FormattedString {
    fn from(status: Status) -> Self {
        FormattedString::from(&status)
    }
}

impl From<&Status> for FormattedString {
    fn from(status: &Status) -> Self {
        let mut out = format!(
            "{} {:?}\n{} {}",
            "code:".red().bold(),
            status.code(),
            "message:".red().bold(),
            status.message()
        );

        let details = status.get_error_details_vec();
        if !details.is_empty() {
            out.push_str(&format!("\n{} {:?}", "details:".red().bold(), details));
        }

        FormattedString(out)
    }
}

impl From<ClientConnectError> for FormattedString {
    fn from(err: ClientConnectError) -> Self {
        FormattedString(format!("{}\n\n'{}'", "Connection Error:".red().bold(), err))
    }
}

impl From<ServeError> for FormattedString {
    fn from(err: ServeError) -> Self {
        FormattedString(format!("{}\n\n'{}'", "Server Error:".red().bold(), err))
    }
}

impl From<std::io::Error> for FormattedString {
    fn from(err: std::io::Error) -> Self {
        FormattedString(format!("{}\n\n'{}'", "Terminal I/O failed:".red().bold(), err))
    }
}
