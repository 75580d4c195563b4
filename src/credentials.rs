use std::fmt;

use log::warn;

use crate::config_store::Config;

/// Basic auth pair for the Portfolio Manager web services.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Look up `auth_user` and `auth_password` for a section.  A missing
/// section or option is not an error, the caller skips the section.
pub fn resolve(config: &Config, section: &str) -> Option<Credentials> {
    let Some(s) = config.section(section) else {
        warn!("Missing section: {}", section);
        return None;
    };
    match (s.get("auth_user"), s.get("auth_password")) {
        (Some(user), Some(password)) => Some(Credentials {
            user: user.to_string(),
            password: password.to_string(),
        }),
        _ => {
            warn!("Missing credentials for section: {}", section);
            None
        }
    }
}
