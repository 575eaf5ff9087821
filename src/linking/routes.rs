//! Deep-linkable screens and the static route table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IgniteError, Result};

/// Prefixes accepted when no settings override them: the custom scheme, the
/// package-qualified scheme and the development-tooling scheme.
pub const DEFAULT_PREFIXES: &[&str] = &[
    "igniteGym://",
    "com.rocketseat.igniteGym://",
    "exp+ignitegym://",
];

/// Screens a deep link can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScreenName {
    SignIn,
    SignUp,
    Home,
    Exercise,
    Profile,
    History,
}

impl ScreenName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenName::SignIn => "signIn",
            ScreenName::SignUp => "signUp",
            ScreenName::Home => "home",
            ScreenName::Exercise => "exercise",
            ScreenName::Profile => "profile",
            ScreenName::History => "history",
        }
    }
}

impl fmt::Display for ScreenName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts a raw path segment into the value handed to the screen.
pub type ParamParser = fn(&str) -> String;

/// Passes the segment through untouched. Identifiers are not validated here;
/// an unknown id surfaces as not-found in the target screen.
pub fn raw_param(segment: &str) -> String {
    segment.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),
    Param(String),
}

/// A path such as `exercise/:exerciseId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    pub(crate) segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        let trimmed = template.trim_matches('/');
        if trimmed.is_empty() {
            return Err(IgniteError::InvalidLinking(
                "empty path template".to_string(),
            ));
        }

        let mut segments = Vec::new();
        for part in trimmed.split('/') {
            let segment = match part.strip_prefix(':') {
                Some("") => {
                    return Err(IgniteError::InvalidLinking(format!(
                        "unnamed parameter in '{}'",
                        template
                    )))
                }
                Some(name) => Segment::Param(name.to_string()),
                None if part.is_empty() => {
                    return Err(IgniteError::InvalidLinking(format!(
                        "empty segment in '{}'",
                        template
                    )))
                }
                None => Segment::Literal(part.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self {
            source: trimmed.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// One entry of the route table.
#[derive(Debug, Clone)]
pub struct LinkRoute {
    pub pattern: PathTemplate,
    pub screen: ScreenName,
    pub param_parser: ParamParser,
}

impl LinkRoute {
    pub fn new(pattern: &str, screen: ScreenName) -> Result<Self> {
        Ok(Self {
            pattern: PathTemplate::parse(pattern)?,
            screen,
            param_parser: raw_param,
        })
    }
}

/// Prefixes plus route table, handed to the navigation container at mount.
#[derive(Debug, Clone)]
pub struct LinkingConfig {
    pub prefixes: Vec<String>,
    pub routes: Vec<LinkRoute>,
}

impl LinkingConfig {
    /// The app's route table with the given prefixes.
    pub fn with_prefixes(prefixes: Vec<String>) -> Result<Self> {
        let routes = vec![
            LinkRoute::new("signIn", ScreenName::SignIn)?,
            LinkRoute::new("signUp", ScreenName::SignUp)?,
            LinkRoute::new("home", ScreenName::Home)?,
            LinkRoute::new("exercise/:exerciseId", ScreenName::Exercise)?,
            LinkRoute::new("profile", ScreenName::Profile)?,
            LinkRoute::new("history", ScreenName::History)?,
        ];
        Ok(Self { prefixes, routes })
    }

    pub fn validate(&self) -> Result<()> {
        if self.prefixes.is_empty() {
            return Err(IgniteError::InvalidLinking(
                "no URI prefixes registered".to_string(),
            ));
        }
        if let Some(blank) = self.prefixes.iter().find(|p| p.trim().is_empty()) {
            return Err(IgniteError::InvalidLinking(format!(
                "blank URI prefix {:?}",
                blank
            )));
        }
        if self.routes.is_empty() {
            return Err(IgniteError::InvalidLinking("empty route table".to_string()));
        }
        Ok(())
    }
}

impl Default for LinkingConfig {
    fn default() -> Self {
        // The built-in table only contains valid templates
        Self::with_prefixes(DEFAULT_PREFIXES.iter().map(|p| p.to_string()).collect())
            .unwrap_or_else(|_| Self {
                prefixes: Vec::new(),
                routes: Vec::new(),
            })
    }
}
