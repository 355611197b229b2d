use std::fmt;
use std::str::FromStr;

use quiz_core::model::{QuestionNumber, SessionToken};

use crate::error::RouteError;

/// Path prefix shared by every quiz route.
pub const BASE_PATH: &str = "/qa";

/// Locations the front-end can show.
///
/// `/` is accepted when parsing and lands on `Entry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Entry,
    Summary(SessionToken),
    Question(SessionToken, QuestionNumber),
}

impl Route {
    #[must_use]
    pub fn question(session: &SessionToken, number: QuestionNumber) -> Self {
        Route::Question(session.clone(), number)
    }

    #[must_use]
    pub fn summary(session: &SessionToken) -> Self {
        Route::Summary(session.clone())
    }

    #[must_use]
    pub fn session(&self) -> Option<&SessionToken> {
        match self {
            Route::Entry => None,
            Route::Summary(s) | Route::Question(s, _) => Some(s),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Entry => f.write_str(BASE_PATH),
            Route::Summary(session) => write!(f, "{BASE_PATH}/{session}/summary"),
            Route::Question(session, number) => write!(f, "{BASE_PATH}/{session}/{number}"),
        }
    }
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Ok(Route::Entry);
        }
        let Some(rest) = trimmed.strip_prefix(BASE_PATH) else {
            return Err(RouteError::Unknown(path.to_owned()));
        };
        if rest.is_empty() {
            return Ok(Route::Entry);
        }
        let Some(rest) = rest.strip_prefix('/') else {
            return Err(RouteError::Unknown(path.to_owned()));
        };

        let mut parts = rest.split('/');
        let (Some(session), Some(leaf), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(RouteError::Unknown(path.to_owned()));
        };
        let session: SessionToken = session
            .parse()
            .map_err(|_| RouteError::Unknown(path.to_owned()))?;

        if leaf == "summary" {
            return Ok(Route::Summary(session));
        }
        let number: QuestionNumber = leaf
            .parse()
            .map_err(|_| RouteError::QuestionNumber(leaf.to_owned()))?;
        Ok(Route::Question(session, number))
    }
}
