use axum::http::Method;
use std::fmt;
use std::str::FromStr;

/// The four verbs an endpoint can bind a query to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpVerb {
    pub const ALL: [HttpVerb; 4] = [HttpVerb::Get, HttpVerb::Post, HttpVerb::Put, HttpVerb::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Delete => "DELETE",
        }
    }

    pub fn from_method(method: &Method) -> Option<Self> {
        HttpVerb::ALL.into_iter().find(|v| v.as_str() == method.as_str())
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpVerb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "get" => Ok(HttpVerb::Get),
            "post" => Ok(HttpVerb::Post),
            "put" => Ok(HttpVerb::Put),
            "delete" => Ok(HttpVerb::Delete),
            other => Err(format!("unsupported verb: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_methods_and_names() {
        assert_eq!(HttpVerb::from_method(&Method::DELETE), Some(HttpVerb::Delete));
        assert_eq!(HttpVerb::from_method(&Method::PATCH), None);
        assert_eq!("Post".parse::<HttpVerb>(), Ok(HttpVerb::Post));
        assert!("patch".parse::<HttpVerb>().is_err());
        assert_eq!(HttpVerb::Put.to_string(), "PUT");
    }
}
