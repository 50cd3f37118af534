//! Route representation: method set, optional domain, path pattern, name,
//! action id, parameter defaults and constraints.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;

/// HTTP method of a registered route or an inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraint on a single path parameter.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// The parameter must equal one of the listed values.
    OneOf(Vec<String>),
    /// The parameter must match the anchored pattern.
    Pattern(Regex),
}

impl Constraint {
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Constraint::OneOf(values.into_iter().map(Into::into).collect())
    }

    /// Compile an anchored pattern constraint.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(&format!("^(?:{pattern})$")).map(Constraint::Pattern)
    }

    pub fn allows(&self, value: &str) -> bool {
        match self {
            Constraint::OneOf(values) => values.iter().any(|v| v == value),
            Constraint::Pattern(regex) => regex.is_match(value),
        }
    }
}

/// Composite route key: domain (empty when unbound) plus slash-trimmed path,
/// `/` for the root.
pub fn route_key(domain: Option<&str>, path: &str) -> String {
    let trimmed = path.trim_matches('/');
    let path = if trimmed.is_empty() { "/" } else { trimmed };
    format!("{}{}", domain.unwrap_or(""), path)
}

/// A registered route. Path patterns are slash-trimmed segment sequences;
/// `{name}` segments bind parameters.
#[derive(Debug, Clone)]
pub struct Route {
    methods: Vec<Method>,
    domain: Option<String>,
    path: String,
    name: Option<String>,
    action: String,
    defaults: BTreeMap<String, String>,
    constraints: BTreeMap<String, Constraint>,
    fallback: bool,
}

impl Route {
    pub fn new<I>(methods: I, path: &str) -> Self
    where
        I: IntoIterator<Item = Method>,
    {
        Self {
            methods: methods.into_iter().collect(),
            domain: None,
            path: path.trim_matches('/').to_string(),
            name: None,
            action: String::new(),
            defaults: BTreeMap::new(),
            constraints: BTreeMap::new(),
            fallback: false,
        }
    }

    /// Shorthand for a GET route.
    pub fn get(path: &str) -> Self {
        Self::new([Method::Get], path)
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn with_default(mut self, param: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(param.into(), value.into());
        self
    }

    pub fn with_constraint(mut self, param: impl Into<String>, constraint: Constraint) -> Self {
        self.constraints.insert(param.into(), constraint);
        self
    }

    /// Mark as the catch-all fallback; fallback routes never localize and
    /// never win a match.
    pub fn with_fallback(mut self) -> Self {
        self.fallback = true;
        self
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Slash-trimmed path pattern; empty for the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn defaults(&self) -> &BTreeMap<String, String> {
        &self.defaults
    }

    pub fn constraints(&self) -> &BTreeMap<String, Constraint> {
        &self.constraints
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn allows_method(&self, method: Method) -> bool {
        self.methods.contains(&method)
    }

    pub fn key(&self) -> String {
        route_key(self.domain.as_deref(), &self.path)
    }

    fn segments(&self) -> Vec<&str> {
        if self.path.is_empty() {
            Vec::new()
        } else {
            self.path.split('/').collect()
        }
    }

    fn param_of(segment: &str) -> Option<&str> {
        segment.strip_prefix('{')?.strip_suffix('}')
    }

    /// Names of the parameters declared in the path pattern.
    pub fn param_names(&self) -> Vec<&str> {
        self.segments()
            .into_iter()
            .filter_map(Self::param_of)
            .collect()
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.param_names().contains(&name)
    }

    /// Match decoded path segments (and the request host, when the route is
    /// domain-bound) against the pattern. On success returns the bound
    /// parameters with the route defaults filled in for any not bound.
    pub fn matches(
        &self,
        host: Option<&str>,
        segments: &[String],
    ) -> Option<BTreeMap<String, String>> {
        if let Some(domain) = &self.domain {
            if host != Some(domain.as_str()) {
                return None;
            }
        }

        let pattern = self.segments();
        if pattern.len() != segments.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (expected, actual) in pattern.iter().zip(segments) {
            match Self::param_of(expected) {
                Some(param) => {
                    if let Some(constraint) = self.constraints.get(param) {
                        if !constraint.allows(actual) {
                            return None;
                        }
                    }
                    if actual.is_empty() {
                        return None;
                    }
                    params.insert(param.to_string(), actual.clone());
                }
                None => {
                    if *expected != actual.as_str() {
                        return None;
                    }
                }
            }
        }

        for (param, value) in &self.defaults {
            params.entry(param.clone()).or_insert_with(|| value.clone());
        }

        Some(params)
    }

    /// Substitute parameters into the pattern. Missing parameters are a
    /// caller bug: the parameter set must come from matching a route of the
    /// same shape.
    ///
    /// # Panics
    /// Panics when a declared parameter has no value.
    pub fn render(&self, params: &BTreeMap<String, String>) -> String {
        self.segments()
            .into_iter()
            .map(|segment| match Self::param_of(segment) {
                Some(param) => params
                    .get(param)
                    .unwrap_or_else(|| {
                        panic!(
                            "missing required parameter '{}' while rendering route '{}'",
                            param,
                            self.key()
                        )
                    })
                    .clone(),
                None => segment.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}
