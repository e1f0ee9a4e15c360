//! Space context and layered credential sources.
//!
//! A [`SpaceContext`] names the space, the token, and the API base every
//! request is issued against. It is produced by a [`CredentialResolver`],
//! which asks an ordered list of [`CredentialSource`]s for each field and
//! keeps the first non-blank answer.
//!
//! # Priority
//!
//! The standard chain, highest first:
//!
//! 1. Explicit values passed in code
//! 2. Per-call transport metadata (HTTP headers)
//! 3. Process environment (`STORYBLOK_*`)
//! 4. Command-line arguments (`--space-id`, ...)
//! 5. Configuration file values

use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};

/// API base used when no source provides one.
pub const DEFAULT_API_BASE: &str = "https://mapi.storyblok.com/v1";

// ============================================================================
// Fields
// ============================================================================

/// A single credential value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialField {
    /// Space identifier.
    SpaceId,
    /// Management API access token.
    AccessToken,
    /// API base URL.
    ApiBase,
}

impl CredentialField {
    /// All fields, in resolution order.
    pub const ALL: [CredentialField; 3] = [Self::SpaceId, Self::AccessToken, Self::ApiBase];

    /// Environment variable read by [`EnvSource`].
    pub fn env_var(self) -> &'static str {
        match self {
            Self::SpaceId => "STORYBLOK_SPACE_ID",
            Self::AccessToken => "STORYBLOK_ACCESS_TOKEN",
            Self::ApiBase => "STORYBLOK_API_BASE",
        }
    }

    /// Command-line flag read by [`ArgsSource`].
    pub fn flag(self) -> &'static str {
        match self {
            Self::SpaceId => "--space-id",
            Self::AccessToken => "--access-token",
            Self::ApiBase => "--api-base",
        }
    }

    /// Transport header read by [`MetadataSource`].
    pub fn header(self) -> &'static str {
        match self {
            Self::SpaceId => "x-storyblok-space-id",
            Self::AccessToken => "x-storyblok-access-token",
            Self::ApiBase => "x-storyblok-api-base",
        }
    }

    /// Human readable name used in messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::SpaceId => "space id",
            Self::AccessToken => "access token",
            Self::ApiBase => "API base",
        }
    }
}

// ============================================================================
// SpaceContext
// ============================================================================

/// Immutable credentials for one space.
#[derive(Clone, PartialEq, Eq)]
pub struct SpaceContext {
    space_id: String,
    access_token: String,
    api_base: String,
}

impl SpaceContext {
    /// Build a context, rejecting empty fields.
    ///
    /// A trailing `/` on the API base is dropped so that resource paths can
    /// be appended directly.
    pub fn new(
        space_id: impl Into<String>,
        access_token: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Result<Self> {
        let space_id = space_id.into().trim().to_string();
        let access_token = access_token.into().trim().to_string();
        let api_base = api_base.into().trim().trim_end_matches('/').to_string();

        let missing: Vec<&str> = [
            (CredentialField::SpaceId, &space_id),
            (CredentialField::AccessToken, &access_token),
            (CredentialField::ApiBase, &api_base),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field.label())
        .collect();

        if !missing.is_empty() {
            return Err(Error::config(format!(
                "missing required credentials: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            space_id,
            access_token,
            api_base,
        })
    }

    /// Space identifier.
    pub fn space_id(&self) -> &str {
        &self.space_id
    }

    /// Access token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// API base URL without a trailing slash.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

impl fmt::Debug for SpaceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpaceContext")
            .field("space_id", &self.space_id)
            .field("access_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

// ============================================================================
// Sources
// ============================================================================

/// One place credentials may come from.
pub trait CredentialSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Value for `field`, if this source has one.
    fn lookup(&self, field: CredentialField) -> Option<String>;
}

/// Fixed values, e.g. explicit parameters or a loaded config file.
#[derive(Debug, Clone, Default)]
pub struct ExplicitSource {
    name: String,
    values: HashMap<CredentialField, String>,
}

impl ExplicitSource {
    /// Create an empty source named `explicit`.
    pub fn new() -> Self {
        Self::named("explicit")
    }

    /// Create an empty source with a custom name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: HashMap::new(),
        }
    }

    /// Set a field when a value is present.
    pub fn with(mut self, field: CredentialField, value: Option<impl Into<String>>) -> Self {
        if let Some(value) = value {
            self.values.insert(field, value.into());
        }
        self
    }

    /// Build a source that reproduces an existing context.
    pub fn from_context(name: impl Into<String>, context: &SpaceContext) -> Self {
        Self::named(name)
            .with(CredentialField::SpaceId, Some(context.space_id()))
            .with(CredentialField::AccessToken, Some(context.access_token()))
            .with(CredentialField::ApiBase, Some(context.api_base()))
    }
}

impl CredentialSource for ExplicitSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&self, field: CredentialField) -> Option<String> {
        self.values.get(&field).cloned()
    }
}

/// Per-call transport metadata, such as HTTP request headers.
#[derive(Debug, Clone, Default)]
pub struct MetadataSource {
    entries: HashMap<String, String>,
}

impl MetadataSource {
    /// Build from key/value pairs. Keys are matched case-insensitively.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
                .collect(),
        }
    }

    /// Whether any credential header carries a value.
    pub fn has_credentials(&self) -> bool {
        CredentialField::ALL.iter().any(|field| self.has(*field))
    }

    /// Whether `field` carries a non-blank value.
    pub fn has(&self, field: CredentialField) -> bool {
        self.lookup(field).is_some_and(|v| !v.trim().is_empty())
    }
}

impl CredentialSource for MetadataSource {
    fn name(&self) -> &str {
        "metadata"
    }

    fn lookup(&self, field: CredentialField) -> Option<String> {
        self.entries.get(field.header()).cloned()
    }
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Process environment.
pub struct EnvSource {
    lookup: EnvLookup,
}

impl EnvSource {
    /// Read from the real process environment.
    pub fn new() -> Self {
        Self::with_lookup(|key| std::env::var(key).ok())
    }

    /// Read through a custom lookup function.
    pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }
}

impl Default for EnvSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialSource for EnvSource {
    fn name(&self) -> &str {
        "env"
    }

    fn lookup(&self, field: CredentialField) -> Option<String> {
        (self.lookup)(field.env_var())
    }
}

/// Raw command-line arguments (`--flag value` or `--flag=value`).
#[derive(Debug, Clone, Default)]
pub struct ArgsSource {
    args: Vec<String>,
}

impl ArgsSource {
    /// Build from an argument list.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl CredentialSource for ArgsSource {
    fn name(&self) -> &str {
        "args"
    }

    fn lookup(&self, field: CredentialField) -> Option<String> {
        let flag = field.flag();
        let mut iter = self.args.iter();
        while let Some(arg) = iter.next() {
            if arg == flag {
                return iter.next().cloned();
            }
            if let Some(value) = arg.strip_prefix(flag).and_then(|r| r.strip_prefix('=')) {
                return Some(value.to_string());
            }
        }
        None
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Ordered chain of credential sources.
#[derive(Default)]
pub struct CredentialResolver {
    sources: Vec<Box<dyn CredentialSource>>,
}

impl CredentialResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source with lower priority than those already added.
    pub fn with_source(mut self, source: impl CredentialSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Number of configured sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// First non-blank value for `field`, with the name of its source.
    pub fn lookup(&self, field: CredentialField) -> Option<(String, &str)> {
        self.sources.iter().find_map(|source| {
            source
                .lookup(field)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(|v| (v, source.name()))
        })
    }

    /// Resolve all fields into a [`SpaceContext`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming every required field no source
    /// provided.
    pub fn resolve(&self) -> Result<SpaceContext> {
        let mut resolved = HashMap::new();
        for field in CredentialField::ALL {
            if let Some((value, source)) = self.lookup(field) {
                tracing::debug!(field = field.label(), source, "credential resolved");
                resolved.insert(field, value);
            }
        }

        let missing: Vec<&str> = [CredentialField::SpaceId, CredentialField::AccessToken]
            .into_iter()
            .filter(|field| !resolved.contains_key(field))
            .map(CredentialField::label)
            .collect();
        if !missing.is_empty() {
            return Err(Error::config(format!(
                "missing required credentials: {}",
                missing.join(", ")
            )));
        }

        let space_id = resolved
            .remove(&CredentialField::SpaceId)
            .unwrap_or_default();
        let access_token = resolved
            .remove(&CredentialField::AccessToken)
            .unwrap_or_default();
        let api_base = resolved
            .remove(&CredentialField::ApiBase)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        SpaceContext::new(space_id, access_token, api_base)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> EnvSource {
        EnvSource::with_lookup(move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
    }

    #[test]
    fn test_space_context_rejects_empty() {
        let err = SpaceContext::new("", "", DEFAULT_API_BASE).unwrap_err();
        assert!(err.to_string().contains("space id"));
        assert!(err.to_string().contains("access token"));
        assert!(SpaceContext::new("1", "tok", " ").is_err());
    }

    #[test]
    fn test_space_context_trims_base() {
        let ctx = SpaceContext::new("1", "tok", "https://example.test/v1/").unwrap();
        assert_eq!(ctx.api_base(), "https://example.test/v1");
    }

    #[test]
    fn test_space_context_debug_redacts_token() {
        let ctx = SpaceContext::new("1", "secret-token", DEFAULT_API_BASE).unwrap();
        let debug = format!("{ctx:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_args_source_forms() {
        let args = ArgsSource::new(["bin", "--space-id", "123", "--access-token=abc"]);
        assert_eq!(args.lookup(CredentialField::SpaceId).as_deref(), Some("123"));
        assert_eq!(args.lookup(CredentialField::AccessToken).as_deref(), Some("abc"));
        assert_eq!(args.lookup(CredentialField::ApiBase), None);
    }

    #[test]
    fn test_args_source_flag_without_value() {
        let args = ArgsSource::new(["--space-id"]);
        assert_eq!(args.lookup(CredentialField::SpaceId), None);
    }

    #[test]
    fn test_metadata_source_case_insensitive() {
        let meta = MetadataSource::from_pairs([("X-Storyblok-Space-Id", "77")]);
        assert_eq!(meta.lookup(CredentialField::SpaceId).as_deref(), Some("77"));
        assert!(meta.has_credentials());
        assert!(!MetadataSource::default().has_credentials());
        assert!(!meta.has(CredentialField::AccessToken));
    }

    #[test]
    fn test_metadata_source_blank_values_are_absent() {
        let meta = MetadataSource::from_pairs([("x-storyblok-access-token", " ")]);
        assert!(!meta.has(CredentialField::AccessToken));
        assert!(!meta.has_credentials());
    }

    #[test]
    fn test_priority_order() {
        let resolver = CredentialResolver::new()
            .with_source(ExplicitSource::new().with(CredentialField::SpaceId, Some("explicit")))
            .with_source(MetadataSource::from_pairs([
                ("x-storyblok-space-id", "meta"),
                ("x-storyblok-access-token", "meta-token"),
            ]))
            .with_source(env(&[
                ("STORYBLOK_SPACE_ID", "env"),
                ("STORYBLOK_ACCESS_TOKEN", "env-token"),
                ("STORYBLOK_API_BASE", "https://env.test/v1"),
            ]))
            .with_source(ArgsSource::new(["--api-base", "https://args.test/v1"]));

        let ctx = resolver.resolve().unwrap();
        assert_eq!(ctx.space_id(), "explicit");
        assert_eq!(ctx.access_token(), "meta-token");
        assert_eq!(ctx.api_base(), "https://env.test/v1");
        assert_eq!(resolver.source_count(), 4);
    }

    #[test]
    fn test_blank_values_fall_through() {
        let resolver = CredentialResolver::new()
            .with_source(ExplicitSource::new().with(CredentialField::SpaceId, Some("  ")))
            .with_source(ArgsSource::new(["--space-id", "42", "--access-token", "t"]));
        let ctx = resolver.resolve().unwrap();
        assert_eq!(ctx.space_id(), "42");
    }

    #[test]
    fn test_default_api_base() {
        let resolver = CredentialResolver::new()
            .with_source(ArgsSource::new(["--space-id", "1", "--access-token", "t"]));
        assert_eq!(resolver.resolve().unwrap().api_base(), DEFAULT_API_BASE);
    }

    #[test]
    fn test_missing_required_fields() {
        let err = CredentialResolver::new()
            .with_source(env(&[]))
            .resolve()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: missing required credentials: space id, access token"
        );
    }

    #[test]
    fn test_from_context_round_trip() {
        let ctx = SpaceContext::new("5", "tok", DEFAULT_API_BASE).unwrap();
        let resolver =
            CredentialResolver::new().with_source(ExplicitSource::from_context("base", &ctx));
        assert_eq!(resolver.resolve().unwrap(), ctx);
    }
}
