//! Effective-value tracing boundary.
//!
//! Tracing is optional, injected by the caller, and must not affect
//! resolution semantics.

///
/// ResolveSource
///
/// Where an effective value came from.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResolveSource {
    /// A resolver was attached and invoked.
    Resolver,
    /// No resolver; the static layer answered.
    Static,
    /// No resolver and no static value.
    Missing,
}

///
/// ResolveTraceEvent
///

#[derive(Clone, Copy, Debug)]
pub struct ResolveTraceEvent<'a> {
    /// Name of the model or field the lookup ran against.
    pub scope: &'a str,
    pub attr: &'a str,
    pub source: ResolveSource,
    pub ok: bool,
}

///
/// ResolveTraceSink
///

pub trait ResolveTraceSink: Send + Sync {
    fn on_event(&self, event: ResolveTraceEvent<'_>);
}
