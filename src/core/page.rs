//! The page-automation seam.
//!
//! The core never launches browsers, manages cookies, or owns navigation
//! timeouts; it receives an already-authenticated session behind this trait.
//! Production backends live outside this crate; tests drive the pipeline with a
//! scripted fake.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum PageError {
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("selector query failed: {0}")]
    Query(String),
    #[error("element read failed: {0}")]
    Element(String),
    #[error("session unavailable: {0}")]
    Session(String),
}

/// Opaque element reference issued by a `PageSource` backend. Handles are only
/// meaningful to the backend that produced them and only until the next
/// navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u64);

/// An authenticated page-automation session.
///
/// `query_within` scopes a selector to a previously returned handle, which is
/// how a listing row's anchor and timestamp children are reached.
pub trait PageSource {
    fn navigate(&mut self, url: &str) -> Result<(), PageError>;
    fn current_url(&self) -> String;
    fn query(&mut self, selector: &str) -> Result<Vec<ElementHandle>, PageError>;
    fn query_within(
        &mut self,
        handle: ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, PageError>;
    fn text_of(&mut self, handle: ElementHandle) -> Result<String, PageError>;
    fn attribute(&mut self, handle: ElementHandle, name: &str)
    -> Result<Option<String>, PageError>;
    fn click(&mut self, handle: ElementHandle) -> Result<(), PageError>;
}

/// Placeholder backend for deployments where no automation layer is wired in.
/// Every operation fails with a session error, which the pipeline treats as a
/// pipeline-level failure (logged, next cycle proceeds).
pub struct NullPage;

impl NullPage {
    fn unavailable() -> PageError {
        PageError::Session("no page-automation backend configured".to_string())
    }
}

impl PageSource for NullPage {
    fn navigate(&mut self, _url: &str) -> Result<(), PageError> {
        Err(Self::unavailable())
    }

    fn current_url(&self) -> String {
        String::new()
    }

    fn query(&mut self, _selector: &str) -> Result<Vec<ElementHandle>, PageError> {
        Err(Self::unavailable())
    }

    fn query_within(
        &mut self,
        _handle: ElementHandle,
        _selector: &str,
    ) -> Result<Vec<ElementHandle>, PageError> {
        Err(Self::unavailable())
    }

    fn text_of(&mut self, _handle: ElementHandle) -> Result<String, PageError> {
        Err(Self::unavailable())
    }

    fn attribute(
        &mut self,
        _handle: ElementHandle,
        _name: &str,
    ) -> Result<Option<String>, PageError> {
        Err(Self::unavailable())
    }

    fn click(&mut self, _handle: ElementHandle) -> Result<(), PageError> {
        Err(Self::unavailable())
    }
}
