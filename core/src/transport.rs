//! The transport seam and the replaceable holder the requestor reads from.
//!
//! # Design
//! `Transport` is the only place network I/O happens. The requestor keeps its
//! transport in a `TransportHolder`: clones of a holder share one slot, so
//! `set_transport` on any clone is seen by all of them, while holders created
//! separately stay independent. A request clones the `Arc` out of the slot
//! before executing, so swapping transports never disturbs a call in flight.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{ApiError, TransportError};
use crate::http::{HttpMethod, HttpResponse, RequestOptions};

/// Executes one HTTP request.
///
/// Implementations must report non-2xx statuses as
/// `TransportError::Status` (see `HttpResponse::error_for_status`) so 4xx
/// responses can be told apart from every other failure.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        method: HttpMethod,
        uri: &str,
        options: &RequestOptions,
    ) -> Result<HttpResponse, TransportError>;
}

/// Shared, replaceable slot for a transport.
#[derive(Clone, Default)]
pub struct TransportHolder {
    slot: Arc<RwLock<Option<Arc<dyn Transport>>>>,
}

impl TransportHolder {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let holder = Self::default();
        holder.set(transport);
        holder
    }

    /// Replace the transport for every clone of this holder.
    pub fn set(&self, transport: Arc<dyn Transport>) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(transport);
    }

    /// The current transport, or `ApiError::NotConfigured` if none was set.
    pub fn get(&self) -> Result<Arc<dyn Transport>, ApiError> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ApiError::NotConfigured)
    }

    pub fn is_configured(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl fmt::Debug for TransportHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportHolder")
            .field("configured", &self.is_configured())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Headers, JsonMap, RequestBody};

    struct Fixed(&'static str);

    impl Transport for Fixed {
        fn execute(
            &self,
            _method: HttpMethod,
            _uri: &str,
            _options: &RequestOptions,
        ) -> Result<HttpResponse, TransportError> {
            Ok(HttpResponse::json(self.0))
        }
    }

    fn options() -> RequestOptions {
        RequestOptions {
            headers: Headers::new(),
            body: RequestBody::Query(JsonMap::new()),
            verify_tls: true,
        }
    }

    fn body_of(holder: &TransportHolder) -> String {
        holder
            .get()
            .unwrap()
            .execute(HttpMethod::Get, "/", &options())
            .unwrap()
            .body
    }

    #[test]
    fn empty_holder_is_not_configured() {
        let holder = TransportHolder::default();
        assert!(!holder.is_configured());
        assert!(matches!(holder.get(), Err(ApiError::NotConfigured)));
    }

    #[test]
    fn clones_share_replacements() {
        let holder = TransportHolder::new(Arc::new(Fixed("a")));
        let clone = holder.clone();
        clone.set(Arc::new(Fixed("b")));
        assert_eq!(body_of(&holder), "b");
    }

    #[test]
    fn separate_holders_are_independent() {
        let first = TransportHolder::new(Arc::new(Fixed("a")));
        let second = TransportHolder::new(Arc::new(Fixed("b")));
        second.set(Arc::new(Fixed("c")));
        assert_eq!(body_of(&first), "a");
        assert_eq!(body_of(&second), "c");
    }

    #[test]
    fn debug_reports_configuration_only() {
        let holder = TransportHolder::default();
        assert_eq!(format!("{holder:?}"), "TransportHolder { configured: false }");
    }
}
