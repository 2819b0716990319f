use std::fmt;

/// Request-scoped logger used while binding.
///
/// Every event carries the request id and the target type so binding
/// failures can be correlated with the request that produced them. The
/// library never installs a subscriber.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BindLog<'a> {
    request_id: &'a str,
    target: &'static str,
}

impl<'a> BindLog<'a> {
    pub(crate) fn new(request_id: &'a str, target: &'static str) -> Self {
        Self { request_id, target }
    }

    pub(crate) fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(request_id = %self.request_id, target_type = self.target, "{}", args);
    }

    pub(crate) fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(request_id = %self.request_id, target_type = self.target, "{}", args);
    }

    /// Records the end of a bind with its error count.
    pub(crate) fn outcome(&self, source_errors: usize, structural_errors: usize) {
        tracing::debug!(
            request_id = %self.request_id,
            target_type = self.target,
            source_errors,
            structural_errors,
            "bind finished"
        );
    }
}
