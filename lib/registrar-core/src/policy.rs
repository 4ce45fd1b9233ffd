//! Registration policy: which services take part in routing

use crate::Service;

/// Attribute whose presence opts a service into routing
pub const DEPLOY_ATTR: &str = "deploy";

/// A service is routed iff it carries the `deploy` attribute, whatever its value
pub fn is_eligible(service: &Service) -> bool {
    service.attrs.contains_key(DEPLOY_ATTR)
}
