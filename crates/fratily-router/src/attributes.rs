//! Request attributes written by routing.
//!
//! The routing middleware stores the outcome of a successful match in the
//! request's extensions under these two types, one for the matched route
//! (and through it the action) and one for the parameters.

use std::sync::Arc;

use fratily_core::{Params, Request};

use crate::route::Route;

/// The route a request matched.
#[derive(Debug, Clone)]
pub struct MatchedRoute(pub Arc<Route>);

/// Parameters handed to the matched action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(pub Params);

/// Reads routing attributes from a request.
pub trait RoutedRequest {
    /// The matched route, if routing found one.
    fn matched_route(&self) -> Option<&Arc<Route>>;

    /// The matched parameters, if routing found a route.
    fn route_params(&self) -> Option<&Params>;
}

impl RoutedRequest for Request {
    fn matched_route(&self) -> Option<&Arc<Route>> {
        self.extensions().get::<MatchedRoute>().map(|m| &m.0)
    }

    fn route_params(&self) -> Option<&Params> {
        self.extensions().get::<RouteParams>().map(|p| &p.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fratily_core::Body;

    #[test]
    fn test_unrouted_request_has_no_attributes() {
        let request = http::Request::builder().uri("/").body(Body::empty()).unwrap();
        assert!(request.matched_route().is_none());
        assert!(request.route_params().is_none());
    }

    #[test]
    fn test_params_attribute() {
        let mut request = http::Request::builder().uri("/").body(Body::empty()).unwrap();
        let mut params = Params::new();
        params.push("id", "7");
        request.extensions_mut().insert(RouteParams(params));

        assert_eq!(request.route_params().unwrap().get("id"), Some("7"));
    }
}
