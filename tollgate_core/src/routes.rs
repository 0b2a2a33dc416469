use crate::client::Endpoint;

/// Every caller-facing operation. The HTTP router mounts these paths and the
/// tool-discovery surface publishes the protected ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    PublicSearch,
    ProtectedSearch,
    ProtectedExtract,
}

impl Route {
    pub const ALL: [Route; 3] = [
        Route::PublicSearch,
        Route::ProtectedSearch,
        Route::ProtectedExtract,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::PublicSearch => "/search",
            Route::ProtectedSearch => "/tavily-search",
            Route::ProtectedExtract => "/tavily-extract",
        }
    }

    pub fn endpoint(self) -> Endpoint {
        match self {
            Route::PublicSearch | Route::ProtectedSearch => Endpoint::Search,
            Route::ProtectedExtract => Endpoint::Extract,
        }
    }

    pub fn requires_api_key(self) -> bool {
        !matches!(self, Route::PublicSearch)
    }

    /// Name used when the route is published as a tool.
    pub fn tool_name(self) -> &'static str {
        match self {
            Route::PublicSearch => "public_search",
            Route::ProtectedSearch => "tavily_search",
            Route::ProtectedExtract => "tavily_extract",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Route::PublicSearch => "Public web search through Tavily. No API key required.",
            Route::ProtectedSearch => "Perform a web search using the Tavily API. Supports topic (general|news), search_depth (basic|advanced), time_range, domain filters and image/raw-content flags.",
            Route::ProtectedExtract => "Extract page content from a list of URLs using the Tavily API. Supports extract_depth (basic|advanced) and include_images.",
        }
    }

    /// Routes exposed through tool discovery. The public route stays
    /// reachable only by direct call.
    pub fn discoverable() -> impl Iterator<Item = Route> {
        Self::ALL.into_iter().filter(|r| r.requires_api_key())
    }

    pub fn from_tool_name(name: &str) -> Option<Route> {
        Self::discoverable().find(|r| r.tool_name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_route_is_never_discoverable() {
        let found: Vec<_> = Route::discoverable().collect();
        assert_eq!(found, vec![Route::ProtectedSearch, Route::ProtectedExtract]);
        assert_eq!(Route::from_tool_name("public_search"), None);
        assert_eq!(
            Route::from_tool_name("tavily_extract"),
            Some(Route::ProtectedExtract)
        );
    }

    #[test]
    fn paths_map_to_upstream_endpoints() {
        assert_eq!(Route::PublicSearch.endpoint(), Endpoint::Search);
        assert_eq!(Route::ProtectedSearch.endpoint(), Endpoint::Search);
        assert_eq!(Route::ProtectedExtract.endpoint(), Endpoint::Extract);
        assert_eq!(Route::ProtectedSearch.path(), "/tavily-search");
    }
}
