use std::fmt;

/// The two UMM record families handled by the catalog.
///
/// The service and tool surfaces of the catalog are identical in shape but
/// differ in the URL path segment, the query parameter naming the record in
/// collection searches, and the UMM schema version of the ingest content
/// type. Everything else is shared, so the rest of the crate is generic
/// over this capability type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// UMM-S service profiles.
    Service,
    /// UMM-T tool profiles.
    Tool,
}

impl ResourceKind {
    /// URL path segment shared by the search and ingest endpoints.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Service => "services",
            Self::Tool => "tools",
        }
    }

    /// Query parameter that names this record family when searching
    /// collections for associations.
    pub fn association_param(&self) -> &'static str {
        match self {
            Self::Service => "service_concept_id",
            Self::Tool => "tool_concept_id",
        }
    }

    /// Content type for ingest writes. The UMM schema versions differ
    /// between the two families.
    pub fn umm_content_type(&self) -> &'static str {
        match self {
            Self::Service => "application/vnd.nasa.cmr.umm+json;version=1.3.4",
            Self::Tool => "application/vnd.nasa.cmr.umm+json;version=1.0",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service => write!(f, "service"),
            Self::Tool => write!(f, "tool"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_segments() {
        assert_eq!(ResourceKind::Service.path_segment(), "services");
        assert_eq!(ResourceKind::Tool.path_segment(), "tools");
    }

    #[test]
    fn test_association_params() {
        assert_eq!(
            ResourceKind::Service.association_param(),
            "service_concept_id"
        );
        assert_eq!(ResourceKind::Tool.association_param(), "tool_concept_id");
    }

    #[test]
    fn test_content_types_carry_schema_version() {
        assert_eq!(
            ResourceKind::Service.umm_content_type(),
            "application/vnd.nasa.cmr.umm+json;version=1.3.4"
        );
        assert_eq!(
            ResourceKind::Tool.umm_content_type(),
            "application/vnd.nasa.cmr.umm+json;version=1.0"
        );
    }
}
