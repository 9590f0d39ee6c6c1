use crate::{QueryDescriptor, ResolveError, ResolvedQuery};

/// Flattens a resolved query into the catalog's request shape.
///
/// The only check is a non-empty metric; columns are passed through as chosen.
pub fn assemble(resolved: &ResolvedQuery) -> Result<QueryDescriptor, ResolveError> {
    let metric = resolved.metric.trim();
    if metric.is_empty() {
        return Err(ResolveError::EmptyMetricSelection);
    }

    Ok(QueryDescriptor {
        metric: metric.to_string(),
        dimensions: resolved.group_bys.join(","),
        filters: resolved.filters.join(","),
    })
}
