/// Reference Comparator
///
/// Looks up a market-average baseline by zipcode or by property type and
/// computes the delta against the point estimate. A key absent from the
/// reference table falls back to the estimate itself (delta 0) so the primary
/// prediction is never blocked on missing reference data.
use crate::artifacts::ReferenceAverages;
use crate::models::ReferenceComparison;

#[derive(Debug, Clone, Copy)]
pub enum ReferenceKey<'a> {
    Zipcode(&'a str),
    PropertyType(&'a str),
}

pub fn compare(
    estimate: f64,
    key: ReferenceKey<'_>,
    reference: &ReferenceAverages,
) -> ReferenceComparison {
    let baseline = match key {
        ReferenceKey::Zipcode(zipcode) => reference.by_zipcode(zipcode),
        ReferenceKey::PropertyType(property_type) => reference.by_property_type(property_type),
    }
    .unwrap_or(estimate);

    ReferenceComparison {
        baseline,
        delta: estimate - baseline,
    }
}
