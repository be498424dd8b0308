/// Feature Encoder
///
/// Rebuilds the exact numeric vector the ensemble was trained on from one raw
/// property record:
///
/// 1. The listing date is split into LISTING_YEAR / LISTING_MONTH /
///    LISTING_DAY; the raw date never reaches the model.
/// 2. ZIPCODE / CITY / STATE are frequency-encoded; unseen values become 0.0.
/// 3. PROPERTYTYPE is one-hot encoded against the schema's `PROPERTYTYPE_*`
///    columns; a value with no matching column sets nothing.
/// 4. The result is projected onto the schema's exact ordered column list:
///    unpopulated schema columns stay 0, fields outside the schema are
///    dropped.
///
/// Per-record anomalies (unseen categories, unknown property type) degrade
/// silently; only a malformed schema is an error, and that is caught at load.
use crate::artifacts::{FeatureSchema, FrequencyMaps};
use crate::models::PricingRequest;
use chrono::Datelike;
use ndarray::Array1;

pub fn encode(
    record: &PricingRequest,
    schema: &FeatureSchema,
    frequency_maps: &FrequencyMaps,
) -> Array1<f64> {
    // Zero-initialized over the schema, so projection and one-hot
    // initialization come for free.
    let mut x = Array1::zeros(schema.len());

    set(&mut x, schema, "SQUAREFOOTAGE", record.square_footage);
    set(&mut x, schema, "BEDROOMS", record.bedrooms as f64);
    set(&mut x, schema, "BATHROOMS", record.bathrooms);
    set(&mut x, schema, "LATITUDE", record.latitude);
    set(&mut x, schema, "LONGITUDE", record.longitude);

    set(
        &mut x,
        schema,
        "LISTING_YEAR",
        record.listed_date.year() as f64,
    );
    set(
        &mut x,
        schema,
        "LISTING_MONTH",
        record.listed_date.month() as f64,
    );
    set(
        &mut x,
        schema,
        "LISTING_DAY",
        record.listed_date.day() as f64,
    );

    // Zipcode is looked up as the raw string; "00501" stays "00501".
    set(
        &mut x,
        schema,
        "ZIPCODE",
        frequency_maps.lookup("ZIPCODE", &record.zipcode),
    );
    set(
        &mut x,
        schema,
        "CITY",
        frequency_maps.lookup("CITY", &record.city),
    );
    set(
        &mut x,
        schema,
        "STATE",
        frequency_maps.lookup("STATE", &record.state),
    );

    if let Some(i) = schema.property_type_column(&record.propertytype) {
        x[i] = 1.0;
    }

    x
}

fn set(x: &mut Array1<f64>, schema: &FeatureSchema, column: &str, value: f64) {
    if let Some(i) = schema.index_of(column) {
        x[i] = value;
    }
}
