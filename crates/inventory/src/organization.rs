//! Organization profile update body.
//!
//! The inventory API's `PUT /organizations/{id}` replaces the whole record,
//! so an update re-sends every field read from `GET` with only the contact
//! name changed.

use serde_json::{json, Value};

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

/// Month name for the API's numeric fiscal-year start month (0 = January).
pub fn fiscal_month_name(index: Option<u64>) -> Option<&'static str> {
    index.and_then(|i| MONTHS.get(i as usize).copied())
}

/// Build the update body that renames the organization's contact.
pub fn build_organization_update(organization: &Value, display_name: &str) -> Value {
    let field = |name: &str| organization.get(name).cloned().unwrap_or(Value::Null);
    let address_field = |name: &str| {
        organization
            .get("address")
            .and_then(|a| a.get(name))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };

    json!({
        "name": field("name"),
        "contact_name": display_name,
        "email": field("email"),
        "is_logo_uploaded": field("is_logo_uploaded"),
        "fiscal_year_start_month": fiscal_month_name(
            organization.get("fiscal_year_start_month").and_then(Value::as_u64)
        ),
        "time_zone": field("time_zone"),
        "language_code": field("language_code"),
        "date_format": field("date_format"),
        "field_separator": field("field_separator"),
        "org_address": field("org_address"),
        "remit_to_address": field("remit_to_address"),
        "phone": field("phone"),
        "fax": field("fax"),
        "website": field("website"),
        "currency_id": field("currency_id"),
        "companyid_label": field("company_id_label"),
        "companyid_value": field("company_id_value"),
        "taxid_label": field("tax_id_label"),
        "taxid_value": field("tax_id_value"),
        "address": {
            "street_address1": address_field("street_address1"),
            "street_address2": address_field("street_address2"),
            "city": address_field("city"),
            "state": address_field("state"),
            "country": address_field("country"),
            "zip": address_field("zip"),
        },
        "custom_fields": organization
            .get("custom_fields")
            .filter(|c| !c.is_null())
            .cloned()
            .unwrap_or_else(|| json!([])),
    })
}
