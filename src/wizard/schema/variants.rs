use super::{FieldRegistry, FieldSpec, LocationBinding, SchemaError, StepSpec};

/// Built-in schema variants matching the deployed prediction backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVariant {
    /// Bandung listings: areas, rooms, month plus a map-picked location.
    Bandung,
    /// King County attributes: rooms, floor areas (m²), quality and age.
    KingCounty,
}

impl SchemaVariant {
    pub fn from_key(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "bandung" => Some(Self::Bandung),
            "king_county" | "kc" => Some(Self::KingCounty),
            _ => None,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Bandung => "bandung",
            Self::KingCounty => "king_county",
        }
    }

    pub fn registry(self) -> Result<FieldRegistry, SchemaError> {
        match self {
            Self::Bandung => bandung(),
            Self::KingCounty => king_county(),
        }
    }
}

fn bandung() -> Result<FieldRegistry, SchemaError> {
    let fields = vec![
        FieldSpec::numeric("Land", "Land area (m²)", "Enter in square meters.").min(1.0),
        FieldSpec::numeric("Building", "Building area (m²)", "Enter in square meters.").min(1.0),
        FieldSpec::numeric("Bedroom", "Bedrooms", "Whole number.")
            .min(1.0)
            .max(20.0)
            .step(1.0),
        FieldSpec::numeric("Bathroom", "Bathrooms", "Decimals allowed, e.g. 1.5.")
            .min(1.0)
            .max(20.0)
            .step(0.5),
        FieldSpec::numeric("Carport", "Carports / garages", "Total covered parking capacity.")
            .min(0.0)
            .max(10.0)
            .step(1.0),
        FieldSpec::numeric("Month", "Transaction month", "Filled in with the current month.")
            .min(1.0)
            .max(12.0)
            .step(1.0)
            .current_month(),
        FieldSpec::numeric("Latitude", "Latitude", "Pick a point on the map to fill this in.")
            .step(0.000001),
        FieldSpec::numeric("Longitude", "Longitude", "Pick a point on the map to fill this in.")
            .step(0.000001),
        FieldSpec::text(
            "City_Regency",
            "City / Regency",
            "Filled from the map, editable by hand.",
        ),
        FieldSpec::text("Location", "District", "Filled from the map, editable by hand."),
    ];

    let steps = vec![
        StepSpec {
            key: "property",
            title: "Property details",
            description: "Areas, rooms, carports and month.",
            fields: vec!["Land", "Building", "Bedroom", "Bathroom", "Carport", "Month"],
        },
        StepSpec {
            key: "location",
            title: "Location",
            description: "Pick a point on the map to fill in city and district.",
            fields: vec!["Latitude", "Longitude", "City_Regency", "Location"],
        },
    ];

    FieldRegistry::new(fields, steps)?.with_location(LocationBinding {
        latitude: "Latitude",
        longitude: "Longitude",
        city: "City_Regency",
        district: "Location",
    })
}

fn king_county() -> Result<FieldRegistry, SchemaError> {
    let fields = vec![
        FieldSpec::numeric("bedrooms", "Bedrooms", "Whole number.")
            .min(0.0)
            .max(33.0)
            .step(1.0),
        FieldSpec::numeric("bathrooms", "Bathrooms", "Quarter baths allowed, e.g. 2.25.")
            .min(0.0)
            .max(8.0)
            .step(0.25),
        FieldSpec::numeric("floors", "Floors", "Half floors allowed, e.g. 1.5.")
            .min(1.0)
            .max(3.5)
            .step(0.5),
        FieldSpec::numeric("sqft_living", "Living area (m²)", "Interior living space.").min(1.0),
        FieldSpec::numeric("sqft_lot", "Lot area (m²)", "Total land area.").min(1.0),
        FieldSpec::numeric("sqft_above", "Area above ground (m²)", "Excludes the basement.")
            .min(0.0),
        FieldSpec::numeric("sqft_basement", "Basement area (m²)", "Use 0 when there is none.")
            .min(0.0),
        FieldSpec::binary("waterfront", "Waterfront", "1 when the lot faces the water, else 0."),
        FieldSpec::numeric("condition", "Condition", "1 (poor) to 5 (very good).")
            .min(1.0)
            .max(5.0)
            .step(1.0),
        FieldSpec::numeric("grade", "Grade", "Construction quality, 1 to 13.")
            .min(1.0)
            .max(13.0)
            .step(1.0),
        FieldSpec::numeric("yr_built", "Year built", "Four-digit year.").step(1.0),
        FieldSpec::numeric("yr_renovated", "Year renovated", "Use 0 when never renovated.")
            .step(1.0),
    ];

    let steps = vec![
        StepSpec {
            key: "rooms",
            title: "Rooms",
            description: "Bedrooms, bathrooms and floors.",
            fields: vec!["bedrooms", "bathrooms", "floors"],
        },
        StepSpec {
            key: "area",
            title: "Floor area",
            description: "Areas in square meters; the service converts to square feet.",
            fields: vec!["sqft_living", "sqft_lot", "sqft_above", "sqft_basement"],
        },
        StepSpec {
            key: "quality",
            title: "Quality & age",
            description: "Waterfront, condition, grade and build history.",
            fields: vec!["waterfront", "condition", "grade", "yr_built", "yr_renovated"],
        },
    ];

    FieldRegistry::new(fields, steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::schema::{FieldDefault, FieldKind};

    #[test]
    fn variants_parse_from_config_keys() {
        assert_eq!(SchemaVariant::from_key("Bandung"), Some(SchemaVariant::Bandung));
        assert_eq!(
            SchemaVariant::from_key("king-county"),
            Some(SchemaVariant::KingCounty)
        );
        assert_eq!(SchemaVariant::from_key("jakarta"), None);
    }

    #[test]
    fn bandung_binds_location_fields() {
        let registry = SchemaVariant::Bandung.registry().expect("valid schema");
        let binding = registry.location().expect("bandung has a location step");
        assert_eq!(binding.city, "City_Regency");
        let month = registry.spec_of("Month").expect("month declared");
        assert!(month.read_only);
        assert_eq!(month.default, FieldDefault::CurrentMonth);
    }

    #[test]
    fn king_county_has_no_location_and_binary_waterfront() {
        let registry = SchemaVariant::KingCounty.registry().expect("valid schema");
        assert!(registry.location().is_none());
        assert_eq!(registry.step_count(), 3);
        let waterfront = registry.spec_of("waterfront").expect("declared");
        assert_eq!(waterfront.kind, FieldKind::Binary);
        assert_eq!(waterfront.default, FieldDefault::Number(-1.0));
    }
}
