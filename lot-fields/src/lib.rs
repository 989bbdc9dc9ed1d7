// SPDX-License-Identifier: MIT
//! # lot-fields: Category-Conditional Listing Fields
//!
//! Pure lookup from a listing category (trucks, machinery, agriculture) to the
//! metric and field set that applies to it. Two independent consumers derive
//! from this table: the listing-creation form (which inputs are mandatory) and
//! the search-filter UI (whether to render a distance-range or an hours-range
//! control). Keeping a single table here is what prevents "what creation
//! requires" and "what search allows" from drifting apart.
//!
//! ## Metric selection
//!
//! - **trucks** wear by distance → `mileage_km`
//! - **machinery** and **agriculture** wear by runtime → `operating_hours`
//!
//! The table is process-wide immutable configuration; nothing here allocates
//! or mutates at runtime.

use std::fmt;
use std::str::FromStr;

/// Top-level listing taxonomy.
///
/// Derives `clap::ValueEnum` so CLI frontends can take a category argument
/// directly without re-stating the identifier list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Category {
    /// Road vehicles: tractor units, box trucks, tippers.
    #[clap(name = "trucks")]
    Trucks,
    /// Construction machinery: excavators, loaders, cranes.
    #[clap(name = "machinery")]
    Machinery,
    /// Agricultural equipment: tractors, harvesters, implements.
    #[clap(name = "agriculture")]
    Agriculture,
}

/// The primary wear metric a category is listed and filtered by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    /// Odometer distance in kilometres.
    MileageKm,
    /// Engine runtime in hours.
    OperatingHours,
}

impl Metric {
    /// Wire identifier used by forms, filters, and the remote store.
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::MileageKm => "mileage_km",
            Metric::OperatingHours => "operating_hours",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field set applicable to one category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldMapping {
    /// Distance-based or hours-based metric for this category.
    pub primary_metric: Metric,
    /// Inputs the listing-creation form must require.
    pub required_fields: &'static [&'static str],
    /// Inputs that may be left empty.
    pub optional_fields: &'static [&'static str],
}

const TRUCKS: FieldMapping = FieldMapping {
    primary_metric: Metric::MileageKm,
    required_fields: &["fuel_type", "gearbox", "drivetrain"],
    optional_fields: &["power_ps", "axles", "weight_kg"],
};

const MACHINERY: FieldMapping = FieldMapping {
    primary_metric: Metric::OperatingHours,
    required_fields: &["power_ps"],
    optional_fields: &["weight_kg", "fuel_type"],
};

const AGRICULTURE: FieldMapping = FieldMapping {
    primary_metric: Metric::OperatingHours,
    required_fields: &["power_ps"],
    optional_fields: &["weight_kg", "fuel_type"],
};

impl Category {
    /// Wire identifier for this category.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Trucks => "trucks",
            Category::Machinery => "machinery",
            Category::Agriculture => "agriculture",
        }
    }

    /// The field mapping for this category. Infallible once the category has
    /// been parsed; use [`fields_for`] when starting from an untrusted string.
    pub fn mapping(self) -> &'static FieldMapping {
        match self {
            Category::Trucks => &TRUCKS,
            Category::Machinery => &MACHINERY,
            Category::Agriculture => &AGRICULTURE,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a category identifier outside the known taxonomy.
///
/// Callers must treat this as a user/config error; there is deliberately no
/// default mapping to fall back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown category '{}' (expected trucks, machinery, or agriculture)",
            self.0
        )
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trucks" => Ok(Category::Trucks),
            "machinery" => Ok(Category::Machinery),
            "agriculture" => Ok(Category::Agriculture),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// Resolve the field mapping for a category identifier.
///
/// This is the single entry point both UI consumers go through.
pub fn fields_for(category: &str) -> Result<&'static FieldMapping, UnknownCategory> {
    Ok(category.parse::<Category>()?.mapping())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_metrics() {
        assert_eq!(fields_for("trucks").unwrap().primary_metric, Metric::MileageKm);
        assert_eq!(
            fields_for("machinery").unwrap().primary_metric,
            Metric::OperatingHours
        );
        assert_eq!(
            fields_for("agriculture").unwrap().primary_metric,
            Metric::OperatingHours
        );
    }

    #[test]
    fn test_truck_field_sets() {
        let trucks = fields_for("trucks").unwrap();
        assert_eq!(trucks.required_fields, &["fuel_type", "gearbox", "drivetrain"]);
        assert_eq!(trucks.optional_fields, &["power_ps", "axles", "weight_kg"]);
    }

    #[test]
    fn test_machinery_and_agriculture_share_field_sets() {
        let machinery = fields_for("machinery").unwrap();
        let agriculture = fields_for("agriculture").unwrap();
        assert_eq!(machinery.required_fields, &["power_ps"]);
        assert_eq!(machinery.optional_fields, &["weight_kg", "fuel_type"]);
        assert_eq!(machinery, agriculture);
    }

    #[test]
    fn test_unknown_category_is_an_error() {
        let err = fields_for("spaceship").unwrap_err();
        assert_eq!(err, UnknownCategory("spaceship".to_string()));
        assert!(err.to_string().contains("spaceship"));
    }

    #[test]
    fn test_identifiers_round_trip() {
        for cat in [Category::Trucks, Category::Machinery, Category::Agriculture] {
            assert_eq!(cat.as_str().parse::<Category>().unwrap(), cat);
        }
    }
}
