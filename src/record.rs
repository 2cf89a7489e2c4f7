//! The fixed set of columns every listing is reduced to.

use crate::normalize::FieldValue;

pub const LOCALITY: &str = "Locality";
pub const TYPE_OF_PROPERTY: &str = "Type of property";
pub const SUBTYPE_OF_PROPERTY: &str = "Subtype of property";
pub const PRICE: &str = "Price";
pub const TYPE_OF_SALE: &str = "Type of sale";
pub const BEDROOMS: &str = "Bedrooms";
pub const LIVING_AREA: &str = "Living area";
pub const KITCHEN_TYPE: &str = "Kitchen type";
pub const FURNISHED: &str = "Furnished";
pub const FIREPLACES: &str = "How many fireplaces?";
pub const TERRACE_SURFACE: &str = "Terrace surface";
pub const GARDEN_SURFACE: &str = "Garden surface";
pub const PLOT_SURFACE: &str = "Surface of the plot";
pub const FRONTAGES: &str = "Number of frontages";
pub const SWIMMING_POOL: &str = "Swimming pool";
pub const BUILDING_CONDITION: &str = "Building condition";
pub const URL: &str = "URL";

/// Column order of a freshly written dataset.
pub const COLUMNS: [&str; 17] = [
    LOCALITY,
    TYPE_OF_PROPERTY,
    SUBTYPE_OF_PROPERTY,
    PRICE,
    TYPE_OF_SALE,
    BEDROOMS,
    LIVING_AREA,
    KITCHEN_TYPE,
    FURNISHED,
    FIREPLACES,
    TERRACE_SURFACE,
    GARDEN_SURFACE,
    PLOT_SURFACE,
    FRONTAGES,
    SWIMMING_POOL,
    BUILDING_CONDITION,
    URL,
];

/// Presence + area pair used for terrace and garden.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Surface {
    pub present: bool,
    pub area: FieldValue,
}

impl Surface {
    /// Any observed value marks the surface as present.
    pub fn observed(area: FieldValue) -> Self {
        Self {
            present: true,
            area,
        }
    }

    /// Rendered as `{"area":20,"present":true}` so the pair stays in one column.
    pub fn to_cell(&self) -> String {
        serde_json::json!({
            "present": self.present,
            "area": self.area.to_json(),
        })
        .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingRecord {
    pub locality: FieldValue,
    pub property_type: FieldValue,
    pub property_subtype: FieldValue,
    pub price: FieldValue,
    pub type_of_sale: FieldValue,
    pub bedrooms: FieldValue,
    pub living_area: FieldValue,
    pub kitchen_type: FieldValue,
    pub furnished: FieldValue,
    pub fireplaces: FieldValue,
    pub terrace: Surface,
    pub garden: Surface,
    pub plot_surface: FieldValue,
    pub frontages: FieldValue,
    pub swimming_pool: FieldValue,
    pub building_condition: FieldValue,
    pub url: FieldValue,
}

impl ListingRecord {
    /// Starting point of the HTML table strategy: every field it can miss holds its documented default.
    pub fn table_defaults() -> Self {
        Self {
            bedrooms: FieldValue::Int(0),
            living_area: FieldValue::Int(0),
            kitchen_type: FieldValue::Bool(false),
            furnished: FieldValue::Bool(false),
            frontages: FieldValue::Int(1),
            swimming_pool: FieldValue::Bool(false),
            ..Self::default()
        }
    }

    /// Stores a normalized table cell under its header.
    /// Returns `false` when the header isn't one of the record's columns.
    pub fn set_from_table(&mut self, header: &str, value: FieldValue) -> bool {
        let slot = match header {
            TERRACE_SURFACE => {
                self.terrace = Surface::observed(value);
                return true;
            }
            GARDEN_SURFACE => {
                self.garden = Surface::observed(value);
                return true;
            }
            BEDROOMS => &mut self.bedrooms,
            LIVING_AREA => &mut self.living_area,
            KITCHEN_TYPE => &mut self.kitchen_type,
            FURNISHED => &mut self.furnished,
            FIREPLACES => &mut self.fireplaces,
            PLOT_SURFACE => &mut self.plot_surface,
            FRONTAGES => &mut self.frontages,
            SWIMMING_POOL => &mut self.swimming_pool,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// Legacy normalization: every absent scalar becomes `false`.
    pub fn absent_as_false(mut self) -> Self {
        for field in [
            &mut self.locality,
            &mut self.property_type,
            &mut self.property_subtype,
            &mut self.price,
            &mut self.type_of_sale,
            &mut self.bedrooms,
            &mut self.living_area,
            &mut self.kitchen_type,
            &mut self.furnished,
            &mut self.fireplaces,
            &mut self.terrace.area,
            &mut self.garden.area,
            &mut self.plot_surface,
            &mut self.frontages,
            &mut self.swimming_pool,
            &mut self.building_condition,
        ] {
            if field.is_absent() {
                *field = FieldValue::Bool(false);
            }
        }
        self
    }

    /// One `(column, cell)` pair per column, in `COLUMNS` order. Absent values are empty cells.
    pub fn cells(&self) -> Vec<(&'static str, String)> {
        vec![
            (LOCALITY, self.locality.to_string()),
            (TYPE_OF_PROPERTY, self.property_type.to_string()),
            (SUBTYPE_OF_PROPERTY, self.property_subtype.to_string()),
            (PRICE, self.price.to_string()),
            (TYPE_OF_SALE, self.type_of_sale.to_string()),
            (BEDROOMS, self.bedrooms.to_string()),
            (LIVING_AREA, self.living_area.to_string()),
            (KITCHEN_TYPE, self.kitchen_type.to_string()),
            (FURNISHED, self.furnished.to_string()),
            (FIREPLACES, self.fireplaces.to_string()),
            (TERRACE_SURFACE, self.terrace.to_cell()),
            (GARDEN_SURFACE, self.garden.to_cell()),
            (PLOT_SURFACE, self.plot_surface.to_string()),
            (FRONTAGES, self.frontages.to_string()),
            (SWIMMING_POOL, self.swimming_pool.to_string()),
            (BUILDING_CONDITION, self.building_condition.to_string()),
            (URL, self.url.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_follow_column_order() {
        let cells = ListingRecord::default().cells();
        let names: Vec<_> = cells.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, COLUMNS);
    }

    #[test]
    fn surface_cell_is_json_pair() {
        assert_eq!(
            Surface::default().to_cell(),
            r#"{"area":null,"present":false}"#
        );
        assert_eq!(
            Surface::observed(FieldValue::Int(20)).to_cell(),
            r#"{"area":20,"present":true}"#
        );
    }

    #[test]
    fn unknown_table_header_is_ignored() {
        let mut record = ListingRecord::table_defaults();
        assert!(!record.set_from_table("Energy class", FieldValue::Text("B".into())));
        assert!(record.set_from_table(BEDROOMS, FieldValue::Int(3)));
        assert_eq!(record.bedrooms, FieldValue::Int(3));
        assert!(record.set_from_table(GARDEN_SURFACE, FieldValue::Text("n/a".into())));
        assert!(record.garden.present);
    }

    #[test]
    fn absent_as_false_keeps_values() {
        let record = ListingRecord {
            price: FieldValue::Int(250_000),
            ..Default::default()
        }
        .absent_as_false();
        assert_eq!(record.price, FieldValue::Int(250_000));
        assert_eq!(record.bedrooms, FieldValue::Bool(false));
        assert_eq!(record.terrace.area, FieldValue::Bool(false));
        assert_eq!(record.url, FieldValue::Absent);
    }
}
