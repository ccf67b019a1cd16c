//! # Object lists
//!
//! Tables with one object per row and no photometry: classifications, redshifts,
//! coordinates and discovery dates.
use tracing::debug;

use crate::{
    adapters::{claim_alias, entry_with_alias, Adapter, DatasetSpec, Row},
    catalog::{
        quantity::{MeasurementKind, Quantity, QuantityKind},
        sources::SourceId,
        Catalog,
    },
    catalog_errors::CatalogError,
    conversion::is_number,
    time::{jd_from_truncated, jd_to_date_string, parse_month_name_date},
};

fn claim(
    catalog: &mut Catalog,
    name: &str,
    kind: QuantityKind,
    value: &str,
    source: SourceId,
) -> Result<(), CatalogError> {
    catalog
        .entry_mut(name)?
        .add_quantity(Quantity::builder(kind, value, [source]).build())?;
    Ok(())
}

/// Discovery year `20yy` from two digits of an object name, e.g. `"05D1hk"` → `"2005"`.
fn century_year(digits: Option<&str>) -> Option<String> {
    digits
        .filter(|d| d.len() == 2 && d.bytes().all(|b| b.is_ascii_digit()))
        .map(|d| format!("20{d}"))
}

/// List of object names sharing one classification.
pub struct ObjectTypeList {
    spec: DatasetSpec,
    claimed_type: &'static str,
}

impl ObjectTypeList {
    pub fn new() -> Self {
        ObjectTypeList {
            spec: DatasetSpec::new("2013ApJ...767...57F", "2013ApJ...767...57F.txt", b' '),
            claimed_type: "Ia-02cx",
        }
    }
}

impl Adapter for ObjectTypeList {
    fn spec(&self) -> &DatasetSpec {
        &self.spec
    }

    fn parse_row(&mut self, catalog: &mut Catalog, row: &Row) -> Result<(), CatalogError> {
        let (name, source) = catalog.new_entry(row.require(0, "object name")?, self.spec.bibcode)?;
        claim(catalog, &name, QuantityKind::ClaimedType, self.claimed_type, source)
    }
}

/// Object names grouped under `#Type` header rows, optional alias column.
pub struct TypedNameList {
    spec: DatasetSpec,
    claimed_type: Option<String>,
}

impl TypedNameList {
    pub fn new() -> Self {
        TypedNameList {
            spec: DatasetSpec::new("2015arXiv150907124M", "2015arXiv150907124M.txt", b'/'),
            claimed_type: None,
        }
    }
}

impl Adapter for TypedNameList {
    fn spec(&self) -> &DatasetSpec {
        &self.spec
    }

    fn parse_header(&mut self, row: &Row) -> Result<bool, CatalogError> {
        if row.is_comment() {
            let claimed_type = row.raw(0).unwrap_or_default().trim_start_matches('#');
            self.claimed_type = Some(claimed_type.to_string());
            return Ok(true);
        }
        Ok(false)
    }

    fn parse_row(&mut self, catalog: &mut Catalog, row: &Row) -> Result<(), CatalogError> {
        let claimed_type = self
            .claimed_type
            .as_deref()
            .ok_or_else(|| row.structure("object listed before any type header"))?;

        let (mut name, mut source) =
            catalog.new_entry(row.require(0, "object name")?, self.spec.bibcode)?;
        if row.len() == 2 {
            if let Some(alias) = row.get(1) {
                (name, source) = claim_alias(catalog, &name, alias, self.spec.bibcode)?;
            }
        }
        claim(catalog, &name, QuantityKind::ClaimedType, claimed_type, source)
    }
}

/// SNLS spectroscopic redshifts with discovery dates as `JD − 2450000`.
pub struct HostRedshiftTable {
    spec: DatasetSpec,
}

impl HostRedshiftTable {
    pub fn new() -> Self {
        HostRedshiftTable {
            spec: DatasetSpec::new("2006ApJ...645..841N", "2006ApJ...645..841N-table3.csv", b','),
        }
    }
}

impl Adapter for HostRedshiftTable {
    fn spec(&self) -> &DatasetSpec {
        &self.spec
    }

    fn parse_row(&mut self, catalog: &mut Catalog, row: &Row) -> Result<(), CatalogError> {
        let object = format!("SNLS-{}", row.require(0, "object name")?);
        let discovered = row.observed(4, "discovery date")?.map(jd_from_truncated);

        let (name, source) = entry_with_alias(catalog, &object, self.spec.bibcode)?;
        if let Some(redshift) = row.get(1) {
            catalog.entry_mut(&name)?.add_quantity(
                Quantity::builder(QuantityKind::Redshift, redshift, [source])
                    .measurement_kind(MeasurementKind::Spectroscopic)
                    .build(),
            )?;
        }
        match discovered {
            Some(jd) => claim(
                catalog,
                &name,
                QuantityKind::DiscoverDate,
                &jd_to_date_string(jd)?,
                source,
            ),
            None => Ok(()),
        }
    }
}

/// Coordinates, redshift and `YYYY Mon DD` discovery dates.
pub struct DiscoveryTable {
    spec: DatasetSpec,
}

impl DiscoveryTable {
    pub fn new() -> Self {
        DiscoveryTable {
            spec: DatasetSpec::new("2016ApJ...819...35A", "2016ApJ...819...35A.tsv", b'\t'),
        }
    }
}

impl Adapter for DiscoveryTable {
    fn spec(&self) -> &DatasetSpec {
        &self.spec
    }

    fn parse_row(&mut self, catalog: &mut Catalog, row: &Row) -> Result<(), CatalogError> {
        let object = row.require(0, "object name")?;
        let discovered = parse_month_name_date(row.require(4, "discovery date")?)?;

        let (name, source) = entry_with_alias(catalog, object, self.spec.bibcode)?;
        for (column, kind) in [
            (1, QuantityKind::Ra),
            (2, QuantityKind::Dec),
            (3, QuantityKind::Redshift),
        ] {
            if let Some(value) = row.get(column) {
                claim(catalog, &name, kind, value, source)?;
            }
        }
        claim(catalog, &name, QuantityKind::DiscoverDate, &discovered, source)
    }
}

/// Spectroscopic redshift when measured, photometric otherwise.
pub struct PhotoSpecRedshiftTable {
    spec: DatasetSpec,
}

impl PhotoSpecRedshiftTable {
    const PHOTOMETRIC_Z: usize = 10;
    const SPECTROSCOPIC_Z: usize = 13;

    pub fn new() -> Self {
        PhotoSpecRedshiftTable {
            spec: DatasetSpec::new("2014ApJ...783...28G", "apj490105t2_ascii.txt", b'\t'),
        }
    }
}

impl Adapter for PhotoSpecRedshiftTable {
    fn spec(&self) -> &DatasetSpec {
        &self.spec
    }

    fn parse_row(&mut self, catalog: &mut Catalog, row: &Row) -> Result<(), CatalogError> {
        if row.len() <= Self::SPECTROSCOPIC_Z {
            return Err(row.structure(format!(
                "expected {} columns, found {}",
                Self::SPECTROSCOPIC_Z + 1,
                row.len()
            )));
        }
        let object = row.require(0, "object name")?;
        let (mut name, mut source) = catalog.new_entry(object, self.spec.bibcode)?;

        if let Some(alias) = row.get(1) {
            (name, source) = claim_alias(catalog, &name, alias, self.spec.bibcode)?;
        }
        match century_year(object.get(3..5)) {
            Some(year) => claim(catalog, &name, QuantityKind::DiscoverDate, &year, source)?,
            None => debug!(object, "no discovery year in object name"),
        }
        if let Some(ra) = row.get(2) {
            claim(catalog, &name, QuantityKind::Ra, ra, source)?;
        }
        if let Some(dec) = row.get(3) {
            claim(catalog, &name, QuantityKind::Dec, dec, source)?;
        }

        let (redshift, kind) = match row.get(Self::SPECTROSCOPIC_Z).filter(|z| is_number(z)) {
            Some(z) => (Some(z), MeasurementKind::Spectroscopic),
            None => (row.get(Self::PHOTOMETRIC_Z), MeasurementKind::Photometric),
        };
        if let Some(redshift) = redshift {
            catalog.entry_mut(&name)?.add_quantity(
                Quantity::builder(QuantityKind::Redshift, redshift, [source])
                    .measurement_kind(kind)
                    .build(),
            )?;
        }
        Ok(())
    }
}

/// SNLS host redshifts with errors and tentative classifications.
pub struct HostTypeTable {
    spec: DatasetSpec,
}

impl HostTypeTable {
    pub fn new() -> Self {
        HostTypeTable {
            spec: DatasetSpec::new("2005ApJ...634.1190H", "2005ApJ...634.1190H.tsv", b'\t'),
        }
    }
}

impl Adapter for HostTypeTable {
    fn spec(&self) -> &DatasetSpec {
        &self.spec
    }

    fn parse_row(&mut self, catalog: &mut Catalog, row: &Row) -> Result<(), CatalogError> {
        let short = row.require(0, "object name")?;
        let (name, source) = catalog.new_entry(&format!("SNLS-{short}"), self.spec.bibcode)?;

        if let Some(year) = century_year(short.get(..2)) {
            claim(catalog, &name, QuantityKind::DiscoverDate, &year, source)?;
        }
        if let Some(ra) = row.get(1) {
            claim(catalog, &name, QuantityKind::Ra, ra, source)?;
        }
        if let Some(dec) = row.get(2) {
            claim(catalog, &name, QuantityKind::Dec, dec, source)?;
        }
        if let Some(redshift) = row.get(5) {
            catalog.entry_mut(&name)?.add_quantity(
                Quantity::builder(QuantityKind::Redshift, redshift.replace('?', ""), [source])
                    .error(row.decimal(6)?)
                    .measurement_kind(MeasurementKind::Host)
                    .build(),
            )?;
        }
        if let Some(claimed_type) = row.get(7) {
            claim(
                catalog,
                &name,
                QuantityKind::ClaimedType,
                &claimed_type.replace("SN", ""),
                source,
            )?;
        }
        Ok(())
    }
}

/// Host redshifts, bare designations (`2005ap`) gain the `SN` prefix.
pub struct HostRedshiftList {
    spec: DatasetSpec,
}

impl HostRedshiftList {
    pub fn new() -> Self {
        HostRedshiftList {
            spec: DatasetSpec::new("2014MNRAS.444.2133S", "2014MNRAS.444.2133S.tsv", b'\t'),
        }
    }
}

impl Adapter for HostRedshiftList {
    fn spec(&self) -> &DatasetSpec {
        &self.spec
    }

    fn parse_row(&mut self, catalog: &mut Catalog, row: &Row) -> Result<(), CatalogError> {
        let object = row.require(0, "object name")?;
        let object = if object.get(..4).is_some_and(is_number) {
            format!("SN{object}")
        } else {
            object.to_string()
        };

        let (name, source) = catalog.new_entry(&object, self.spec.bibcode)?;
        if let Some(ra) = row.get(1) {
            claim(catalog, &name, QuantityKind::Ra, ra, source)?;
        }
        if let Some(dec) = row.get(2) {
            claim(catalog, &name, QuantityKind::Dec, dec, source)?;
        }
        if let Some(redshift) = row.get(3) {
            catalog.entry_mut(&name)?.add_quantity(
                Quantity::builder(QuantityKind::Redshift, redshift, [source])
                    .measurement_kind(MeasurementKind::Host)
                    .build(),
            )?;
        }
        Ok(())
    }
}
