//! Normalization of raw extraction output into a [`FactRecord`].
//!
//! Never fails: whatever shape the capability returned, the result has every
//! field populated, falling back to `"Undefined"`, `0` and `[]`.

use serde_json::{Map, Value};
use tracing::debug;

use plancheck_shared::reconcile::{self, FieldAliases};
use plancheck_shared::{FactRecord, MaterialLine, UNDEFINED};

const PROJECT_SCOPE: FieldAliases = FieldAliases::new(
    "projectScope",
    &["projectScope", "projectName", "project_scope", "project_name", "scope", "title"],
);
const TOTAL_FLOORS: FieldAliases = FieldAliases::new(
    "totalFloors",
    &["totalFloors", "floors", "total_floors", "numberOfFloors", "storeys", "stories"],
);
const HEIGHT: FieldAliases =
    FieldAliases::new("height", &["height", "buildingHeight", "building_height", "heightM"]);
const TOTAL_AREA: FieldAliases = FieldAliases::new(
    "totalArea",
    &["totalArea", "area", "total_area", "builtUpArea", "built_up_area", "plinthArea"],
);
const SEISMIC_ZONE: FieldAliases =
    FieldAliases::new("seismicZone", &["seismicZone", "seismic_zone", "zone", "seismic"]);
const MATERIALS: FieldAliases = FieldAliases::new(
    "materials",
    &["materials", "materialList", "material_list", "billOfMaterials", "boq"],
);

const ITEM: FieldAliases = FieldAliases::new("item", &["item", "name", "material", "description"]);
const QUANTITY: FieldAliases = FieldAliases::new("quantity", &["quantity", "qty", "amount"]);
const UNIT: FieldAliases = FieldAliases::new("unit", &["unit", "units", "uom"]);
const SPEC: FieldAliases =
    FieldAliases::new("spec", &["spec", "specification", "grade", "standard"]);

/// Keys some extractors wrap the fact object in.
const ENVELOPE_KEYS: &[&str] = &["facts", "data", "result", "project"];

/// Reconcile a raw extraction object into a fully-populated [`FactRecord`].
pub fn normalize_facts(raw: &Value) -> FactRecord {
    let Some(obj) = raw.as_object().map(unwrap_envelope) else {
        debug!("extraction output is not an object, using default facts");
        return FactRecord::default();
    };

    FactRecord {
        project_scope: reconcile::text(obj, &PROJECT_SCOPE, UNDEFINED),
        total_floors: reconcile::number(obj, &TOTAL_FLOORS)
            .map(non_negative)
            .map(|n| n.min(f64::from(u32::MAX)) as u32)
            .unwrap_or(0),
        height: reconcile::number(obj, &HEIGHT).map(non_negative).unwrap_or(0.0),
        total_area: reconcile::number(obj, &TOTAL_AREA).map(non_negative).unwrap_or(0.0),
        seismic_zone: reconcile::text(obj, &SEISMIC_ZONE, UNDEFINED),
        materials: reconcile::list(obj, &MATERIALS)
            .iter()
            .filter_map(normalize_material)
            .collect(),
    }
}

/// Descend into a single wrapper key when the top level carries no known field.
fn unwrap_envelope(obj: &Map<String, Value>) -> &Map<String, Value> {
    let fields = [
        &PROJECT_SCOPE,
        &TOTAL_FLOORS,
        &HEIGHT,
        &TOTAL_AREA,
        &SEISMIC_ZONE,
        &MATERIALS,
    ];
    let has_known_field = fields.iter().any(|f| f.lookup(obj).is_some());
    if has_known_field {
        return obj;
    }

    ENVELOPE_KEYS
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_object))
        .unwrap_or(obj)
}

fn normalize_material(entry: &Value) -> Option<MaterialLine> {
    match entry {
        Value::Object(obj) => Some(MaterialLine {
            item: reconcile::text(obj, &ITEM, UNDEFINED),
            quantity: reconcile::number(obj, &QUANTITY).map(non_negative).unwrap_or(0.0),
            unit: reconcile::text(obj, &UNIT, UNDEFINED),
            spec: reconcile::text(obj, &SPEC, UNDEFINED),
        }),
        Value::String(s) if !s.trim().is_empty() => Some(MaterialLine {
            item: s.trim().to_string(),
            quantity: 0.0,
            unit: UNDEFINED.into(),
            spec: UNDEFINED.into(),
        }),
        other => {
            debug!(entry = %other, "skipping unusable material entry");
            None
        }
    }
}

fn non_negative(n: f64) -> f64 {
    n.max(0.0)
}
