//! Extraction stage: document → normalized [`FactRecord`].
//!
//! This crate provides:
//! - [`Document`] — UTF-8 source document with SHA-256 provenance
//! - [`FactSource`] — the extraction capability seam, with
//!   [`ReasoningFactSource`] and [`JsonFactSource`] implementations
//! - [`normalize_facts`] — alias reconciliation and defaulting
//! - [`extract`] — the stage itself

mod document;
mod normalize;
mod source;

use tracing::{info, instrument};

use plancheck_shared::{FactRecord, Result};

pub use document::Document;
pub use normalize::normalize_facts;
pub use source::{EXTRACTION_TASK, FactSource, JsonFactSource, ReasoningFactSource};

/// Run the extraction stage.
///
/// Errors from the source are returned unchanged; a successful fetch always
/// yields a fully-populated record.
#[instrument(skip_all, fields(document = %document.name(), source = source.name()))]
pub async fn extract(source: &dyn FactSource, document: &Document) -> Result<FactRecord> {
    let raw = source.fetch(document).await?;
    let facts = normalize_facts(&raw);

    info!(
        floors = facts.total_floors,
        materials = facts.materials.len(),
        seismic_zone = %facts.seismic_zone,
        "fact record ready"
    );

    Ok(facts)
}
